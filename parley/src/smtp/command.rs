/// One line sent by the client, classified by its leading keyword. Keywords
/// are matched case-insensitively as prefixes, so `HELOfoo` is still a
/// [Command::Helo]. Arguments are kept as the raw text after the keyword.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
	/// `HELO` and `EHLO` both land here
	Helo(String),
	MailFrom(String),
	RcptTo(String),
	Data,
	/// A line holding only a period
	DotTerminator,
	Quit,
	Unknown(String),
}

impl Command {
	pub fn helo<S: Into<String>>(domain: S) -> Self {
		Command::Helo(domain.into())
	}

	pub fn mail_from(address: &str) -> Self {
		Command::MailFrom(format!("<{}>", address))
	}

	pub fn rcpt_to(address: &str) -> Self {
		Command::RcptTo(format!("<{}>", address))
	}

	/// Sort a line into a command. The line should already have its line
	/// ending removed.
	pub fn classify(line: &str) -> Self {
		if line == "." {
			return Command::DotTerminator;
		}

		if let Some(domain) = after_keyword(line, "HELO").or_else(|| after_keyword(line, "EHLO")) {
			Command::Helo(domain.to_owned())
		} else if let Some(reverse_path) = after_keyword(line, "MAIL FROM:") {
			Command::MailFrom(reverse_path.to_owned())
		} else if let Some(forward_path) = after_keyword(line, "RCPT TO:") {
			Command::RcptTo(forward_path.to_owned())
		} else if after_keyword(line, "DATA").is_some() {
			Command::Data
		} else if after_keyword(line, "QUIT").is_some() {
			Command::Quit
		} else {
			Command::Unknown(line.to_owned())
		}
	}
}

fn after_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
	// get() refuses to split a multibyte character, which can't be a keyword match anyway
	let head = line.get(..keyword.len())?;

	if head.eq_ignore_ascii_case(keyword) {
		Some(line[keyword.len()..].trim())
	} else {
		None
	}
}

impl From<&str> for Command {
	fn from(line: &str) -> Self {
		Command::classify(line)
	}
}

impl std::fmt::Display for Command {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Command::Helo(domain) if domain.is_empty() => write!(f, "HELO"),
			Command::Helo(domain) => write!(f, "HELO {}", domain),
			Command::MailFrom(reverse_path) => write!(f, "MAIL FROM:{}", reverse_path),
			Command::RcptTo(forward_path) => write!(f, "RCPT TO:{}", forward_path),
			Command::Data => write!(f, "DATA"),
			Command::DotTerminator => write!(f, "."),
			Command::Quit => write!(f, "QUIT"),
			Command::Unknown(line) => write!(f, "{}", line),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn classify_known_keywords() {
		assert_eq!(
			Command::classify("HELO localhost"),
			Command::Helo("localhost".into())
		);
		assert_eq!(
			Command::classify("EHLO mx.example"),
			Command::Helo("mx.example".into())
		);
		assert_eq!(
			Command::classify("MAIL FROM:<a@x>"),
			Command::MailFrom("<a@x>".into())
		);
		assert_eq!(
			Command::classify("RCPT TO:<b@x>"),
			Command::RcptTo("<b@x>".into())
		);
		assert_eq!(Command::classify("DATA"), Command::Data);
		assert_eq!(Command::classify("."), Command::DotTerminator);
		assert_eq!(Command::classify("QUIT"), Command::Quit);
	}

	#[test]
	fn classify_ignores_keyword_case() {
		assert_eq!(Command::classify("helo x"), Command::Helo("x".into()));
		assert_eq!(
			Command::classify("mail from: <a@x>"),
			Command::MailFrom("<a@x>".into())
		);
		assert_eq!(Command::classify("Data"), Command::Data);
		assert_eq!(Command::classify("quit"), Command::Quit);
	}

	#[test]
	fn classify_matches_prefixes_only() {
		assert_eq!(Command::classify("QUITTING"), Command::Quit);
		assert_eq!(Command::classify("HEL"), Command::Unknown("HEL".into()));
		assert_eq!(Command::classify("NOOP"), Command::Unknown("NOOP".into()));
		assert_eq!(Command::classify(".."), Command::Unknown("..".into()));
		assert_eq!(Command::classify("MAIL <a@x>"), Command::Unknown("MAIL <a@x>".into()));
		assert_eq!(Command::classify("ñoño"), Command::Unknown("ñoño".into()));
	}

	#[test]
	fn display_builds_wire_lines() {
		assert_eq!(Command::helo("localhost").to_string(), "HELO localhost");
		assert_eq!(Command::mail_from("a@x").to_string(), "MAIL FROM:<a@x>");
		assert_eq!(Command::rcpt_to("b@x").to_string(), "RCPT TO:<b@x>");
		assert_eq!(Command::Data.to_string(), "DATA");
		assert_eq!(Command::Quit.to_string(), "QUIT");
	}

	#[test]
	fn displayed_commands_classify_as_themselves() {
		let commands = [
			Command::helo("localhost"),
			Command::mail_from("a@x"),
			Command::rcpt_to("b@x"),
			Command::Data,
			Command::DotTerminator,
			Command::Quit,
		];

		for command in commands {
			assert_eq!(Command::from(command.to_string().as_str()), command);
		}
	}
}
