use std::time::Duration;

use getopts::{Matches, Options};
use parley::smtp::{parse_forward_paths, parse_headers, Envelope, ParseEnvelopeError};
use thiserror::Error;

pub struct Args {
	pub host: String,
	pub port: u16,
	pub timeout: Option<Duration>,
	pub envelope: Envelope,
}

impl Args {
	fn options() -> Options {
		let mut opts = Options::new();
		opts.optflag("h", "help", "Print this help message");
		opts.optopt("u", "host", "SMTP server host (e.g. 127.0.0.1)", "HOST");
		opts.optopt("p", "port", "SMTP server port (e.g. 25)", "PORT");
		opts.optopt("f", "from_mail", "Sender address (e.g. user1@uh.cu)", "ADDR");
		opts.optopt(
			"t",
			"to_mail",
			"Recipient addresses as a JSON list (e.g. '[\"user2@uh.cu\", \"user3@uh.cu\"]')",
			"LIST",
		);
		opts.optopt("s", "subject", "Subject of the mail", "TEXT");
		opts.optopt("b", "body", "Body of the mail", "TEXT");
		opts.optopt(
			"H",
			"header",
			"Extra headers as a JSON object (e.g. '{\"CC\": \"cc@example.com\"}')\nDefault: {}",
			"OBJECT",
		);
		opts.optopt(
			"",
			"timeout",
			"Seconds to wait on the server before giving up\nDefault: wait forever",
			"SECS",
		);
		opts
	}

	pub fn usage(prgm: &str) -> String {
		let brief = format!("Usage: {} [options]", prgm);
		Self::options().usage(&brief)
	}

	/// Parse the arguments, program name included. `None` means help was
	/// asked for. Nothing here touches the network.
	pub fn parse(args: &[String]) -> Result<Option<Self>, ArgsError> {
		let matches = Self::options().parse(args.iter().skip(1))?;

		if matches.opt_present("help") {
			return Ok(None);
		}

		let host = required(&matches, "host")?;
		let port = required(&matches, "port")?;
		let port: u16 = port.parse().map_err(|_| ArgsError::Port(port))?;

		let timeout = match matches.opt_str("timeout") {
			None => None,
			Some(secs) => match secs.parse::<u64>() {
				Ok(0) | Err(_) => return Err(ArgsError::Timeout(secs)),
				Ok(secs) => Some(Duration::from_secs(secs)),
			},
		};

		let forward_paths = parse_forward_paths(&required(&matches, "to_mail")?)?;
		let headers = parse_headers(&matches.opt_str("header").unwrap_or_else(|| "{}".into()))?;

		let envelope = Envelope::new(required(&matches, "from_mail")?, forward_paths)
			.subject(required(&matches, "subject")?)
			.body(required(&matches, "body")?)
			.headers(headers);

		Ok(Some(Self {
			host,
			port,
			timeout,
			envelope,
		}))
	}
}

fn required(matches: &Matches, name: &'static str) -> Result<String, ArgsError> {
	matches.opt_str(name).ok_or(ArgsError::Missing(name))
}

#[derive(Debug, Error)]
pub enum ArgsError {
	#[error("{0}")]
	Options(#[from] getopts::Fail),
	#[error("the --{0} argument is required")]
	Missing(&'static str),
	#[error("'{0}' is not a valid port")]
	Port(String),
	#[error("'{0}' is not a valid number of seconds")]
	Timeout(String),
	#[error("{0}")]
	Envelope(#[from] ParseEnvelopeError),
}
