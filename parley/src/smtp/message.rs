use serde_json::Value;
use thiserror::Error;

/// Everything the client needs for one send: who it's from, who it's to, and
/// the content that goes out after DATA.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Envelope {
	pub reverse_path: String,
	pub forward_paths: Vec<String>,
	pub subject: String,
	pub body: String,
	/// Extra headers, written after the subject in this order
	pub headers: Vec<(String, String)>,
}

impl Envelope {
	pub fn new<S: Into<String>>(reverse_path: S, forward_paths: Vec<String>) -> Self {
		Self {
			reverse_path: reverse_path.into(),
			forward_paths,
			..Default::default()
		}
	}

	pub fn subject<S: Into<String>>(mut self, subject: S) -> Self {
		self.subject = subject.into();
		self
	}

	pub fn body<S: Into<String>>(mut self, body: S) -> Self {
		self.body = body.into();
		self
	}

	pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
		self.headers = headers;
		self
	}

	/// The mail data: a subject line, the extra headers, a blank line and
	/// the body, joined with CRLF. It does not include the final ".\r\n"
	/// that ends the DATA command.
	///
	/// Body lines are split on either line ending and any line starting with
	/// a period gets a second one, so the server can't mistake it for the end
	/// of the data.
	pub fn data(&self) -> String {
		let mut lines = vec![format!("Subject: {}", single_line(&self.subject))];

		for (name, value) in &self.headers {
			lines.push(format!("{}: {}", single_line(name), single_line(value)));
		}

		lines.push(String::new());

		for line in self.body.lines() {
			if line.starts_with('.') {
				//transparency, the server strips the extra period
				lines.push(format!(".{}", line));
			} else {
				lines.push(line.to_owned());
			}
		}

		lines.join("\r\n")
	}
}

// A header can't span lines, so fold any line breaks into spaces
fn single_line(text: &str) -> String {
	text.lines().collect::<Vec<_>>().join(" ")
}

/// Parse a JSON list of addresses like `["a@x", "b@x"]`.
pub fn parse_forward_paths(raw: &str) -> Result<Vec<String>, ParseEnvelopeError> {
	let value: Value = serde_json::from_str(raw).map_err(ParseEnvelopeError::RecipientsSyntax)?;

	match value {
		Value::Array(items) => items
			.into_iter()
			.map(|item| match item {
				Value::String(address) => Ok(address),
				other => Err(ParseEnvelopeError::RecipientNotString(other)),
			})
			.collect(),
		_ => Err(ParseEnvelopeError::RecipientsNotList),
	}
}

/// Parse a JSON object of extra headers like `{"CC": "cc@x"}`, keeping the
/// order they were given in. String values are used as they are, anything
/// else is written as its JSON text.
pub fn parse_headers(raw: &str) -> Result<Vec<(String, String)>, ParseEnvelopeError> {
	let value: Value = serde_json::from_str(raw).map_err(ParseEnvelopeError::HeadersSyntax)?;

	match value {
		Value::Object(map) => Ok(map
			.into_iter()
			.map(|(name, value)| match value {
				Value::String(text) => (name, text),
				other => (name, other.to_string()),
			})
			.collect()),
		_ => Err(ParseEnvelopeError::HeadersNotObject),
	}
}

#[derive(Debug, Error)]
pub enum ParseEnvelopeError {
	#[error("error parsing to_mail: {0}")]
	RecipientsSyntax(#[source] serde_json::Error),
	#[error("error parsing to_mail: the argument must be a list")]
	RecipientsNotList,
	#[error("error parsing to_mail: {0} is not an address")]
	RecipientNotString(Value),
	#[error("error parsing header: {0}")]
	HeadersSyntax(#[source] serde_json::Error),
	#[error("error parsing header: the argument must be an object")]
	HeadersNotObject,
}
