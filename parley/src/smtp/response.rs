/// A single reply line sent from the server to the client.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
	pub code: ResponseCode,
	message: String,
}

impl Response {
	pub fn with_message<S: Into<String>>(code: ResponseCode, message: S) -> Self {
		Self {
			code,
			message: message.into(),
		}
	}

	pub fn code(&self) -> ResponseCode {
		self.code
	}

	/// The reply as it goes out on the wire, line ending included.
	pub fn as_string(&self) -> String {
		format!("{}\r\n", self)
	}
}

impl std::fmt::Display for Response {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} {}", self.code.as_code(), self.message)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseCode {
	ServiceReady,   // 220
	ServiceClosing, // 221
	Okay,           // 250

	StartMailInput, // 354

	ServiceNotAvailable, // 421 (Service not available, closing transmission channel)

	UnrecognizedCommand, // 500
}

impl ResponseCode {
	pub fn as_code(self) -> u16 {
		match self {
			ResponseCode::ServiceReady => 220,
			ResponseCode::ServiceClosing => 221,
			ResponseCode::Okay => 250,
			ResponseCode::StartMailInput => 354,
			ResponseCode::ServiceNotAvailable => 421,
			ResponseCode::UnrecognizedCommand => 500,
		}
	}

	pub fn is_negative(&self) -> bool {
		let first = self.as_code() / 100;

		first == 4 || first == 5
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn response_as_string_singleline() {
		let resp = Response::with_message(ResponseCode::Okay, "OK");

		assert_eq!(resp.as_string(), String::from("250 OK\r\n"));
	}

	#[test]
	fn response_display_has_no_line_ending() {
		let resp = Response::with_message(ResponseCode::UnrecognizedCommand, "unrecognized command");

		assert_eq!(resp.to_string(), "500 unrecognized command");
	}

	#[test]
	fn negative_codes() {
		assert!(ResponseCode::UnrecognizedCommand.is_negative());
		assert!(ResponseCode::ServiceNotAvailable.is_negative());
		assert!(!ResponseCode::StartMailInput.is_negative());
		assert!(!ResponseCode::Okay.is_negative());
	}
}
