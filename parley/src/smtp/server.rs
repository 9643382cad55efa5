use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;

use super::{Command, Response, ResponseCode, MAX_LINE_LENGTH};

/// The responder side of a single connection. It doesn't touch the network:
/// feed it whatever bytes arrived with [Server::push] and write back the
/// responses it returns.
pub struct Server {
	config: Arc<dyn Config>,
	state: State,
	command: Vec<u8>,
	/// Set once a line outgrew [MAX_LINE_LENGTH]; the rest of it is dropped
	overlong: bool,
	data: String,
}

impl Server {
	pub fn initiate(config: Arc<dyn Config>) -> (Self, Response) {
		let greeting = Response::with_message(
			ResponseCode::ServiceReady,
			format!("{} (parley) sample SMTP server", config.primary_host()),
		);

		(
			Self {
				config,
				state: Default::default(),
				command: Default::default(),
				overlong: false,
				data: Default::default(),
			},
			greeting,
		)
	}

	/// Buffer `bytes` and handle every complete line in it, in order. Lines end
	/// in LF with an optional CR before it and are decoded only once whole, so
	/// a character split across two reads survives. A trailing partial line
	/// waits for the next push. Once the session is over anything left is
	/// discarded.
	pub fn push<B: AsRef<[u8]>>(&mut self, bytes: B) -> Vec<Response> {
		self.command.extend_from_slice(bytes.as_ref());

		let mut responses = vec![];
		while !self.should_exit() {
			let end = match self.command.iter().position(|&b| b == b'\n') {
				Some(end) => end,
				None => break,
			};

			let raw: Vec<u8> = self.command.drain(..=end).collect();
			if self.overlong {
				self.overlong = false;
				continue;
			}

			let line = String::from_utf8_lossy(&raw);
			let line = line.trim_end_matches('\n').trim_end_matches('\r');

			if let Some(response) = self.line(line) {
				responses.push(response);
			}
		}

		if self.should_exit() {
			self.command.clear();
		} else if self.command.len() > MAX_LINE_LENGTH {
			responses.extend(self.line_too_long());
		}

		responses
	}

	pub fn should_exit(&self) -> bool {
		self.state == State::Exit
	}

	pub fn is_loading_data(&self) -> bool {
		self.state == State::LoadingData
	}

	/// Sent to a client that's still connected when the server shuts down
	pub fn shutting_down(&self) -> Response {
		Response::with_message(
			ResponseCode::ServiceNotAvailable,
			format!("{} shutting down", self.config.primary_host()),
		)
	}

	/// Sent to a client that stayed quiet past the read timeout
	pub fn timed_out(&self) -> Response {
		Response::with_message(
			ResponseCode::ServiceNotAvailable,
			format!("{} timeout, closing connection", self.config.primary_host()),
		)
	}

	// Drop what we have of the line and skip the rest of it when it comes
	fn line_too_long(&mut self) -> Option<Response> {
		warn!(bytes = self.command.len(), "line too long, dropping it");
		self.command.clear();
		self.overlong = true;

		match self.state {
			State::Waiting => Some(Response::with_message(
				ResponseCode::UnrecognizedCommand,
				"line too long",
			)),
			_ => None,
		}
	}

	fn line(&mut self, line: &str) -> Option<Response> {
		info!("client: {}", line);

		match self.state {
			State::LoadingData => self.loading_data(line),
			State::Waiting => self.run_command(line.trim()),
			State::Exit => None,
		}
	}

	fn loading_data(&mut self, line: &str) -> Option<Response> {
		if line == "." {
			self.state = State::Waiting;
			info!(bytes = self.data.len(), "message received");
			debug!("message data:\r\n{}", self.data);

			return Some(Self::message_received());
		}

		//transparency to allow clients to send \r\n.\r\n without breaking SMTP
		let line = line.strip_prefix('.').unwrap_or(line);
		self.data.push_str(line);
		self.data.push_str("\r\n");

		None
	}

	fn run_command(&mut self, line: &str) -> Option<Response> {
		// A blank line means the client is done with us
		if line.is_empty() {
			self.state = State::Exit;
			return None;
		}

		Some(match Command::classify(line) {
			Command::Helo(_) => Response::with_message(ResponseCode::Okay, "Hola"),
			Command::MailFrom(_) => Response::with_message(ResponseCode::Okay, "OK"),
			Command::RcptTo(_) => Response::with_message(ResponseCode::Okay, "OK"),
			Command::Data => self.start_data(),
			Command::DotTerminator => Self::message_received(),
			Command::Quit => self.quit(),
			Command::Unknown(_) => Self::syntax_error(),
		})
	}

	fn start_data(&mut self) -> Response {
		self.state = State::LoadingData;
		self.data.clear();

		Response::with_message(ResponseCode::StartMailInput, "End data with <CRLF>.<CRLF>")
	}

	fn quit(&mut self) -> Response {
		self.state = State::Exit;

		Response::with_message(ResponseCode::ServiceClosing, "Adios")
	}

	fn message_received() -> Response {
		Response::with_message(ResponseCode::Okay, "OK, message received")
	}

	fn syntax_error() -> Response {
		Response::with_message(ResponseCode::UnrecognizedCommand, "unrecognized command")
	}
}

#[derive(Debug, PartialEq)]
enum State {
	Waiting,
	LoadingData,
	Exit,
}

impl Default for State {
	fn default() -> Self {
		Self::Waiting
	}
}
