use std::fmt::Display;

use super::{Command, Envelope};

/// The name the client greets the server with
pub const HELO_DOMAIN: &str = "localhost";

/// Produces what the client sends, one step at a time, for a single envelope.
/// Every step is answered by exactly one reply, and this doesn't look at the
/// replies, so the whole conversation is known up front:
/// HELO, MAIL, one RCPT per forward path, DATA, the data itself, QUIT.
#[derive(Clone, Debug)]
pub struct Client {
	state: State,
	envelope: Envelope,
	next_forward_path: usize,
}

impl Client {
	pub fn initiate(envelope: Envelope) -> Self {
		Self {
			state: State::Initiated,
			envelope,
			next_forward_path: 0,
		}
	}

	/// Number of replies the server will have sent once the conversation is done,
	/// not counting the greeting.
	pub fn expected_replies(&self) -> usize {
		self.envelope.forward_paths.len() + 5
	}
}

impl Iterator for Client {
	type Item = Output;

	fn next(&mut self) -> Option<Output> {
		Some(match self.state {
			State::Initiated => {
				self.state = State::Greeted;
				Output::Command(Command::helo(HELO_DOMAIN))
			}
			State::Greeted => {
				self.state = State::SendingForwardPaths;
				Output::Command(Command::mail_from(&self.envelope.reverse_path))
			}
			State::SendingForwardPaths => {
				match self.envelope.forward_paths.get(self.next_forward_path) {
					Some(path) => {
						self.next_forward_path += 1;
						Output::Command(Command::rcpt_to(path))
					}
					None => {
						self.state = State::SentForwardPaths;
						Output::Command(Command::Data)
					}
				}
			}
			State::SentForwardPaths => {
				self.state = State::SentData;
				Output::Data(self.envelope.data())
			}
			State::SentData => {
				self.state = State::SentQuit;
				Output::Command(Command::Quit)
			}
			State::SentQuit => return None,
		})
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
	Initiated,
	Greeted,
	SendingForwardPaths,
	SentForwardPaths,
	SentData,
	SentQuit,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Output {
	Command(Command),
	Data(String),
}

impl Display for Output {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Command(command) => write!(f, "{}\r\n", command),
			Self::Data(data) => write!(f, "{}\r\n.\r\n", data),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn envelope(forward_paths: &[&str]) -> Envelope {
		Envelope::new("a@x", forward_paths.iter().map(|s| s.to_string()).collect())
			.subject("Hi")
			.body("body")
	}

	#[test]
	fn conversation_order() {
		let outputs: Vec<String> = Client::initiate(envelope(&["b@x", "c@x"]))
			.map(|output| output.to_string())
			.collect();

		assert_eq!(
			outputs,
			vec![
				"HELO localhost\r\n",
				"MAIL FROM:<a@x>\r\n",
				"RCPT TO:<b@x>\r\n",
				"RCPT TO:<c@x>\r\n",
				"DATA\r\n",
				"Subject: Hi\r\n\r\nbody\r\n.\r\n",
				"QUIT\r\n",
			]
		);
	}

	#[test]
	fn one_step_per_reply() {
		for count in 0..4 {
			let paths: Vec<String> = (0..count).map(|n| format!("user{}@x", n)).collect();
			let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
			let client = Client::initiate(envelope(&refs));
			let expected = client.expected_replies();

			assert_eq!(client.count(), expected);
			assert_eq!(expected, count + 5);
		}
	}

	#[test]
	fn no_forward_paths_skips_rcpt() {
		let outputs: Vec<Output> = Client::initiate(envelope(&[])).collect();

		assert_eq!(outputs.len(), 5);
		assert!(!outputs
			.iter()
			.any(|output| matches!(output, Output::Command(Command::RcptTo(_)))));
		assert_eq!(outputs[2], Output::Command(Command::Data));
	}

	#[test]
	fn finished_after_quit() {
		let mut client = Client::initiate(envelope(&["b@x"]));
		let last = client.by_ref().last();

		assert_eq!(last, Some(Output::Command(Command::Quit)));
		assert_eq!(client.state, State::SentQuit);
		assert!(client.next().is_none());
	}
}
