use std::{net::SocketAddr, time::Duration};

use thiserror::Error;
use tokio::{
	io::{AsyncReadExt, AsyncWriteExt},
	net::TcpStream,
	time::{error::Elapsed, timeout},
};
use tracing::{debug, info};

use crate::smtp::{Client, Envelope, MAX_LINE_LENGTH};

/// Bytes asked of the socket per read
const READ_SIZE: usize = 1024;

/// An outbound connection to an SMTP server. Each command is written in full
/// and then exactly one reply line is read back before anything else is sent.
///
/// Without a timeout a server that never answers blocks the caller forever.
pub struct Session {
	stream: Option<TcpStream>,
	peer: SocketAddr,
	read_timeout: Option<Duration>,
	/// Bytes that arrived past the end of the last reply
	reply: Vec<u8>,
}

impl Session {
	/// Connect and read the greeting. Returns the session and the greeting
	/// text, trimmed.
	pub async fn connect(host: &str, port: u16) -> Result<(Self, String), SessionError> {
		Self::connect_with_timeout(host, port, None).await
	}

	/// Like [Session::connect], but connecting and every read afterwards give
	/// up after `read_timeout`.
	pub async fn connect_with_timeout(
		host: &str,
		port: u16,
		read_timeout: Option<Duration>,
	) -> Result<(Self, String), SessionError> {
		let addr = format!("{}:{}", host, port);

		let connected = match read_timeout {
			Some(limit) => timeout(limit, TcpStream::connect(&addr)).await?,
			None => TcpStream::connect(&addr).await,
		};

		let stream = connected.map_err(|source| SessionError::Connect {
			addr: addr.clone(),
			source,
		})?;
		let peer = stream.peer_addr()?;
		info!("connected to {}", peer);

		let mut session = Self {
			stream: Some(stream),
			peer,
			read_timeout,
			reply: Vec::new(),
		};

		let greeting = session.receive().await?;
		Ok((session, greeting))
	}

	pub fn peer_addr(&self) -> SocketAddr {
		self.peer
	}

	pub fn is_open(&self) -> bool {
		self.stream.is_some()
	}

	/// Send one command line, CRLF is added here, and return the reply.
	pub async fn send_command(&mut self, command: &str) -> Result<String, SessionError> {
		self.send(&format!("{}\r\n", command)).await?;
		self.receive().await
	}

	/// Run the whole conversation for `envelope` and collect every reply in the
	/// order the steps were sent. Stops at the first error.
	pub async fn send_email(&mut self, envelope: Envelope) -> Result<Vec<String>, SessionError> {
		let client = Client::initiate(envelope);
		let mut replies = Vec::with_capacity(client.expected_replies());

		for output in client {
			self.send(&output.to_string()).await?;
			replies.push(self.receive().await?);
		}

		Ok(replies)
	}

	/// Shut the connection down. Calling it again, or on a session whose
	/// connection is already gone, does nothing.
	pub async fn close(&mut self) {
		if let Some(mut stream) = self.stream.take() {
			if let Err(err) = stream.shutdown().await {
				debug!("error shutting down connection to {}: {}", self.peer, err);
			}

			info!("closed connection to {}", self.peer);
		}
	}

	async fn send(&mut self, text: &str) -> Result<(), SessionError> {
		let stream = self.stream.as_mut().ok_or(SessionError::NotConnected)?;

		debug!("> {}", text.trim_end());
		stream.write_all(text.as_bytes()).await?;

		Ok(())
	}

	async fn receive(&mut self) -> Result<String, SessionError> {
		let mut buf = [0; READ_SIZE];

		loop {
			if let Some(end) = self.reply.iter().position(|&b| b == b'\n') {
				let raw: Vec<u8> = self.reply.drain(..=end).collect();
				let line = String::from_utf8_lossy(&raw).trim().to_owned();

				debug!("< {}", line);
				return Ok(line);
			}

			if self.reply.len() > MAX_LINE_LENGTH {
				return Err(SessionError::ReplyTooLong(self.reply.len()));
			}

			let stream = self.stream.as_mut().ok_or(SessionError::NotConnected)?;
			let read = match self.read_timeout {
				Some(limit) => timeout(limit, stream.read(&mut buf)).await??,
				None => stream.read(&mut buf).await?,
			};

			// A zero sized read, this connection has died or been terminated by the server
			if read == 0 {
				return Err(SessionError::ConnectionClosed);
			}

			self.reply.extend_from_slice(&buf[..read]);
		}
	}
}

#[derive(Debug, Error)]
pub enum SessionError {
	#[error("error connecting to the SMTP server at {addr}: {source}")]
	Connect {
		addr: String,
		#[source]
		source: std::io::Error,
	},
	#[error("the session is not connected")]
	NotConnected,
	#[error("connection unexpectedly closed by server")]
	ConnectionClosed,
	#[error("the server sent {0} bytes without ending the line")]
	ReplyTooLong(usize),
	#[error("timed out waiting for the server")]
	Timeout(#[from] Elapsed),
	#[error("there was an error talking to the server: {0}")]
	Io(#[from] std::io::Error),
}
