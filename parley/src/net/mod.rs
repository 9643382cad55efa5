use std::{sync::Arc, time::Duration};

use tokio::{
	io::{self, AsyncReadExt, AsyncWriteExt},
	net::{TcpListener, TcpStream},
	sync::watch,
	task::JoinSet,
	time::timeout,
};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::{config::Config, smtp::Server};

mod session;

pub use session::{Session, SessionError};

enum Event {
	Read(io::Result<usize>),
	TimedOut,
	Shutdown,
}

//runs as long as the client remains connected
// handles the tcp reads and writes, the Server decides what to say.
pub async fn serve(
	mut stream: TcpStream,
	config: Arc<dyn Config>,
	mut rx: watch::Receiver<bool>,
) -> io::Result<()> {
	let read_timeout = config.read_timeout();
	let (mut server, initial_response) = Server::initiate(config);
	stream
		.write_all(initial_response.as_string().as_bytes())
		.await?;

	let mut buf = vec![0; 1024];

	while !server.should_exit() {
		let event = tokio::select! {
			read = read_some(&mut stream, &mut buf, read_timeout) => read,
			Ok(()) = rx.changed() => Event::Shutdown,
		};

		let read = match event {
			Event::Read(read) => read?,
			Event::TimedOut => {
				warn!("client went quiet, closing");
				stream.write_all(server.timed_out().as_string().as_bytes()).await?;
				return Ok(());
			}
			Event::Shutdown => {
				stream
					.write_all(server.shutting_down().as_string().as_bytes())
					.await?;
				return Ok(());
			}
		};

		// A zero sized read, this connection has died or been terminated by the client
		if read == 0 {
			if server.is_loading_data() {
				warn!("connection closed by client in the middle of DATA");
			} else {
				info!("connection closed by client");
			}

			return Ok(());
		}

		for response in server.push(&buf[..read]) {
			if response.code().is_negative() {
				debug!("replying {}", response);
			}

			stream.write_all(response.as_string().as_bytes()).await?;
		}
	}

	Ok(())
}

async fn read_some(stream: &mut TcpStream, buf: &mut [u8], limit: Option<Duration>) -> Event {
	match limit {
		Some(limit) => match timeout(limit, stream.read(buf)).await {
			Ok(read) => Event::Read(read),
			Err(_) => Event::TimedOut,
		},
		None => Event::Read(stream.read(buf).await),
	}
}

//waits for new connections, dispatches new task to handle each new inbound connection.
// Returns once `rx` sees a shutdown and every open session has finished.
pub async fn listen(
	listener: TcpListener,
	config: Arc<dyn Config>,
	mut rx: watch::Receiver<bool>,
) {
	let mut sessions = JoinSet::new();

	loop {
		let (stream, clientaddr) = tokio::select! {
			Ok(()) = rx.changed() => break,
			Some(_) = sessions.join_next() => continue,
			accepted = listener.accept() => match accepted {
				Ok(accepted) => accepted,
				Err(err) => {
					warn!("failed to accept a connection: {}", err);
					continue;
				}
			},
		};

		info!("connection from {}", clientaddr);

		let span = info_span!("session", client = %clientaddr);
		let session = serve(stream, config.clone(), rx.clone());
		sessions.spawn(
			async move {
				if let Err(err) = session.await {
					warn!("session ended with an error: {}", err);
				}

				debug!("session over");
			}
			.instrument(span),
		);
	}

	info!("no longer accepting connections, waiting on {} sessions", sessions.len());
	while sessions.join_next().await.is_some() {}
}
