mod config;

use std::sync::Arc;

use config::Config;

use tokio::io;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() {
	if let Err(err) = parley::logging::setup_tracing(std::io::stdout) {
		eprintln!("failed to set up logging: {}", err);
	}

	let config = match Config::get() {
		Ok(Some(config)) => config,
		Ok(None) => return,
		Err(err) => {
			error!("{}", err);
			std::process::exit(1);
		}
	};

	let listener = match TcpListener::bind(config.socket_address()).await {
		Ok(listener) => listener,
		Err(err) => {
			error!("failed to listen on {}: {}", config.socket_address(), err);
			std::process::exit(1);
		}
	};

	info!(
		"parleyd {} listening on {} as {}",
		env!("CARGO_PKG_VERSION"),
		config.socket_address(),
		config.hostname
	);
	if let Some(read_timeout) = config.read_timeout {
		info!("dropping clients that stay quiet for {:?}", read_timeout);
	}

	let (tx, rx) = watch::channel(false);
	let listen_task = tokio::spawn(parley::net::listen(listener, Arc::new(config), rx));

	if let Err(err) = shutdown_signal().await {
		error!("failed to listen for shutdown signals: {}", err);
	}

	info!("received shutdown signal, beginning graceful shutdown...");
	if tx.send(true).is_err() {
		error!("the listener stopped before it could be told to shut down");
	}

	if let Err(err) = listen_task.await {
		error!("listener task failed: {}", err);
	}
}

async fn shutdown_signal() -> io::Result<()> {
	let mut hangup = signal(SignalKind::hangup())?;
	let mut terminate = signal(SignalKind::terminate())?;

	tokio::select! {
		res = tokio::signal::ctrl_c() => res?,
		_ = hangup.recv() => (),
		_ = terminate.recv() => (),
	};

	Ok(())
}
