mod args;

use args::{Args, ArgsError};
use parley::net::{Session, SessionError};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

/// Status code reported when the whole conversation went through
const STATUS_SENT: u16 = 333;
/// Status code reported for any failure, bad arguments included
const STATUS_FAILED: u16 = 500;

/// The one JSON object written to stdout
#[derive(Debug, Serialize)]
struct Report {
	status_code: u16,
	message: String,
}

#[derive(Debug, Error)]
enum SendError {
	#[error("{0}")]
	Args(#[from] ArgsError),
	#[error("error during the SMTP conversation: {0}")]
	Session(#[from] SessionError),
}

#[tokio::main]
async fn main() {
	// stdout is reserved for the report
	if let Err(err) = parley::logging::setup_tracing(std::io::stderr) {
		eprintln!("failed to set up logging: {}", err);
	}

	let args: Vec<String> = std::env::args().collect();

	let report = match run(&args).await {
		Ok(Some(transcript)) => Report {
			status_code: STATUS_SENT,
			message: transcript,
		},
		Ok(None) => {
			let prgm = args.first().map(String::as_str).unwrap_or("parley-send");
			println!("{}", Args::usage(prgm));
			return;
		}
		Err(err) => {
			error!("{}", err);
			Report {
				status_code: STATUS_FAILED,
				message: err.to_string(),
			}
		}
	};

	match serde_json::to_string(&report) {
		Ok(json) => println!("{}", json),
		Err(err) => error!("failed to serialize the report: {}", err),
	}

	if report.status_code != STATUS_SENT {
		std::process::exit(1);
	}
}

/// Send the mail described by `args`. On success returns the greeting and
/// every reply, one per line.
async fn run(args: &[String]) -> Result<Option<String>, SendError> {
	let args = match Args::parse(args)? {
		Some(args) => args,
		None => return Ok(None),
	};

	let (mut session, greeting) =
		Session::connect_with_timeout(&args.host, args.port, args.timeout).await?;

	let result = session.send_email(args.envelope).await;
	session.close().await;
	let replies = result?;

	info!("{} answered {} commands", session.peer_addr(), replies.len());

	let mut transcript = vec![greeting];
	transcript.extend(replies);

	Ok(Some(transcript.join("\n")))
}
