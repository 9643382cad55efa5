use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{fmt::MakeWriter, EnvFilter};

/// Install the global subscriber. The filter comes from `RUST_LOG` and falls
/// back to `info`. Log lines go to `writer`, which lets the sender keep stdout
/// free for its JSON report.
pub fn setup_tracing<W>(writer: W) -> Result<(), SetGlobalDefaultError>
where
	W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
	let subscriber = tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.with_writer(writer)
		.finish();

	tracing::subscriber::set_global_default(subscriber)
}
