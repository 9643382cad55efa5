use std::time::Duration;

pub trait Config: Send + Sync {
	/// Returns the hostname that the server will present itself as
	fn primary_host(&self) -> &str;

	/// How long a session may sit without receiving anything from the client
	/// before the server gives up on it. `None` waits forever.
	fn read_timeout(&self) -> Option<Duration>;
}
