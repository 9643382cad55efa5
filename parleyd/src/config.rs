use std::{
	net::{IpAddr, SocketAddr},
	path::Path,
	time::Duration,
};

use confindent::Confindent;
use getopts::{Matches, Options};
use parley::config::Config as ServerConfig;
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_CONFIG: &str = "/etc/parley/parley.conf";
const FALLBACK_CONFIG: &str = "parley.conf";

pub struct Config {
	pub address: IpAddr,
	pub port: u16,
	pub hostname: String,
	pub read_timeout: Option<Duration>,
}

impl Config {
	fn options() -> Options {
		let mut opts = Options::new();
		opts.optflag("h", "help", "Print this help message");
		opts.optopt(
			"l",
			"listen-address",
			"The IP address parleyd will listen for incoming connections on\nDefault: 0.0.0.0",
			"IP_ADDR",
		);
		opts.optopt(
			"p",
			"port",
			"The port parleyd will listen on\nDefault: 2525",
			"PORT",
		);
		opts.optopt(
			"n",
			"hostname",
			"The name parleyd greets clients with\nDefault: this machine's hostname",
			"NAME",
		);
		opts.optopt(
			"t",
			"read-timeout",
			"Seconds to wait on a silent client before hanging up\nDefault: wait forever",
			"SECS",
		);
		opts.optopt(
			"c",
			"config",
			"An alternate location to read the config from\nDefault: /etc/parley/parley.conf",
			"PATH",
		);
		opts
	}

	fn print_usage<S: AsRef<str>>(prgm: S, opts: &Options) {
		let brief = format!("Usage: {} [options]", prgm.as_ref());
		println!("{}", opts.usage(&brief));
	}

	pub fn socket_address(&self) -> SocketAddr {
		SocketAddr::new(self.address, self.port)
	}

	/// Read the config from the process arguments. `None` means we printed
	/// the help and there's nothing else to do.
	pub fn get() -> Result<Option<Self>, ConfigError> {
		let args: Vec<String> = std::env::args().collect();
		Self::from_args(&args)
	}

	pub fn from_args(args: &[String]) -> Result<Option<Self>, ConfigError> {
		let opts = Self::options();
		let matches = opts.parse(args.iter().skip(1))?;

		if matches.opt_present("help") {
			Self::print_usage(args.first().map(String::as_str).unwrap_or("parleyd"), &opts);
			return Ok(None);
		}

		let file = Self::read_file(&matches)?;

		// Options specified on the command line take priority. We only take the
		// cli_key and convert to the config key internally so that we can remain
		// consistent.
		let find_value = |cli_key: &str| -> Option<String> {
			matches.opt_str(cli_key).or_else(|| {
				file.as_ref()
					.and_then(|conf| conf.child_value(conf_key(cli_key)))
					.map(|s| s.to_owned())
			})
		};

		Self::from_values(find_value).map(Some)
	}

	/// Build the config from a lookup keyed by the long CLI option name.
	fn from_values<F: Fn(&str) -> Option<String>>(find_value: F) -> Result<Self, ConfigError> {
		let address: IpAddr = match find_value("listen-address") {
			None => IpAddr::from([0, 0, 0, 0]),
			Some(string) => string
				.parse()
				.map_err(|_| ConfigError::Address(string))?,
		};

		let port: u16 = match find_value("port") {
			None => 2525,
			Some(string) => string.parse().map_err(|_| ConfigError::Port(string))?,
		};

		let hostname = find_value("hostname").unwrap_or_else(system_hostname);

		let read_timeout = match find_value("read-timeout") {
			None => None,
			Some(string) => match string.parse::<u64>() {
				Ok(0) | Err(_) => return Err(ConfigError::ReadTimeout(string)),
				Ok(secs) => Some(Duration::from_secs(secs)),
			},
		};

		Ok(Self {
			address,
			port,
			hostname,
			read_timeout,
		})
	}

	fn read_file(matches: &Matches) -> Result<Option<Confindent>, ConfigError> {
		let candidates = match matches.opt_str("config") {
			Some(path) => vec![path],
			None => vec![DEFAULT_CONFIG.to_owned(), FALLBACK_CONFIG.to_owned()],
		};

		for path in candidates {
			if !Path::new(&path).exists() {
				debug!("no config file at {}", path);
				continue;
			}

			return match Confindent::from_file(&path) {
				Ok(conf) => {
					info!("read config from {}", path);
					Ok(Some(conf))
				}
				Err(err) => Err(ConfigError::File {
					path,
					reason: err.to_string(),
				}),
			};
		}

		Ok(None)
	}
}

impl ServerConfig for Config {
	fn primary_host(&self) -> &str {
		&self.hostname
	}

	fn read_timeout(&self) -> Option<Duration> {
		self.read_timeout
	}
}

// listen-address -> ListenAddress
fn conf_key(cli_key: &str) -> String {
	cli_key
		.split('-')
		.map(|word| {
			let mut c = word.chars();
			match c.next() {
				None => String::new(),
				Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
			}
		})
		.collect()
}

fn system_hostname() -> String {
	gethostname::gethostname()
		.into_string()
		.unwrap_or_else(|_| String::from("localhost"))
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("{0}")]
	Arguments(#[from] getopts::Fail),
	#[error("failed to parse conf file {path}: {reason}")]
	File { path: String, reason: String },
	#[error("Failed to parse '{0}' as an IP Address")]
	Address(String),
	#[error("Failed to parse '{0}' as a port")]
	Port(String),
	#[error("Failed to parse '{0}' as a number of seconds")]
	ReadTimeout(String),
}
