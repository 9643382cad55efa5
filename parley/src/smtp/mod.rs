mod client;
mod command;
mod message;
mod response;
mod server;

pub use client::{Client, Output, HELO_DOMAIN};
pub use command::Command;
pub use message::*;
pub use response::{Response, ResponseCode};
pub use server::Server;

/// Longest line either side buffers while waiting for its line ending
pub const MAX_LINE_LENGTH: usize = 4096;
