//! Telnet transport layer.
//!
//! Low-level connection management: bounded TCP connect, CR-terminated
//! keystroke writes, and prompt waits over a scrubbed byte stream.

pub mod config;
mod telnet;

pub use config::DeviceEndpoint;
pub use telnet::{TelnetTransport, Transport};
