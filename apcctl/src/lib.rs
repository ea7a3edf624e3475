//! # apcctl
//!
//! Remote control for APC network power strips that only expose a
//! character-based administration menu over telnet.
//!
//! The device has no programmatic API: every action is a fixed keystroke
//! dialogue against prompt text. This crate encodes each action as a
//! declarative menu path (keystroke + expected-prompt steps) interpreted
//! by one generic navigator over a scrubbed telnet stream with bounded
//! prompt waits, parses the status screen into per-outlet state, and
//! persists outlet aliases and session defaults in a YAML config.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use apcctl::menu;
//! use apcctl::transport::DeviceEndpoint;
//! use apcctl::{MenuSession, Outlet, OutletAction, TelnetTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), apcctl::Error> {
//!     let endpoint = DeviceEndpoint::new("192.168.1.98");
//!     let transport = TelnetTransport::connect(&endpoint).await?;
//!     let mut session = MenuSession::new(transport, Duration::from_secs(5));
//!
//!     session.login("apc", "apc").await?;
//!     let outlet = Outlet::new(3)?;
//!     session
//!         .navigate(&menu::control_path(OutletAction::On, outlet))
//!         .await?;
//!     session.close().await.ok();
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod menu;
pub mod outlet;
pub mod session;
pub mod status;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use config::Config;
pub use error::Error;
pub use menu::OutletAction;
pub use outlet::Outlet;
pub use session::MenuSession;
pub use status::StatusSnapshot;
pub use transport::TelnetTransport;
