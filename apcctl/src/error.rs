//! Error types for apcctl.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for apcctl operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid arguments or configuration state, caught before any network I/O
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The device endpoint could not be reached
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// The login dialogue did not reach the authenticated menu
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The menu prompt sequence deviated during navigation
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The status screen did not have the expected layout
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Config file errors
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Argument and configuration-state validation errors.
///
/// These are always raised before a connection is attempted.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Outlet number outside the device's range
    #[error("outlet {outlet} is out of range 1..={max}")]
    OutletOutOfRange { outlet: String, max: u8 },

    /// No outlet argument and no last-used outlet on record
    #[error("no outlet specified and no last-used outlet on record")]
    NoOutletSpecified,

    /// Outlet argument named an alias the config does not know
    #[error("no alias named '{name}' in the config")]
    UnknownAlias { name: String },

    /// Alias name already bound to a different outlet
    #[error("alias '{name}' is already bound to outlet {outlet}")]
    DuplicateAlias { name: String, outlet: u8 },

    /// Networked action requested with no hostname configured
    #[error("no hostname configured - run `set-host` first")]
    MissingHostname,

    /// Networked action requested with no credentials configured
    #[error("no credentials configured - set `user` and `password` in the config file")]
    MissingCredentials,
}

/// Failure to establish the connection to the device.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// TCP connect failed
    #[error("connection failed to {host}:{port}: {source}")]
    Failed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// TCP connect did not complete within the bound
    #[error("connection to {host}:{port} timed out after {timeout:?}")]
    Timeout {
        host: String,
        port: u16,
        timeout: Duration,
    },
}

/// Low-level stream failures.
///
/// Not part of the public taxonomy: the authenticator and navigator map
/// these into [`AuthError`] and [`ProtocolError`] so a failure always
/// names the phase it happened in.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Expected prompt not seen within the bound
    #[error("prompt {pattern:?} not seen within {timeout:?}")]
    PromptTimeout { pattern: String, timeout: Duration },

    /// Device closed the connection
    #[error("connection closed by device")]
    Disconnected,

    /// I/O error on the stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Login dialogue failures, distinct from navigation failures.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A credential prompt never appeared
    #[error("{prompt} prompt not seen within {timeout:?}")]
    PromptNotSeen {
        prompt: &'static str,
        timeout: Duration,
    },

    /// Credentials were sent but the menu never appeared
    #[error("login for user '{user}' was not accepted")]
    Rejected { user: String },

    /// The stream failed mid-login
    #[error("stream failed during login: {0}")]
    Stream(TransportError),
}

/// Menu navigation failures after authentication.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A step's expected prompt was not seen, even after the single retry
    #[error("menu step {step} (sent {keystroke:?}): expected prompt {expect:?} did not appear")]
    StepFailed {
        step: usize,
        keystroke: String,
        expect: String,
    },

    /// The stream failed mid-navigation
    #[error("stream failed at menu step {step}: {source}")]
    Stream {
        step: usize,
        #[source]
        source: TransportError,
    },
}

/// Status screen parsing failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Fewer outlet entries than the device has outlets. Signals a
    /// firmware or menu layout change, not a user error.
    #[error("status screen yielded {found} of {expected} outlet entries")]
    IncompleteStatus { found: usize, expected: usize },
}

/// Config file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file missing or unreadable
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid YAML
    #[error("config file {path} is not valid YAML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Config could not be serialized
    #[error("cannot serialize config: {source}")]
    Encode {
        #[source]
        source: serde_yaml::Error,
    },

    /// Config file could not be written or replaced
    #[error("cannot write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An alias entry references an outlet the device does not have
    #[error("config file {path}: alias entry references outlet {outlet}, outside 1..={max}")]
    AliasOutletOutOfRange {
        path: PathBuf,
        outlet: u64,
        max: u8,
    },

    /// No user config directory to derive the default path from
    #[error("no config directory available for the default config path")]
    NoConfigDir,
}

/// Result type alias using apcctl's Error.
pub type Result<T> = std::result::Result<T, Error>;
