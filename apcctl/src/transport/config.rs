//! Device endpoint configuration.

use std::time::Duration;

/// Default telnet port of the device family.
pub const DEFAULT_PORT: u16 = 23;

/// Default bound for connect and per-prompt waits.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Telnet endpoint of the power strip's administration menu.
#[derive(Debug, Clone)]
pub struct DeviceEndpoint {
    /// Target host (hostname or IP address).
    pub host: String,

    /// Telnet port (default: 23).
    pub port: u16,

    /// Bound applied to the connect attempt and to every prompt wait.
    pub timeout: Duration,
}

impl DeviceEndpoint {
    /// Endpoint on the default telnet port with the default timeout.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set a non-default port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set a non-default timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
