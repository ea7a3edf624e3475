//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Control an APC network power strip through its telnet menu.
#[derive(Debug, Parser)]
#[command(name = "apcctl", version, about, long_about = None)]
pub struct Cli {
    /// Path to the config file [default: <config dir>/apc/config.yaml]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Exactly one command per invocation; the sum type makes "none" and
/// "more than one" unrepresentable.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Turn an outlet on [defaults to the last-used outlet]
    On {
        /// Outlet number or alias
        outlet: Option<String>,
    },

    /// Turn an outlet off [defaults to the last-used outlet]
    Off {
        /// Outlet number or alias
        outlet: Option<String>,
    },

    /// Power-cycle an outlet [defaults to the last-used outlet]
    Reset {
        /// Outlet number or alias
        outlet: Option<String>,
    },

    /// List all outlets, their aliases, and their live state
    List,

    /// Bind an alias to an outlet number
    SetAlias {
        /// Alias name
        name: String,
        /// Outlet number
        outlet: u8,
    },

    /// Remove an alias
    RmAlias {
        /// Alias name
        name: String,
    },

    /// Set the hostname or IP address of the device
    SetHost {
        /// Hostname or IP address
        hostname: String,
    },
}
