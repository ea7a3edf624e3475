//! Durable configuration store.
//!
//! One YAML file holds the device identity, credentials, the last-used
//! outlet, and the per-outlet alias/description tables. The record is
//! loaded fresh at the start of every invocation and written back only
//! after an action succeeded; writes replace the file atomically so a
//! crash can never leave a half-written config behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::outlet::{OUTLET_COUNT, Outlet};

/// The durable per-user record.
///
/// Pure data plus explicit load/save; all networking state lives
/// elsewhere. The alias and description maps are keyed by outlet number
/// and keep file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub hostname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub last_port: Option<u8>,
    pub description: Option<String>,
    aliases: IndexMap<u8, String>,
    descriptions: IndexMap<u8, String>,
}

/// On-disk shape: aliases and descriptions flattened into one entry list.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawConfig {
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    last_port: Option<u8>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    aliases: Vec<RawAlias>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawAlias {
    port: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Config {
    /// Read and decode the config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_raw(raw, path)
    }

    fn from_raw(raw: RawConfig, path: &Path) -> Result<Self, ConfigError> {
        let mut aliases = IndexMap::new();
        let mut descriptions = IndexMap::new();

        for entry in raw.aliases {
            let port = u8::try_from(entry.port)
                .ok()
                .and_then(|port| Outlet::new(port).ok())
                .ok_or_else(|| ConfigError::AliasOutletOutOfRange {
                    path: path.to_path_buf(),
                    outlet: entry.port,
                    max: OUTLET_COUNT,
                })?
                .number();
            if let Some(name) = entry.name {
                aliases.insert(port, name);
            }
            if let Some(description) = entry.description {
                descriptions.insert(port, description);
            }
        }

        Ok(Self {
            hostname: raw.hostname,
            user: raw.user,
            password: raw.password,
            last_port: raw.last_port,
            description: raw.description,
            aliases,
            descriptions,
        })
    }

    fn to_raw(&self) -> RawConfig {
        let mut ports: Vec<u8> = self.aliases.keys().copied().collect();
        for port in self.descriptions.keys() {
            if !ports.contains(port) {
                ports.push(*port);
            }
        }

        let aliases = ports
            .into_iter()
            .map(|port| RawAlias {
                port: u64::from(port),
                name: self.aliases.get(&port).cloned(),
                description: self.descriptions.get(&port).cloned(),
            })
            .collect();

        RawConfig {
            hostname: self.hostname.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            last_port: self.last_port,
            description: self.description.clone(),
            aliases,
        }
    }

    /// Serialize the full record and atomically replace the file.
    ///
    /// The bytes are written to a sibling temporary file, flushed to disk,
    /// then renamed over the target.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text =
            serde_yaml::to_string(&self.to_raw()).map_err(|source| ConfigError::Encode { source })?;

        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let tmp = path.with_extension("yaml.tmp");
        let mut file = fs::File::create(&tmp).map_err(write_err)?;
        file.write_all(text.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);
        fs::rename(&tmp, path).map_err(write_err)?;

        debug!("config written to {}", path.display());
        Ok(())
    }

    /// Add or overwrite the alias for an outlet.
    pub fn set_alias(&mut self, outlet: Outlet, name: impl Into<String>) {
        self.aliases.insert(outlet.number(), name.into());
    }

    /// Add or overwrite the description for an outlet.
    pub fn set_description(&mut self, outlet: Outlet, description: impl Into<String>) {
        self.descriptions.insert(outlet.number(), description.into());
    }

    /// Remove the alias bound to `name`, reporting whether one was found.
    /// Not finding one is a normal outcome, not an error. The outlet's
    /// description entry is kept.
    pub fn remove_alias_by_name(&mut self, name: &str) -> bool {
        let port = self
            .aliases
            .iter()
            .find_map(|(port, alias)| (alias == name).then_some(*port));
        match port {
            Some(port) => {
                self.aliases.shift_remove(&port);
                true
            }
            None => false,
        }
    }

    /// Alias of an outlet, if one is set.
    pub fn alias(&self, outlet: Outlet) -> Option<&str> {
        self.aliases.get(&outlet.number()).map(String::as_str)
    }

    /// Description of an outlet, if one is set.
    pub fn description_for(&self, outlet: Outlet) -> Option<&str> {
        self.descriptions.get(&outlet.number()).map(String::as_str)
    }

    /// Outlet an alias is bound to, if any. With duplicate names in a
    /// hand-edited file, the first in file order wins.
    pub fn outlet_for_alias(&self, name: &str) -> Option<Outlet> {
        self.aliases
            .iter()
            .find(|(_, alias)| alias.as_str() == name)
            .and_then(|(port, _)| Outlet::new(*port).ok())
    }
}

/// Default location: `<user config dir>/apc/config.yaml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|base| base.join("apc").join("config.yaml"))
        .ok_or(ConfigError::NoConfigDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    fn sample() -> Config {
        let mut config = Config {
            hostname: Some("pdu.lab".to_string()),
            user: Some("apc".to_string()),
            password: Some("secret".to_string()),
            last_port: Some(3),
            description: Some("rack A power strip".to_string()),
            ..Config::default()
        };
        config.set_alias(Outlet::new(2).unwrap(), "router");
        config.set_description(Outlet::new(2).unwrap(), "edge router");
        config.set_alias(Outlet::new(7).unwrap(), "switch");
        config
    }

    #[test]
    fn save_then_load_round_trips_every_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let config = sample();
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn round_trip_keeps_non_contiguous_ports() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::default();
        config.set_alias(Outlet::new(8).unwrap(), "heater");
        config.set_alias(Outlet::new(1).unwrap(), "lamp");
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.alias(Outlet::new(8).unwrap()), Some("heater"));
        assert_eq!(loaded.alias(Outlet::new(1).unwrap()), Some("lamp"));
        assert_eq!(loaded.alias(Outlet::new(2).unwrap()), None);
    }

    #[test]
    fn remove_alias_by_name_reports_found_and_not_found() {
        let mut config = sample();

        assert!(config.remove_alias_by_name("router"));
        assert_eq!(config.alias(Outlet::new(2).unwrap()), None);
        // the description survives the alias removal
        assert_eq!(
            config.description_for(Outlet::new(2).unwrap()),
            Some("edge router")
        );

        let before = config.clone();
        assert!(!config.remove_alias_by_name("no-such-alias"));
        assert_eq!(config, before);
    }

    #[test]
    fn outlet_for_alias_resolves_names() {
        let config = sample();
        assert_eq!(
            config.outlet_for_alias("switch"),
            Some(Outlet::new(7).unwrap())
        );
        assert_eq!(config.outlet_for_alias("toaster"), None);
    }

    #[test]
    fn load_missing_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_rejects_malformed_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "hostname: [unclosed").unwrap();

        assert!(matches!(
            Config::load(&path).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn load_rejects_out_of_range_alias_port() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "aliases:\n- port: 300\n  name: phantom\n",
        )
        .unwrap();

        assert!(matches!(
            Config::load(&path).unwrap_err(),
            ConfigError::AliasOutletOutOfRange { outlet: 300, .. }
        ));
    }

    #[test]
    fn unknown_and_missing_keys_default_quietly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "hostname: pdu.lab\nfuture_knob: 42\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.hostname.as_deref(), Some("pdu.lab"));
        assert_eq!(config.last_port, None);
        assert_eq!(config.alias(Outlet::new(1).unwrap()), None);
    }

    #[test]
    fn save_leaves_no_temporary_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        sample().save(&path).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("yaml.tmp").exists());
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apc").join("config.yaml");

        sample().save(&path).unwrap();
        assert!(Config::load(&path).is_ok());
    }
}
