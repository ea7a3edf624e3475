//! Command dispatch: resolve one action, run it, report the outcome.
//!
//! All user-facing output happens here; the session, navigator, parser,
//! and config APIs only return values and errors. The config is reloaded
//! per invocation and persisted only after a state-changing action
//! succeeded.

use std::future::Future;
use std::io;
use std::path::Path;

use log::warn;

use crate::cli::{Cli, Command};
use crate::config::{Config, default_config_path};
use crate::error::{ConfigError, Error, Result, ValidationError};
use crate::menu::{self, MenuPath, NavigationResult, OutletAction};
use crate::outlet::{OUTLET_COUNT, Outlet};
use crate::session::MenuSession;
use crate::status::{StatusSnapshot, parse_status};
use crate::transport::{DeviceEndpoint, TelnetTransport, Transport};

pub async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    match cli.command {
        Command::On { outlet } => control(&config_path, OutletAction::On, outlet.as_deref()).await,
        Command::Off { outlet } => {
            control(&config_path, OutletAction::Off, outlet.as_deref()).await
        }
        Command::Reset { outlet } => {
            control(&config_path, OutletAction::Reset, outlet.as_deref()).await
        }
        Command::List => list(&config_path).await,
        Command::SetAlias { name, outlet } => set_alias(&config_path, &name, outlet),
        Command::RmAlias { name } => rm_alias(&config_path, &name),
        Command::SetHost { hostname } => set_host(&config_path, &hostname),
    }
}

async fn control(config_path: &Path, action: OutletAction, outlet_arg: Option<&str>) -> Result<()> {
    let outlet = control_with(config_path, action, outlet_arg, connect).await?;
    println!("outlet {outlet} {}", action.done_verb());
    Ok(())
}

async fn list(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let snapshot = list_with(&config, connect).await?;
    print_status(&config, &snapshot);
    Ok(())
}

async fn connect(endpoint: DeviceEndpoint) -> Result<TelnetTransport> {
    Ok(TelnetTransport::connect(&endpoint).await?)
}

/// Core of on/off/reset, generic over how the transport is obtained so
/// the whole flow runs against a scripted stream in tests.
///
/// Validation (outlet resolution, host and credential presence) happens
/// before `connect` is called; a failed action returns before the config
/// is persisted.
async fn control_with<T, C, Fut>(
    config_path: &Path,
    action: OutletAction,
    outlet_arg: Option<&str>,
    connect: C,
) -> Result<Outlet>
where
    T: Transport,
    C: FnOnce(DeviceEndpoint) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut config = Config::load(config_path)?;
    let outlet = resolve_outlet(&config, outlet_arg)?;
    let path = menu::control_path(action, outlet);

    run_path(&config, connect, &path).await?;

    config.last_port = Some(outlet.number());
    config.save(config_path)?;
    Ok(outlet)
}

/// Core of list: navigate to the status screen and parse it. Reads the
/// config but never persists it.
async fn list_with<T, C, Fut>(config: &Config, connect: C) -> Result<StatusSnapshot>
where
    T: Transport,
    C: FnOnce(DeviceEndpoint) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let nav = run_path(config, connect, &menu::status_path()).await?;
    Ok(parse_status(nav.final_screen())?)
}

/// Connect, log in, navigate one path, and close the connection on every
/// exit path.
async fn run_path<T, C, Fut>(config: &Config, connect: C, path: &MenuPath) -> Result<NavigationResult>
where
    T: Transport,
    C: FnOnce(DeviceEndpoint) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let (endpoint, user, password) = device_settings(config)?;
    let step_timeout = endpoint.timeout;
    let transport = connect(endpoint).await?;
    let mut session = MenuSession::new(transport, step_timeout);

    let outcome = async {
        session.login(&user, &password).await?;
        Ok::<NavigationResult, Error>(session.navigate(path).await?)
    }
    .await;

    if let Err(err) = session.close().await {
        warn!("error closing connection: {err}");
    }
    outcome
}

fn device_settings(config: &Config) -> Result<(DeviceEndpoint, String, String)> {
    let host = config
        .hostname
        .clone()
        .filter(|host| !host.is_empty())
        .ok_or(ValidationError::MissingHostname)?;
    let user = config
        .user
        .clone()
        .ok_or(ValidationError::MissingCredentials)?;
    let password = config
        .password
        .clone()
        .ok_or(ValidationError::MissingCredentials)?;
    Ok((DeviceEndpoint::new(host), user, password))
}

/// Resolve the target outlet: explicit argument (number or alias), else
/// the last-used outlet on record.
fn resolve_outlet(config: &Config, arg: Option<&str>) -> std::result::Result<Outlet, ValidationError> {
    match arg {
        Some(arg) if !arg.is_empty() && arg.bytes().all(|b| b.is_ascii_digit()) => {
            let number = arg
                .parse::<u8>()
                .map_err(|_| ValidationError::OutletOutOfRange {
                    outlet: arg.to_string(),
                    max: OUTLET_COUNT,
                })?;
            Outlet::new(number)
        }
        Some(arg) => config
            .outlet_for_alias(arg)
            .ok_or_else(|| ValidationError::UnknownAlias {
                name: arg.to_string(),
            }),
        None => match config.last_port {
            Some(number) => Outlet::new(number),
            None => Err(ValidationError::NoOutletSpecified),
        },
    }
}

fn print_status(config: &Config, snapshot: &StatusSnapshot) {
    for outlet in Outlet::all() {
        let alias = config.alias(outlet).unwrap_or("-");
        let state = if snapshot.is_on(outlet) { "ON" } else { "OFF" };
        println!("{:>2}  {:<16} {}", outlet.number(), alias, state);
    }
}

fn set_alias(config_path: &Path, name: &str, outlet: u8) -> Result<()> {
    let outlet = Outlet::new(outlet)?;
    let mut config = Config::load(config_path)?;

    if let Some(existing) = config.outlet_for_alias(name) {
        if existing != outlet {
            return Err(ValidationError::DuplicateAlias {
                name: name.to_string(),
                outlet: existing.number(),
            }
            .into());
        }
    }

    config.set_alias(outlet, name);
    config.save(config_path)?;
    println!("alias '{name}' -> outlet {outlet}");
    Ok(())
}

fn rm_alias(config_path: &Path, name: &str) -> Result<()> {
    let mut config = Config::load(config_path)?;
    if config.remove_alias_by_name(name) {
        config.save(config_path)?;
        println!("alias '{name}' removed");
    } else {
        println!("no alias named '{name}'");
    }
    Ok(())
}

fn set_host(config_path: &Path, hostname: &str) -> Result<()> {
    // first-run bootstrap: a missing file starts from an empty record
    let mut config = match Config::load(config_path) {
        Ok(config) => config,
        Err(ConfigError::Read { ref source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            Config::default()
        }
        Err(err) => return Err(err.into()),
    };

    config.hostname = Some(hostname.to_string());
    config.save(config_path)?;
    println!("host set to {hostname}");
    Ok(())
}
