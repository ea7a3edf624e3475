//! Authenticated menu sessions.
//!
//! A session owns one connection for the duration of one invocation:
//! login to the authenticated menu root, navigate one path, close.

use std::time::Duration;

use log::debug;
use regex::bytes::Regex;

use crate::error::{AuthError, ProtocolError, TransportError};
use crate::menu::{self, MENU_PROMPT, MenuPath, NavigationResult, PASSWORD_PROMPT, USERNAME_PROMPT};
use crate::transport::Transport;

/// One authenticated dialogue with the device menu.
pub struct MenuSession<T: Transport> {
    transport: T,
    step_timeout: Duration,
}

impl<T: Transport> MenuSession<T> {
    /// Wrap an open transport; `step_timeout` bounds every prompt wait.
    pub fn new(transport: T, step_timeout: Duration) -> Self {
        Self {
            transport,
            step_timeout,
        }
    }

    /// Drive the login dialogue to the authenticated menu root.
    ///
    /// A credential prompt that never appears is reported as that prompt
    /// missing; credentials sent without the menu appearing afterwards is
    /// a rejected login. Both are [`AuthError`], distinct from the
    /// [`ProtocolError`]s navigation raises.
    pub async fn login(&mut self, user: &str, password: &str) -> Result<(), AuthError> {
        self.expect("username", &USERNAME_PROMPT).await?;
        debug!("sending username");
        self.send(user).await?;

        self.expect("password", &PASSWORD_PROMPT).await?;
        debug!("sending password");
        self.send(password).await?;

        // the menu footer marker is the authenticated-root signal
        match self.transport.wait_for(&MENU_PROMPT, self.step_timeout).await {
            Ok(_) => {
                debug!("authenticated, menu root reached");
                Ok(())
            }
            Err(TransportError::PromptTimeout { .. }) => Err(AuthError::Rejected {
                user: user.to_string(),
            }),
            Err(err) => Err(AuthError::Stream(err)),
        }
    }

    /// Interpret `path` from the authenticated menu root.
    pub async fn navigate(&mut self, path: &MenuPath) -> Result<NavigationResult, ProtocolError> {
        menu::navigate(&mut self.transport, path, self.step_timeout).await
    }

    /// Release the connection.
    pub async fn close(self) -> Result<(), TransportError> {
        self.transport.close().await
    }

    async fn expect(&mut self, prompt: &'static str, pattern: &Regex) -> Result<String, AuthError> {
        match self.transport.wait_for(pattern, self.step_timeout).await {
            Ok(seen) => Ok(seen),
            Err(TransportError::PromptTimeout { .. }) => Err(AuthError::PromptNotSeen {
                prompt,
                timeout: self.step_timeout,
            }),
            Err(err) => Err(AuthError::Stream(err)),
        }
    }

    async fn send(&mut self, line: &str) -> Result<(), AuthError> {
        self.transport.send_line(line).await.map_err(AuthError::Stream)
    }
}
