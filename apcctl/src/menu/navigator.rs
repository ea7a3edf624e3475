//! Generic menu-path interpreter.

use std::time::Duration;

use log::{debug, warn};

use super::path::{MenuPath, MenuStep};
use crate::error::{ProtocolError, TransportError};
use crate::transport::Transport;

/// Screens captured while a path ran, one per step in order.
#[derive(Debug)]
pub struct NavigationResult {
    screens: Vec<String>,
}

impl NavigationResult {
    /// Screens captured per step, in step order.
    pub fn screens(&self) -> &[String] {
        &self.screens
    }

    /// The screen captured while waiting for the last step's prompt.
    pub fn final_screen(&self) -> &str {
        self.screens.last().map(String::as_str).unwrap_or("")
    }
}

/// Drive `transport` through every step of `path`.
///
/// Each step sends its keystroke, then waits for its expected prompt under
/// `step_timeout`. Navigation always starts from the authenticated menu
/// root; no menu position is tracked across calls. One timed-out wait per
/// navigation may be absorbed by re-sending the same keystroke after a
/// fresh wait; any further timeout is a [`ProtocolError`] naming the step.
pub async fn navigate<T: Transport>(
    transport: &mut T,
    path: &MenuPath,
    step_timeout: Duration,
) -> Result<NavigationResult, ProtocolError> {
    let mut screens = Vec::with_capacity(path.len());
    let mut retry_available = true;

    for (index, step) in path.steps().iter().enumerate() {
        debug!(
            "step {index}: sending {:?}, expecting {:?}",
            step.keystroke,
            step.expect.as_str()
        );
        send(transport, index, step).await?;

        let screen = match transport.wait_for(&step.expect, step_timeout).await {
            Ok(screen) => screen,
            Err(TransportError::PromptTimeout { .. }) if retry_available => {
                retry_available = false;
                warn!(
                    "step {index}: prompt {:?} timed out, re-sending {:?} once",
                    step.expect.as_str(),
                    step.keystroke
                );
                send(transport, index, step).await?;
                transport
                    .wait_for(&step.expect, step_timeout)
                    .await
                    .map_err(|err| step_error(index, step, err))?
            }
            Err(err) => return Err(step_error(index, step, err)),
        };
        screens.push(screen);
    }

    Ok(NavigationResult { screens })
}

async fn send<T: Transport>(
    transport: &mut T,
    index: usize,
    step: &MenuStep,
) -> Result<(), ProtocolError> {
    transport
        .send_line(&step.keystroke)
        .await
        .map_err(|source| ProtocolError::Stream {
            step: index,
            source,
        })
}

fn step_error(index: usize, step: &MenuStep, err: TransportError) -> ProtocolError {
    match err {
        TransportError::PromptTimeout { .. } => ProtocolError::StepFailed {
            step: index,
            keystroke: step.keystroke.clone(),
            expect: step.expect.as_str().to_string(),
        },
        other => ProtocolError::Stream {
            step: index,
            source: other,
        },
    }
}
