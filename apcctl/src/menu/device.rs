//! Menu topology of the APC rack PDU family.
//!
//! Every screen of the device redraws a footer containing the `<CTRL-L>`
//! refresh marker; that marker doubles as the "menu is ready for the next
//! keystroke" prompt. Control commands additionally run through a
//! confirmation prompt and a press-any-key marker.

use std::sync::LazyLock;

use regex::bytes::Regex;

use super::path::{MenuPath, MenuStep};
use crate::outlet::Outlet;

fn literal(prompt: &str) -> Regex {
    Regex::new(&regex::escape(prompt)).unwrap()
}

/// Prompt shown before the username.
pub static USERNAME_PROMPT: LazyLock<Regex> = LazyLock::new(|| literal("User Name :"));

/// Prompt shown before the password.
pub static PASSWORD_PROMPT: LazyLock<Regex> = LazyLock::new(|| literal("Password  :"));

/// Footer marker redrawn with every menu screen; seeing it after login is
/// the authenticated-root signal.
pub static MENU_PROMPT: LazyLock<Regex> = LazyLock::new(|| literal("<CTRL-L>"));

/// Confirmation prompt preceding a control command.
pub static CONFIRM_PROMPT: LazyLock<Regex> = LazyLock::new(|| literal("cancel :"));

/// "Press any key to continue" marker after a command is accepted.
pub static CONTINUE_PROMPT: LazyLock<Regex> = LazyLock::new(|| literal("continue..."));

/// Literal token the confirmation prompt expects.
const CONFIRM_TOKEN: &str = "YES";

/// Outlet control actions the menu exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutletAction {
    On,
    Off,
    Reset,
}

impl OutletAction {
    /// Menu key of the immediate-control entry for this action.
    fn command_key(self) -> &'static str {
        match self {
            OutletAction::On => "1",
            OutletAction::Off => "2",
            OutletAction::Reset => "3",
        }
    }

    /// Past-tense verb for user-facing reporting.
    pub fn done_verb(self) -> &'static str {
        match self {
            OutletAction::On => "turned on",
            OutletAction::Off => "turned off",
            OutletAction::Reset => "reset",
        }
    }
}

/// Path from the menu root to the confirmed control command for `action`
/// on `outlet`, and back to a stable menu state.
///
/// The outlet number appears in exactly one step; taking an [`Outlet`]
/// means an unvalidated number cannot reach a keystroke. The `YES` token
/// and the final acknowledgment are only ever sent after their prompts
/// matched.
pub fn control_path(action: OutletAction, outlet: Outlet) -> MenuPath {
    let menu = &*MENU_PROMPT;
    MenuPath::new(vec![
        MenuStep::new("1", menu),                          // device manager
        MenuStep::new("2", menu),                          // outlet management
        MenuStep::new("1", menu),                          // outlet control
        MenuStep::new(outlet.number().to_string(), menu),  // select the outlet
        MenuStep::new("1", menu),                          // control outlet
        MenuStep::new(action.command_key(), &CONFIRM_PROMPT),
        MenuStep::new(CONFIRM_TOKEN, &CONTINUE_PROMPT),
        MenuStep::new("", menu),                           // acknowledge, back to the menu
    ])
}

/// Path to the aggregate status screen. No outlet selection: the device
/// manager screen lists every outlet's state, captured while waiting for
/// its footer.
pub fn status_path() -> MenuPath {
    MenuPath::new(vec![MenuStep::new("1", &MENU_PROMPT)])
}
