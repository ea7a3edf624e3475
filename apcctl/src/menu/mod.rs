//! Declarative menu topology and the navigation routine.
//!
//! Each outlet action is a fixed, ordered list of keystroke/expected-prompt
//! steps ([`MenuPath`]) interpreted by one generic routine
//! ([`navigate`]) against any transport. Paths are pure data, so the four
//! action flows stay comparable and replayable against a scripted stream.

mod device;
mod navigator;
mod path;

pub use device::{
    CONFIRM_PROMPT, CONTINUE_PROMPT, MENU_PROMPT, OutletAction, PASSWORD_PROMPT, USERNAME_PROMPT,
    control_path, status_path,
};
pub use navigator::{NavigationResult, navigate};
pub use path::{MenuPath, MenuStep};
