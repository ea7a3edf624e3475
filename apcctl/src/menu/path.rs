//! Menu paths as data.

use regex::bytes::Regex;

/// One turn of the menu dialogue: send `keystroke`, wait for `expect`.
#[derive(Debug, Clone)]
pub struct MenuStep {
    /// Keystroke to send, without the terminating carriage return.
    pub keystroke: String,

    /// Prompt that signals the device accepted the keystroke.
    pub expect: Regex,
}

impl MenuStep {
    /// Create a step from a keystroke and an already-compiled prompt.
    pub fn new(keystroke: impl Into<String>, expect: &Regex) -> Self {
        Self {
            keystroke: keystroke.into(),
            expect: expect.clone(),
        }
    }
}

/// Ordered steps from the authenticated menu root to the terminal state of
/// one action.
#[derive(Debug, Clone)]
pub struct MenuPath {
    steps: Vec<MenuStep>,
}

impl MenuPath {
    pub fn new(steps: Vec<MenuStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[MenuStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
