//! Status screen parsing.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::outlet::{OUTLET_COUNT, Outlet};

/// Live on/off state of every outlet, read from the device manager screen.
/// Never persisted; a fresh snapshot is taken per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    states: [bool; OUTLET_COUNT as usize],
}

impl StatusSnapshot {
    /// Whether the outlet is powered on.
    pub fn is_on(&self, outlet: Outlet) -> bool {
        self.states[(outlet.number() - 1) as usize]
    }

    /// States in ascending outlet order; index i is outlet i+1.
    pub fn states(&self) -> &[bool] {
        &self.states
    }
}

static DEVICE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Device\s+(\d+)\s+(ON|OFF)\s*$").unwrap());

/// Extract the per-outlet states from the raw status screen.
///
/// The screen must contain a `Device <n> ON|OFF` line for every outlet
/// (any order, CRLF or LF, surrounding whitespace tolerated). Anything
/// less means the menu layout changed and is an error, never a partial
/// snapshot.
pub fn parse_status(screen: &str) -> Result<StatusSnapshot, ParseError> {
    let mut states: [Option<bool>; OUTLET_COUNT as usize] = [None; OUTLET_COUNT as usize];

    for caps in DEVICE_LINE.captures_iter(screen) {
        let index = match caps[1].parse::<usize>() {
            Ok(index) if (1..=OUTLET_COUNT as usize).contains(&index) => index,
            _ => continue,
        };
        states[index - 1] = Some(&caps[2] == "ON");
    }

    let found = states.iter().flatten().count();
    if found < OUTLET_COUNT as usize {
        return Err(ParseError::IncompleteStatus {
            found,
            expected: OUTLET_COUNT as usize,
        });
    }

    Ok(StatusSnapshot {
        states: states.map(|state| state.unwrap_or_default()),
    })
}
