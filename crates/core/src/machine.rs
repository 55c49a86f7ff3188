//! Top-level reader states and the transitions allowed between them.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReaderState {
    Idle,
    Selecting,
    Reading,
}

impl ReaderState {
    /// States reachable from `self` in one transition.
    pub fn allowed_targets(&self) -> &'static [ReaderState] {
        match self {
            ReaderState::Idle => &[ReaderState::Selecting, ReaderState::Reading],
            ReaderState::Selecting => &[ReaderState::Idle, ReaderState::Reading],
            ReaderState::Reading => &[ReaderState::Idle],
        }
    }

    pub fn can_transition_to(&self, next: ReaderState) -> bool {
        self.allowed_targets().contains(&next)
    }
}

impl fmt::Display for ReaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReaderState::Idle => "Idle",
            ReaderState::Selecting => "Selecting",
            ReaderState::Reading => "Reading",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: ReaderState,
    pub to: ReaderState,
}

/// Check a transition against the adjacency table. Rejections are logged.
pub fn validate_transition(from: ReaderState, to: ReaderState) -> Result<(), InvalidTransition> {
    if from.can_transition_to(to) {
        return Ok(());
    }
    log::debug!("blocked invalid transition {} -> {}", from, to);
    Err(InvalidTransition { from, to })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReaderState::*;

    #[test]
    fn test_adjacency_table() {
        assert!(Idle.can_transition_to(Selecting));
        assert!(Idle.can_transition_to(Reading));
        assert!(Selecting.can_transition_to(Idle));
        assert!(Selecting.can_transition_to(Reading));
        assert!(Reading.can_transition_to(Idle));
        assert!(!Reading.can_transition_to(Selecting));
        assert!(!Idle.can_transition_to(Idle));
    }

    #[test]
    fn test_validate_rejects_reading_to_selecting() {
        let err = validate_transition(Reading, Selecting).unwrap_err();
        assert_eq!(err, InvalidTransition { from: Reading, to: Selecting });
        assert_eq!(err.to_string(), "invalid transition from Reading to Selecting");
    }
}
