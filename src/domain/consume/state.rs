//! ConsumeSessionState enum for tracking the lifecycle of consume sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle state of a consume session.
///
/// `Stopped` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumeSessionState {
    #[default]
    Running,
    Paused,
    Stopped,
    Error,
}

impl ConsumeSessionState {
    /// Returns true while a background consumer should still be attached.
    pub fn is_live(&self) -> bool {
        matches!(self, ConsumeSessionState::Running | ConsumeSessionState::Paused)
    }

    /// Returns true if new viewers may attach.
    pub fn accepts_subscribers(&self) -> bool {
        self.is_live()
    }
}

impl StateMachine for ConsumeSessionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConsumeSessionState::*;
        matches!(
            (self, target),
            (Running, Paused)
                | (Running, Stopped)
                | (Running, Error)
                | (Paused, Running)
                | (Paused, Stopped)
                | (Paused, Error)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConsumeSessionState::*;
        match self {
            Running => vec![Paused, Stopped, Error],
            Paused => vec![Running, Stopped, Error],
            Stopped | Error => vec![],
        }
    }
}

impl fmt::Display for ConsumeSessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConsumeSessionState::Running => "RUNNING",
            ConsumeSessionState::Paused => "PAUSED",
            ConsumeSessionState::Stopped => "STOPPED",
            ConsumeSessionState::Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConsumeSessionState::*;

    #[test]
    fn default_is_running() {
        assert_eq!(ConsumeSessionState::default(), Running);
    }

    #[test]
    fn running_and_paused_toggle() {
        assert!(Running.can_transition_to(&Paused));
        assert!(Paused.can_transition_to(&Running));
    }

    #[test]
    fn stopped_and_error_are_terminal() {
        assert!(Stopped.is_terminal());
        assert!(Error.is_terminal());
        assert!(Stopped.transition_to(Running).is_err());
        assert!(Error.transition_to(Paused).is_err());
    }

    #[test]
    fn live_states_accept_subscribers() {
        assert!(Running.accepts_subscribers());
        assert!(Paused.accepts_subscribers());
        assert!(!Stopped.accepts_subscribers());
        assert!(!Error.accepts_subscribers());
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for state in [Running, Paused, Stopped, Error] {
            for target in [Running, Paused, Stopped, Error] {
                assert_eq!(
                    state.can_transition_to(&target),
                    state.valid_transitions().contains(&target),
                    "{:?} -> {:?}",
                    state,
                    target
                );
            }
        }
    }

    #[test]
    fn serializes_to_uppercase_json() {
        assert_eq!(serde_json::to_string(&Running).unwrap(), "\"RUNNING\"");
        assert_eq!(serde_json::to_string(&Error).unwrap(), "\"ERROR\"");
        assert_eq!(Paused.to_string(), "PAUSED");
    }
}
