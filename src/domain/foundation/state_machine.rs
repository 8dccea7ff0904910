//! Validated transitions for lifecycle enums.

use super::ValidationError;

/// A lifecycle enum with a fixed transition table.
///
/// Implementors list their exits in [`valid_transitions`](Self::valid_transitions);
/// the checked helpers are derived from it.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    fn valid_transitions(&self) -> Vec<Self>;

    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// `Ok(target)` when the move is allowed.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_format(
                "state",
                format!("{:?} cannot move to {:?}", self, target),
            ));
        }
        Ok(target)
    }

    /// No exits left.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
