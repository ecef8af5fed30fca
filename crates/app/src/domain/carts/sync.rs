//! Cart sync state machine.
//!
//! A write moves the cart `Idle -> Mutating` while the optimistic change is
//! applied and sent, `Mutating -> Reconciling` while the server copy is
//! reloaded, and back to `Idle` once the server copy has replaced the local
//! one. A failed write goes straight back to `Idle`.

use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Idle,
    Mutating,
    Reconciling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// An optimistic change was applied and the backend call is in flight.
    Mutate,

    /// The backend accepted the change; the cart is being reloaded.
    Reconcile,

    /// The server copy replaced the local one.
    Settle,

    /// The backend call or reload failed.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot apply {event:?} while {state:?}")]
pub struct InvalidTransition {
    pub state: SyncState,
    pub event: SyncEvent,
}

impl SyncState {
    /// The state after `event`.
    ///
    /// # Errors
    ///
    /// Returns an error for events that make no sense in the current state,
    /// e.g. starting a second write while one is in flight.
    pub fn transition(self, event: SyncEvent) -> Result<Self, InvalidTransition> {
        match (self, event) {
            (Self::Idle, SyncEvent::Mutate) => Ok(Self::Mutating),
            (Self::Mutating, SyncEvent::Reconcile) => Ok(Self::Reconciling),
            (Self::Reconciling, SyncEvent::Settle) => Ok(Self::Idle),
            (Self::Mutating | Self::Reconciling, SyncEvent::Fail) => Ok(Self::Idle),
            (state, event) => Err(InvalidTransition { state, event }),
        }
    }

    #[must_use]
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn successful_write_cycles_back_to_idle() -> TestResult {
        let state = SyncState::Idle
            .transition(SyncEvent::Mutate)?
            .transition(SyncEvent::Reconcile)?;

        assert_eq!(state, SyncState::Reconciling);
        assert!(state.transition(SyncEvent::Settle)?.is_idle());

        Ok(())
    }

    #[test]
    fn failure_returns_to_idle_from_any_busy_state() -> TestResult {
        assert!(SyncState::Mutating.transition(SyncEvent::Fail)?.is_idle());
        assert!(SyncState::Reconciling.transition(SyncEvent::Fail)?.is_idle());

        Ok(())
    }

    #[test]
    fn overlapping_writes_are_rejected() {
        let result = SyncState::Mutating.transition(SyncEvent::Mutate);

        assert_eq!(
            result,
            Err(InvalidTransition {
                state: SyncState::Mutating,
                event: SyncEvent::Mutate,
            })
        );
        assert!(SyncState::Idle.transition(SyncEvent::Settle).is_err());
    }
}
