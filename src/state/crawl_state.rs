//! Crawl lifecycle states
//!
//! A crawl session moves `Idle -> Running` and then ends in exactly one of
//! the terminal states.

use crate::{CrawlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the lifecycle state of one organization's crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlState {
    /// Created, not started
    Idle,

    /// Main loop in progress
    Running,

    // ===== Terminal States =====
    /// Frontier drained or page budget reached
    Completed,

    /// Interrupted; a checkpoint allows resuming
    Paused,

    /// Stopped by an unrecoverable condition
    Failed,
}

impl CrawlState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Paused | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// `Idle` may also go straight to `Failed`, for crawls that cannot even
    /// start.
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Paused)
                | (Self::Running, Self::Failed)
        )
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: CrawlState) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Paused => "paused",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!CrawlState::Idle.is_terminal());
        assert!(!CrawlState::Running.is_terminal());

        assert!(CrawlState::Completed.is_terminal());
        assert!(CrawlState::Paused.is_terminal());
        assert!(CrawlState::Failed.is_terminal());
    }

    #[test]
    fn test_legal_transitions() {
        let mut state = CrawlState::Idle;
        state.transition(CrawlState::Running).unwrap();
        state.transition(CrawlState::Paused).unwrap();
        assert_eq!(state, CrawlState::Paused);

        let mut state = CrawlState::Idle;
        state.transition(CrawlState::Failed).unwrap();
        assert_eq!(state, CrawlState::Failed);
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [CrawlState::Completed, CrawlState::Paused, CrawlState::Failed] {
            for next in [
                CrawlState::Idle,
                CrawlState::Running,
                CrawlState::Completed,
                CrawlState::Paused,
                CrawlState::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let mut state = CrawlState::Idle;
        let result = state.transition(CrawlState::Completed);
        assert!(matches!(
            result,
            Err(CrawlError::InvalidTransition {
                from: CrawlState::Idle,
                to: CrawlState::Completed
            })
        ));
        assert_eq!(state, CrawlState::Idle);
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(format!("{}", CrawlState::Paused), "paused");
        assert_eq!(serde_json::to_string(&CrawlState::Completed).unwrap(), "\"completed\"");
    }
}
