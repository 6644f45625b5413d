//! SessionStatus enum for tracking the lifecycle of one client connection.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Lifecycle status of a chat session.
///
/// ```text
/// Connecting ──▶ Active ──▶ Closing ──▶ Closed
///                 │  ▲
///                 └──┘  (chat turn or protocol error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Connecting,
    Active,
    Closing,
    Closed,
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Connecting, Active) | (Active, Active) | (Active, Closing) | (Closing, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStatus::*;
        match self {
            Connecting => vec![Active],
            Active => vec![Active, Closing],
            Closing => vec![Closed],
            Closed => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Connecting => "Connecting",
            SessionStatus::Active => "Active",
            SessionStatus::Closing => "Closing",
            SessionStatus::Closed => "Closed",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionStatus::*;

    const ALL: [SessionStatus; 4] = [Connecting, Active, Closing, Closed];

    #[test]
    fn default_is_connecting() {
        assert_eq!(SessionStatus::default(), Connecting);
    }

    #[test]
    fn lifecycle_happy_path_is_valid() {
        let status = Connecting
            .transition_to(Active)
            .and_then(|s| s.transition_to(Active))
            .and_then(|s| s.transition_to(Closing))
            .and_then(|s| s.transition_to(Closed))
            .unwrap();
        assert_eq!(status, Closed);
    }

    #[test]
    fn active_only_leaves_to_closing() {
        for target in ALL {
            let allowed = Active.can_transition_to(&target);
            assert_eq!(allowed, matches!(target, Active | Closing), "Active -> {target}");
        }
    }

    #[test]
    fn connecting_cannot_skip_to_closing() {
        assert!(Connecting.transition_to(Closing).is_err());
    }

    #[test]
    fn closed_is_the_only_terminal_state() {
        for status in ALL {
            assert_eq!(status.is_terminal(), status == Closed, "{status}");
        }
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for status in ALL {
            for target in ALL {
                assert_eq!(
                    status.can_transition_to(&target),
                    status.valid_transitions().contains(&target),
                    "{status} -> {target}"
                );
            }
        }
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Closing).unwrap(), "\"closing\"");
    }
}
