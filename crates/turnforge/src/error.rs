//! Advisory error codes surfaced to game logic.

use thiserror::Error;

/// The two advisory conditions a session can report.
///
/// Both are informational: gameplay continues, game logic merely gets
/// the chance to react (show a hint, discard a stale reply).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TurnErrorCode {
    /// Submission is required, but the bundle that had been handed to
    /// the transport when an irreversible host action happened was not
    /// marked complete.
    #[error("incomplete turn data was sent")]
    IncompleteTurnDataSent,

    /// Submission is required, but the inbound bundle from the other
    /// player exists and is not marked complete.
    #[error("incomplete turn data was received")]
    IncompleteTurnDataReceived,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_messages() {
        assert_eq!(
            TurnErrorCode::IncompleteTurnDataSent.to_string(),
            "incomplete turn data was sent"
        );
        assert_eq!(
            TurnErrorCode::IncompleteTurnDataReceived.to_string(),
            "incomplete turn data was received"
        );
    }
}
