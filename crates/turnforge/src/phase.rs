//! The per-session turn lifecycle state machine.

/// The lifecycle phase of a turn session.
///
/// Ordered transitions:
///
/// ```text
/// Uninitialized → Initializing → Active → Submitted → GameOver
/// ```
///
/// with one shortcut: `Active → GameOver`, taken when the final turn
/// ends (or submission is not required, so `Submitted` never occurs).
///
/// - **Uninitialized**: session constructed, nothing fetched yet.
/// - **Initializing**: awaiting the inbound turn payload.
/// - **Active**: the local player's turn is in progress.
/// - **Submitted**: `end_turn` was called and submission is required;
///   variables may be frozen depending on configuration.
/// - **GameOver**: terminal. No further turns happen on this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Uninitialized,
    Initializing,
    Active,
    Submitted,
    GameOver,
}

impl TurnPhase {
    /// `true` while the local player can act.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// `true` once the session reached its terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::GameOver)
    }

    /// The next phase in the strict ordering, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Uninitialized => Some(Self::Initializing),
            Self::Initializing => Some(Self::Active),
            Self::Active => Some(Self::Submitted),
            Self::Submitted => Some(Self::GameOver),
            Self::GameOver => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target) || (self == Self::Active && target == Self::GameOver)
    }
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Initializing => write!(f, "Initializing"),
            Self::Active => write!(f, "Active"),
            Self::Submitted => write!(f, "Submitted"),
            Self::GameOver => write!(f, "GameOver"),
        }
    }
}
