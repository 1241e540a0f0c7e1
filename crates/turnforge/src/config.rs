//! Session configuration.

use tracing::warn;
use turnforge_protocol::{Variable, VariableMap};

// ---------------------------------------------------------------------------
// Default turn variables
// ---------------------------------------------------------------------------

/// A typed default value for one turn variable.
///
/// Hosts configure defaults through a typed key/value list rather than
/// raw JSON; richer values belong to game logic at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    Str(String),
    Float(f64),
    Bool(bool),
}

impl From<VariableValue> for Variable {
    fn from(value: VariableValue) -> Self {
        match value {
            VariableValue::Str(s) => Variable::String(s),
            VariableValue::Float(f) => serde_json::json!(f),
            VariableValue::Bool(b) => Variable::Bool(b),
        }
    }
}

/// One configured default turn variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInput {
    pub key: String,
    pub value: VariableValue,
}

impl VariableInput {
    pub fn new(key: impl Into<String>, value: VariableValue) -> Self {
        Self { key: key.into(), value }
    }
}

// ---------------------------------------------------------------------------
// PreviewMode
// ---------------------------------------------------------------------------

/// Offline preview behavior, for environments without a second device.
///
/// Selects which gateway the host should construct; the session itself
/// is agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewMode {
    /// Production: a real remote gateway.
    #[default]
    None,
    /// Play exactly one turn against fabricated inbound data
    /// (`ScriptedGateway` / `NullGateway`).
    SingleTurn,
    /// Play both seats locally, each send becoming the next inbound
    /// turn (`LoopbackGateway`).
    SimulateTurns,
}

// ---------------------------------------------------------------------------
// TurnConfig
// ---------------------------------------------------------------------------

/// Host-provided configuration for one turn session.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Whether a turn must be explicitly submitted via `end_turn`.
    pub require_turn_submission: bool,

    /// Whether turn variables stay writable after submission.
    /// Only meaningful when submission is required.
    pub allow_changing_turn_variables_after_submission: bool,

    /// Total number of turns before the game ends, `None` = unlimited.
    /// Must be at least [`Self::MIN_TURN_LIMIT`]; see [`validated`](Self::validated).
    pub turn_limit: Option<i64>,

    /// Whether finished turns are folded into the transmitted history.
    pub save_turn_history: bool,

    /// Cap on retained history entries, `None` = uncapped
    /// (the payload size limit still applies).
    pub turns_saved_limit: Option<usize>,

    /// Variables every fresh turn starts with.
    pub default_turn_variables: Vec<VariableInput>,

    /// Offline preview behavior.
    pub preview_mode: PreviewMode,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            require_turn_submission: true,
            allow_changing_turn_variables_after_submission: false,
            turn_limit: None,
            save_turn_history: true,
            turns_saved_limit: None,
            default_turn_variables: Vec::new(),
            preview_mode: PreviewMode::None,
        }
    }
}

impl TurnConfig {
    /// Smallest meaningful turn limit: each player gets at least one turn.
    pub const MIN_TURN_LIMIT: i64 = 2;

    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// Called automatically by the session constructor. Rules:
    /// - a `turn_limit` below [`Self::MIN_TURN_LIMIT`] is dropped (unlimited);
    /// - default variables with empty keys are removed.
    pub fn validated(mut self) -> Self {
        if let Some(limit) = self.turn_limit {
            if limit < Self::MIN_TURN_LIMIT {
                warn!(
                    limit,
                    min = Self::MIN_TURN_LIMIT,
                    "turn limit below minimum — disabling the limit"
                );
                self.turn_limit = None;
            }
        }
        self.default_turn_variables.retain(|input| {
            if input.key.is_empty() {
                warn!("default turn variable with empty key — skipping");
                false
            } else {
                true
            }
        });
        self
    }

    /// The effective history cap: disabling `save_turn_history` means
    /// a cap of zero, not "uncapped".
    pub fn history_limit(&self) -> Option<usize> {
        if self.save_turn_history {
            self.turns_saved_limit
        } else {
            Some(0)
        }
    }

    /// Materializes the configured defaults as a variable map.
    /// Later duplicates override earlier ones.
    pub fn default_variables(&self) -> VariableMap {
        let mut map = VariableMap::new();
        for input in &self.default_turn_variables {
            if map.insert(input.key.clone(), input.value.clone().into()).is_some() {
                warn!(key = input.key, "duplicate default turn variable — keeping the later value");
            }
        }
        map
    }
}
