//! Core types for Turnforge's turn-exchange wire format.
//!
//! Everything in this module travels between the two participants as
//! JSON, embedded in the asynchronous reply message. The field names
//! are part of the wire contract — the host platform and any non-Rust
//! peer parse exactly these shapes — so each struct pins its JSON
//! representation with serde attributes and the tests below verify it.

use serde::{Deserialize, Serialize};

/// A user-defined game variable: string, number, boolean, or a nested
/// array/object of those. `serde_json::Value` is exactly this domain.
pub type Variable = serde_json::Value;

/// A keyed collection of variables for one scope.
pub type VariableMap = serde_json::Map<String, Variable>;

/// Exactly two participants take turns; index parity alternates.
pub const MAX_USERS: usize = 2;

/// Hard cap on the serialized outbound request body (4 MiB).
///
/// The host rejects anything larger server-side; we enforce it locally
/// before any network call and trim turn history to stay under it.
pub const PAYLOAD_SIZE_LIMIT_BYTES: usize = 4 * 1024 * 1024;

/// Sentinel turn count of a bundle that carries no prior turn —
/// either the first-ever turn or the recovery value after corrupt
/// inbound data. The first real turn is `EMPTY_TURN_COUNT + 1 == 0`.
pub const EMPTY_TURN_COUNT: i64 = -1;

/// Returns `true` for object/array variables.
///
/// Composite values are always treated as changed when written:
/// callers may mutate them in place, so identity cannot be compared
/// cheaply and the dirty flag must assume the worst.
pub fn is_composite(value: &Variable) -> bool {
    value.is_object() || value.is_array()
}

// ---------------------------------------------------------------------------
// Turn history
// ---------------------------------------------------------------------------

/// An immutable snapshot of one finished turn.
///
/// Entries are kept oldest-first, contiguous by turn count except
/// where trimming removed a prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnHistoryEntry {
    /// The turn this snapshot belongs to (>= 0 for real turns).
    pub turn_count: i64,
    /// The turn-scope variables as they stood at that turn's end.
    pub user_defined_game_variables: VariableMap,
    /// Whether the turn was explicitly submitted via `end_turn`.
    pub is_turn_complete: bool,
}

// ---------------------------------------------------------------------------
// TurnBundle — the full transmissible unit for one turn
// ---------------------------------------------------------------------------

/// The complete serializable state exchanged between turns.
///
/// One bundle is decoded from the inbound message when a turn starts,
/// mutated in place by game logic through the store APIs for the
/// duration of the turn, and serialized once per transmission cycle.
///
/// The maps and the history carry `#[serde(default)]` so a bundle from
/// an older or partial sender still loads; only `turnCount` is
/// mandatory, and its validity is checked separately by
/// [`sanitize`](crate::BundleCodec::sanitize).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnBundle {
    /// Index of the turn this bundle describes. `-1` is the empty
    /// sentinel ([`EMPTY_TURN_COUNT`]).
    pub turn_count: i64,
    /// Turn-scope variables (reset each turn, seeded from defaults).
    #[serde(default)]
    pub user_defined_game_variables: VariableMap,
    /// Persistent storage for the player at index 0.
    #[serde(default)]
    pub user0_storage: VariableMap,
    /// Persistent storage for the player at index 1.
    #[serde(default)]
    pub user1_storage: VariableMap,
    /// Persistent storage shared by both players.
    #[serde(default)]
    pub global_storage: VariableMap,
    /// Snapshots of past turns, oldest first.
    #[serde(default)]
    pub turn_history: Vec<TurnHistoryEntry>,
    /// Whether this turn was explicitly submitted.
    #[serde(default)]
    pub is_turn_complete: bool,
}

impl TurnBundle {
    /// Creates an empty bundle for the given turn count, optionally
    /// seeding the turn-scope variables with defaults.
    pub fn empty(turn_count: i64, default_variables: Option<VariableMap>) -> Self {
        Self {
            turn_count,
            user_defined_game_variables: default_variables.unwrap_or_default(),
            user0_storage: VariableMap::new(),
            user1_storage: VariableMap::new(),
            global_storage: VariableMap::new(),
            turn_history: Vec::new(),
            is_turn_complete: false,
        }
    }

    /// `true` if this bundle describes a real turn (not the sentinel).
    pub fn has_turn(&self) -> bool {
        self.turn_count >= 0
    }
}

// ---------------------------------------------------------------------------
// Outbound request / inbound response bodies
// ---------------------------------------------------------------------------

/// Screen-space descriptor of one tappable hit-region, as transmitted.
///
/// Positions and sizes are normalized to the screen; rotation is whole
/// degrees. Produced by the tappables pipeline after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TappableConfig {
    /// Unique key, at most 24 characters.
    pub key: String,
    pub normalized_x: f64,
    pub normalized_y: f64,
    pub normalized_width: f64,
    pub normalized_height: f64,
    pub rotation_degrees: i32,
}

impl TappableConfig {
    /// Normalized screen area covered by this region.
    pub fn area(&self) -> f64 {
        self.normalized_width * self.normalized_height
    }
}

/// The body of the outbound send request.
///
/// `associated_data` is the serialized [`TurnBundle`] — JSON inside
/// JSON, exactly as the host API expects it. `score` is omitted from
/// the body entirely when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub associated_data: String,
    pub tappables: Vec<TappableConfig>,
    pub is_complete: bool,
}

impl SendRequest {
    /// Serialized byte length of this request body.
    ///
    /// Used for the local size-limit check. Encoding a `SendRequest`
    /// cannot fail (all fields are plain JSON types), but if it ever
    /// did we report `usize::MAX` so the limit check refuses the send.
    pub fn encoded_len(&self) -> usize {
        serde_json::to_string(self).map(|s| s.len()).unwrap_or(usize::MAX)
    }

    /// `true` if the serialized body stays under the 4 MiB limit.
    pub fn fits_size_limit(&self) -> bool {
        self.encoded_len() < PAYLOAD_SIZE_LIMIT_BYTES
    }
}

/// The body of the inbound fetch response.
///
/// `associated_data` is `None` on the first-ever turn. The display
/// names are host-resolved conveniences; the opaque other-participant
/// resource travels next to this body, not inside it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    #[serde(default)]
    pub associated_data: Option<String>,
    #[serde(default)]
    pub current_user_display_name: Option<String>,
    #[serde(default)]
    pub other_user_display_name: Option<String>,
}

// =========================================================================
// Tests
// =========================================================================
