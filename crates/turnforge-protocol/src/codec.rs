//! Bundle codec: total serialize/deserialize with defensive recovery.
//!
//! The data layer never raises on malformed input. A corrupt or
//! missing inbound bundle is logged and replaced with a fresh empty
//! bundle, which the lifecycle layer treats identically to "no prior
//! turn" — the game simply starts over rather than crashing a session
//! that is already live on the other player's device.
//!
//! The fallible `try_*` functions exist for callers that want the
//! underlying serde error (tests, tooling); the total wrappers are
//! what the turn flow uses.

use tracing::error;

use crate::{ProtocolError, TurnBundle, VariableMap};

/// Serializer/deserializer for [`TurnBundle`] transport strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleCodec;

impl BundleCodec {
    /// Serializes a bundle, optionally pretty-printed (debug overlays).
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    pub fn try_serialize(bundle: &TurnBundle, pretty: bool) -> Result<String, ProtocolError> {
        if pretty {
            serde_json::to_string_pretty(bundle).map_err(ProtocolError::Encode)
        } else {
            serde_json::to_string(bundle).map_err(ProtocolError::Encode)
        }
    }

    /// Parses a transport string back into a bundle.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the input is malformed or
    /// missing the mandatory turn count.
    pub fn try_deserialize(data: &str) -> Result<TurnBundle, ProtocolError> {
        serde_json::from_str(data).map_err(ProtocolError::Decode)
    }

    /// Total serialization: on failure logs the error and returns the
    /// string `"null"`, which every conforming receiver decodes as
    /// "no data".
    pub fn serialize(bundle: &TurnBundle, pretty: bool) -> String {
        match Self::try_serialize(bundle, pretty) {
            Ok(encoded) => encoded,
            Err(err) => {
                error!(%err, "failed to serialize turn bundle");
                "null".to_string()
            }
        }
    }

    /// Total deserialization: `None` on any decoding failure (logged).
    /// Callers must treat `None` identically to "no prior data".
    pub fn deserialize(data: &str) -> Option<TurnBundle> {
        match Self::try_deserialize(data) {
            Ok(bundle) => Some(bundle),
            Err(err) => {
                error!(%err, "failed to deserialize turn bundle");
                None
            }
        }
    }

    /// Turns an optional inbound transport string into a usable bundle.
    ///
    /// Missing data, undecodable data, and a decoded bundle with an
    /// invalid turn count all collapse to the empty sentinel bundle —
    /// each with its own log line so the conditions stay diagnosable.
    pub fn sanitize(data: Option<&str>, defaults: Option<VariableMap>) -> TurnBundle {
        let Some(data) = data else {
            return TurnBundle::empty(crate::EMPTY_TURN_COUNT, defaults);
        };
        let Some(bundle) = Self::deserialize(data) else {
            error!("inbound turn data is invalid, starting new game");
            return TurnBundle::empty(crate::EMPTY_TURN_COUNT, defaults);
        };
        if bundle.turn_count < 0 {
            error!(turn_count = bundle.turn_count, "inbound turn count is invalid, starting new game");
            return TurnBundle::empty(crate::EMPTY_TURN_COUNT, defaults);
        }
        bundle
    }

    /// `true` when the serialized associated-data field is absent or
    /// zero-length. Only meaningful in the host's preview environment,
    /// where it distinguishes "no prior turn" from real data.
    pub fn is_first_turn_in_editor(data: Option<&str>) -> bool {
        match data {
            None => true,
            Some(s) => s.is_empty(),
        }
    }
}
