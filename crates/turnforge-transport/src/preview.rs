//! Preview gateways: stand-ins for the remote API when there is no
//! second device — editor single-turn runs and full local simulations.

use std::sync::Mutex;

use tracing::{info, warn};
use turnforge_protocol::{BundleCodec, SendRequest, TurnBundle, TurnHistoryEntry, VariableMap};

use crate::{InboundTurn, TransportError, TurnGateway};

// ---------------------------------------------------------------------------
// NullGateway
// ---------------------------------------------------------------------------

/// No inbound data, sends acknowledged and dropped.
///
/// Single-turn preview: the game always starts on turn zero and
/// nothing leaves the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGateway;

impl TurnGateway for NullGateway {
    async fn fetch_inbound(&self) -> Result<InboundTurn, TransportError> {
        Ok(InboundTurn::default())
    }

    async fn try_send(&self, _request: &SendRequest) -> Result<(), TransportError> {
        info!("send skipped: preview gateway");
        Ok(())
    }

    fn fits(&self, _request: &SendRequest) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// ScriptedGateway
// ---------------------------------------------------------------------------

/// Fabricates one inbound turn from preview inputs, so a session can
/// start mid-game without a real prior turn.
///
/// Sends are acknowledged and dropped, like [`NullGateway`].
#[derive(Debug, Clone)]
pub struct ScriptedGateway {
    bundle: TurnBundle,
    tapped_key: Option<String>,
}

impl ScriptedGateway {
    /// Builds the gateway for a session that should start as turn
    /// `turn_count`. The fabricated inbound bundle is the *previous*
    /// turn, so its own count is `turn_count - 1`.
    pub fn new(
        turn_count: i64,
        is_turn_complete: bool,
        variables: VariableMap,
        turn_history: Vec<TurnHistoryEntry>,
    ) -> Self {
        let mut bundle = TurnBundle::empty(turn_count - 1, Some(variables));
        bundle.is_turn_complete = is_turn_complete;
        bundle.turn_history = turn_history;
        Self { bundle, tapped_key: None }
    }

    pub fn with_tapped_key(mut self, key: Option<String>) -> Self {
        self.tapped_key = key;
        self
    }

    /// Assigns turn counts to scripted history snapshots.
    ///
    /// `snapshots` are ordered oldest to newest; at most `limit` of the
    /// newest are kept, and counts are assigned so the newest snapshot
    /// lands two turns behind `turn_count` (one behind the fabricated
    /// inbound bundle). Snapshots that would get a negative count are
    /// dropped with a warning.
    pub fn synthesize_history(
        turn_count: i64,
        limit: Option<usize>,
        snapshots: Vec<(VariableMap, bool)>,
    ) -> Vec<TurnHistoryEntry> {
        let mut snapshots = snapshots;
        if let Some(limit) = limit {
            if snapshots.len() > limit {
                snapshots.drain(..snapshots.len() - limit);
            }
        }
        let len = snapshots.len() as i64;
        snapshots
            .into_iter()
            .enumerate()
            .filter_map(|(index, (variables, is_turn_complete))| {
                let entry_count = turn_count - 1 - len + index as i64;
                if entry_count < 0 {
                    warn!(index, "dropping scripted history snapshot with negative turn count");
                    return None;
                }
                Some(TurnHistoryEntry {
                    turn_count: entry_count,
                    user_defined_game_variables: variables,
                    is_turn_complete,
                })
            })
            .collect()
    }
}

impl TurnGateway for ScriptedGateway {
    async fn fetch_inbound(&self) -> Result<InboundTurn, TransportError> {
        let associated_data = if self.bundle.has_turn() {
            Some(BundleCodec::serialize(&self.bundle, false))
        } else {
            // A scripted start at turn zero is just a fresh game.
            None
        };
        Ok(InboundTurn {
            associated_data,
            other_user: None,
            tapped_key: self.tapped_key.clone(),
        })
    }

    async fn try_send(&self, _request: &SendRequest) -> Result<(), TransportError> {
        info!("send skipped: preview gateway");
        Ok(())
    }

    fn fits(&self, _request: &SendRequest) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// LoopbackGateway
// ---------------------------------------------------------------------------

/// Stores each sent request and replays it as the next inbound turn.
///
/// One process can drive both seats: start a session, play the turn,
/// send, then start the next session against the same gateway. The
/// size limit is enforced like the real gateway's, so simulations see
/// trimming behavior too.
#[derive(Debug, Default)]
pub struct LoopbackGateway {
    last_sent: Mutex<Option<SendRequest>>,
    tapped_key: Mutex<Option<String>>,
}

impl LoopbackGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tapped key reported by the next fetch, as if the next
    /// player opened the session from that region.
    pub fn set_tapped_key(&self, key: Option<String>) {
        *self.tapped_key.lock().unwrap() = key;
    }

    /// The most recently sent request, if any.
    pub fn last_sent(&self) -> Option<SendRequest> {
        self.last_sent.lock().unwrap().clone()
    }
}

impl TurnGateway for LoopbackGateway {
    async fn fetch_inbound(&self) -> Result<InboundTurn, TransportError> {
        let stored = self.last_sent.lock().unwrap().clone();
        let associated_data = stored
            .map(|request| request.associated_data)
            .filter(|data| !data.is_empty());
        Ok(InboundTurn {
            associated_data,
            other_user: None,
            tapped_key: self.tapped_key.lock().unwrap().clone(),
        })
    }

    async fn try_send(&self, request: &SendRequest) -> Result<(), TransportError> {
        if !self.fits(request) {
            return Err(TransportError::PayloadTooLarge);
        }
        *self.last_sent.lock().unwrap() = Some(request.clone());
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, serde_json::Value)]) -> VariableMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn request(data: &str) -> SendRequest {
        SendRequest {
            score: None,
            associated_data: data.to_string(),
            tappables: vec![],
            is_complete: true,
        }
    }

    #[tokio::test]
    async fn test_null_gateway_has_no_inbound_data() {
        let inbound = NullGateway.fetch_inbound().await.unwrap();
        assert_eq!(inbound, InboundTurn::default());
        assert!(NullGateway.try_send(&request("{}")).await.is_ok());
    }

    #[tokio::test]
    async fn test_scripted_gateway_fabricates_previous_turn() {
        let gateway = ScriptedGateway::new(5, true, vars(&[("word", json!("crate"))]), vec![]);
        let inbound = gateway.fetch_inbound().await.unwrap();
        let bundle = BundleCodec::deserialize(&inbound.associated_data.unwrap()).unwrap();
        assert_eq!(bundle.turn_count, 4);
        assert!(bundle.is_turn_complete);
        assert_eq!(bundle.user_defined_game_variables["word"], json!("crate"));
    }

    #[tokio::test]
    async fn test_scripted_gateway_turn_zero_means_no_data() {
        let gateway = ScriptedGateway::new(0, false, VariableMap::new(), vec![]);
        let inbound = gateway.fetch_inbound().await.unwrap();
        assert!(inbound.associated_data.is_none());
    }

    #[test]
    fn test_synthesize_history_counts_end_behind_current_turn() {
        let snapshots = vec![
            (vars(&[("word", json!("a"))]), true),
            (vars(&[("word", json!("b"))]), true),
            (vars(&[("word", json!("c"))]), true),
        ];
        let history = ScriptedGateway::synthesize_history(6, None, snapshots);
        let counts: Vec<i64> = history.iter().map(|e| e.turn_count).collect();
        assert_eq!(counts, [2, 3, 4]);
    }

    #[test]
    fn test_synthesize_history_drops_negative_counts() {
        let snapshots = vec![
            (vars(&[("word", json!("too-old"))]), true),
            (vars(&[("word", json!("kept"))]), true),
        ];
        let history = ScriptedGateway::synthesize_history(2, None, snapshots);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].turn_count, 0);
        assert_eq!(history[0].user_defined_game_variables["word"], json!("kept"));
    }

    #[test]
    fn test_synthesize_history_keeps_newest_within_limit() {
        let snapshots = vec![
            (vars(&[("word", json!("oldest"))]), true),
            (vars(&[("word", json!("mid"))]), true),
            (vars(&[("word", json!("newest"))]), false),
        ];
        let history = ScriptedGateway::synthesize_history(10, Some(2), snapshots);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].user_defined_game_variables["word"], json!("mid"));
        assert_eq!(history[1].user_defined_game_variables["word"], json!("newest"));
        assert!(!history[1].is_turn_complete);
    }

    #[tokio::test]
    async fn test_loopback_replays_sent_request() {
        let gateway = LoopbackGateway::new();
        assert!(gateway.fetch_inbound().await.unwrap().associated_data.is_none());

        gateway.try_send(&request(r#"{"turnCount": 0}"#)).await.unwrap();
        let inbound = gateway.fetch_inbound().await.unwrap();
        assert_eq!(inbound.associated_data.as_deref(), Some(r#"{"turnCount": 0}"#));
    }

    #[tokio::test]
    async fn test_loopback_treats_empty_data_as_missing() {
        let gateway = LoopbackGateway::new();
        gateway.try_send(&request("")).await.unwrap();
        assert!(gateway.fetch_inbound().await.unwrap().associated_data.is_none());
    }

    #[tokio::test]
    async fn test_loopback_enforces_size_limit() {
        let gateway = LoopbackGateway::new();
        let huge = request(&"x".repeat(turnforge_protocol::PAYLOAD_SIZE_LIMIT_BYTES));
        assert!(matches!(
            gateway.try_send(&huge).await,
            Err(TransportError::PayloadTooLarge)
        ));
        assert!(gateway.last_sent().is_none());
    }

    #[tokio::test]
    async fn test_loopback_tapped_key_is_reported_once_set() {
        let gateway = LoopbackGateway::new();
        gateway.set_tapped_key(Some("attack".into()));
        let inbound = gateway.fetch_inbound().await.unwrap();
        assert_eq!(inbound.tapped_key.as_deref(), Some("attack"));
    }
}
