//! The per-game session context.
//!
//! One [`TurnSession`] is constructed when the experience starts and
//! discarded when it ends; it owns the controller, the tappable set,
//! and the send driver, and replaces any notion of process-global
//! state. Game logic talks to the session, and listens on its event
//! channel for turn boundaries and advisories.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use turnforge_protocol::{BundleCodec, Variable, VariableMap};
use turnforge_store::VariableStore;
use turnforge_tappables::TappableSet;
use turnforge_transport::{InboundTurn, ParticipantRef, TurnGateway};

use crate::{SendOutcome, TurnConfig, TurnController, TurnErrorCode, TurnPhase, TurnSender};

/// Events delivered to game logic over the session's channel.
#[derive(Debug)]
pub enum TurnEvent {
    /// The local turn began.
    TurnStart {
        turn_count: i64,
        current_user_index: usize,
        /// The other player's turn variables, exactly as received.
        previous_turn_variables: VariableMap,
        /// Key of the tappable region that opened this session, if any.
        tapped_key: Option<String>,
    },
    /// The local turn was submitted; more turns remain.
    TurnEnd { turn_count: i64 },
    /// The local turn was submitted and it was the game's last.
    GameOver { turn_count: i64 },
    /// An advisory condition; gameplay continues.
    Advisory(TurnErrorCode),
    /// A transmission failed. The engine does not retry; game logic
    /// decides whether to mutate state again (which re-sends) or give up.
    SendFailed { reason: String },
}

/// One game instance's turn-exchange context.
pub struct TurnSession<G: TurnGateway> {
    controller: TurnController,
    tappables: TappableSet,
    sender: TurnSender<G>,
    phase: TurnPhase,
    other_user: Option<ParticipantRef>,
    events_tx: mpsc::UnboundedSender<TurnEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<TurnEvent>>,
}

impl<G: TurnGateway> TurnSession<G> {
    /// Builds a session from a validated config and a gateway. No I/O
    /// happens until [`start`](Self::start).
    pub fn new(config: TurnConfig, gateway: G) -> Self {
        let config = config.validated();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            controller: TurnController::new(config),
            tappables: TappableSet::new(Vec::new()),
            sender: TurnSender::new(gateway),
            phase: TurnPhase::Uninitialized,
            other_user: None,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Yields `Some` exactly once.
    pub fn events(&mut self) -> Option<mpsc::UnboundedReceiver<TurnEvent>> {
        self.events_rx.take()
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// The other participant's opaque host resource, once fetched.
    pub fn other_user(&self) -> Option<&ParticipantRef> {
        self.other_user.as_ref()
    }

    pub fn controller(&self) -> &TurnController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut TurnController {
        &mut self.controller
    }

    pub fn tappables(&self) -> &TappableSet {
        &self.tappables
    }

    pub fn tappables_mut(&mut self) -> &mut TappableSet {
        &mut self.tappables
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Fetches the inbound turn and starts the local one.
    ///
    /// Total: a failed fetch or corrupt payload degrades to a fresh
    /// game, it never aborts the session. Emits
    /// [`TurnEvent::TurnStart`] once initialization completes.
    pub async fn start(&mut self) {
        if self.phase != TurnPhase::Uninitialized {
            warn!(phase = %self.phase, "session already started, ignoring");
            return;
        }
        self.transition(TurnPhase::Initializing);

        let inbound = match self.sender.gateway().fetch_inbound().await {
            Ok(inbound) => inbound,
            Err(err) => {
                warn!(%err, "fetching inbound turn failed, starting a fresh game");
                InboundTurn::default()
            }
        };
        self.other_user = inbound.other_user;

        let bundle = BundleCodec::sanitize(inbound.associated_data.as_deref(), None);
        if self.controller.config().require_turn_submission
            && bundle.has_turn()
            && !bundle.is_turn_complete
        {
            self.emit(TurnEvent::Advisory(TurnErrorCode::IncompleteTurnDataReceived));
        }

        self.controller.initialize(bundle);
        self.transition(TurnPhase::Active);
        self.emit(TurnEvent::TurnStart {
            turn_count: self.controller.turn_count(),
            current_user_index: self.controller.current_user_index(),
            previous_turn_variables: self.controller.previous_turn_variables().clone(),
            tapped_key: inbound.tapped_key,
        });
    }

    /// Submits the local turn and settles the phase: `GameOver` when
    /// this turn is final, `Submitted` when submission is required,
    /// otherwise the session stays `Active`.
    pub fn end_turn(&mut self) {
        if !self.phase.is_active() {
            warn!(phase = %self.phase, "end_turn called outside an active turn, ignoring");
            return;
        }
        self.controller.end_turn();

        let turn_count = self.controller.turn_count();
        if self.controller.is_final_turn() {
            self.tappables.set_game_over(true);
            self.transition(TurnPhase::GameOver);
            self.emit(TurnEvent::GameOver { turn_count });
        } else {
            if self.controller.config().require_turn_submission {
                self.transition(TurnPhase::Submitted);
            }
            self.emit(TurnEvent::TurnEnd { turn_count });
        }
    }

    /// Hook for irreversible host actions (the host captures the reply
    /// message). If the data transmitted so far is incomplete while
    /// submission is required, game logic gets the advisory.
    pub fn notify_capture(&self) {
        if self.controller.was_incomplete_data_sent() {
            self.emit(TurnEvent::Advisory(TurnErrorCode::IncompleteTurnDataSent));
        }
    }

    /// The once-per-tick late-update step: runs the send driver and
    /// surfaces any transmission failure on the event channel.
    pub async fn tick(&mut self) -> SendOutcome {
        let outcome = self.sender.update(&mut self.controller, &mut self.tappables).await;
        if let SendOutcome::Failed(err) = &outcome {
            self.emit(TurnEvent::SendFailed { reason: err.to_string() });
        }
        outcome
    }

    /// Drives [`tick`](Self::tick) on a fixed period until the session
    /// is over and fully flushed. Optional — hosts with their own
    /// frame loop call `tick` directly.
    pub async fn run_driver(&mut self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let outcome = self.tick().await;
            if self.phase.is_terminal() && matches!(outcome, SendOutcome::Idle) {
                debug!("session terminal and flushed, driver stopping");
                return;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Game-logic conveniences (delegating to the controller)
    // -----------------------------------------------------------------------

    pub async fn variable(&self, key: &str) -> Option<Variable> {
        self.controller.variable(key).await
    }

    pub async fn set_variable(&self, key: &str, value: Variable) {
        self.controller.set_variable(key, value).await;
    }

    pub fn global_storage(&self) -> VariableStore {
        self.controller.global_storage()
    }

    pub fn current_user_storage(&self) -> VariableStore {
        self.controller.current_user_storage()
    }

    pub fn other_user_storage(&self) -> VariableStore {
        self.controller.other_user_storage()
    }

    pub fn previous_turn_variable(&self, key: &str) -> Option<&Variable> {
        self.controller.previous_turn_variable(key)
    }

    // -----------------------------------------------------------------------

    fn transition(&mut self, target: TurnPhase) {
        if self.phase.can_transition_to(target) {
            debug!(from = %self.phase, to = %target, "phase transition");
            self.phase = target;
        } else {
            warn!(from = %self.phase, to = %target, "invalid phase transition, ignoring");
        }
    }

    fn emit(&self, event: TurnEvent) {
        if self.events_tx.send(event).is_err() {
            // Receiver dropped: game logic stopped listening.
            info!("turn event dropped, no listener");
        }
    }
}
