//! The per-tick send driver.

use tracing::{debug, error, info};
use turnforge_history::trim_to_fit;
use turnforge_protocol::{BundleCodec, SendRequest};
use turnforge_tappables::TappableSet;
use turnforge_transport::{TransportError, TurnGateway};

use crate::TurnController;

/// What one [`TurnSender::update`] cycle did.
#[derive(Debug)]
pub enum SendOutcome {
    /// Nothing was dirty; no request was built.
    Idle,
    /// A request went out and the host accepted it. `is_complete` is
    /// the request-level flag: game over, not turn submission.
    Sent { is_complete: bool },
    /// A request went out (or was refused locally) and failed. Dirty
    /// flags are still cleared — the engine never retries on its own.
    Failed(TransportError),
}

/// Owns the gateway and runs the once-per-tick transmission step.
///
/// The driver is a "late update": it must run after all game logic for
/// the tick, so every mutation from the tick is visible to the dirty
/// check and to the snapshot.
pub struct TurnSender<G: TurnGateway> {
    gateway: G,
}

impl<G: TurnGateway> TurnSender<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// One transmission cycle: poll every dirty source, and if any
    /// fired, snapshot the outbound state, clear all flags together,
    /// and hand the request to the gateway.
    ///
    /// The order is snapshot-then-clear: a mutation that lands between
    /// the dirty check and the snapshot is included in this send; one
    /// that lands after the clear fires the next cycle.
    pub async fn update(
        &self,
        controller: &mut TurnController,
        tappables: &mut TappableSet,
    ) -> SendOutcome {
        let tappables_changed = tappables.was_modified();
        let finality_changed = controller.was_finality_modified();
        let should_send = tappables_changed
            || finality_changed
            || controller.was_turn_data_modified()
            || controller.was_storage_modified();
        if !should_send {
            return SendOutcome::Idle;
        }

        // The final reply must not invite another tap.
        tappables.set_game_over(controller.is_final_turn());
        let tappable_config = tappables.config();
        let score = controller.score();
        // The request-level completion flag tells the host the *game*
        // is over; turn submission travels inside the bundle as
        // `isTurnComplete`. A submitted mid-game turn goes out with
        // `is_complete = false`, keeping the exchange open.
        let is_complete = controller.is_final_turn();

        let mut bundle = controller.assemble_bundle().await;
        let bundle_complete = bundle.is_turn_complete;
        let removed = trim_to_fit(&mut bundle, |serialized| {
            self.gateway.fits(&SendRequest {
                score,
                associated_data: serialized.to_string(),
                tappables: tappable_config.clone(),
                is_complete,
            })
        });
        if removed > 0 {
            debug!(removed, "trimmed history to fit the outbound request");
        }
        let request = SendRequest {
            score,
            associated_data: BundleCodec::serialize(&bundle, false),
            tappables: tappable_config,
            is_complete,
        };

        controller.reset_modified();

        match self.gateway.try_send(&request).await {
            Ok(()) => {
                info!(
                    turn_count = bundle.turn_count,
                    is_complete,
                    bundle_complete,
                    tappables = request.tappables.len(),
                    "turn data transmitted"
                );
                controller.on_sent(bundle_complete);
                SendOutcome::Sent { is_complete }
            }
            Err(err) => {
                error!(%err, "failed to transmit turn data");
                SendOutcome::Failed(err)
            }
        }
    }
}
