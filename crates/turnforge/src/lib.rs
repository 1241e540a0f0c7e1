//! Turnforge — an asynchronous turn-exchange engine for two-player,
//! store-and-forward games.
//!
//! Players are never online simultaneously: each turn travels as a
//! self-contained JSON bundle inside the host platform's reply
//! message, carrying the turn variables, both players' persistent
//! storage, a bounded history of past turns, and the submission flag.
//!
//! # Architecture
//!
//! - [`turnforge_protocol`] — wire types, codec, size limits
//! - [`turnforge_store`] — scoped variable stores with dirty tracking
//! - [`turnforge_tappables`] — interactive hit-region validation
//! - [`turnforge_history`] — history retention and trimming
//! - [`turnforge_transport`] — the gateway boundary to the host
//! - this crate — configuration, lifecycle, and the session facade
//!
//! # Typical flow
//!
//! ```ignore
//! let mut session = TurnSession::new(TurnConfig::default(), gateway);
//! let mut events = session.events().unwrap();
//! session.start().await;           // fetch + initialize, emits TurnStart
//! session.set_variable("selectedWarrior", json!("Rock")).await;
//! session.end_turn();              // emits TurnEnd or GameOver
//! session.tick().await;            // transmit whatever changed
//! ```

mod config;
mod controller;
mod error;
mod phase;
mod sender;
mod session;

pub use config::{PreviewMode, TurnConfig, VariableInput, VariableValue};
pub use controller::TurnController;
pub use error::TurnErrorCode;
pub use phase::TurnPhase;
pub use sender::{SendOutcome, TurnSender};
pub use session::{TurnEvent, TurnSession};

// The building blocks, re-exported for game code.
pub use turnforge_protocol::{
    BundleCodec, PAYLOAD_SIZE_LIMIT_BYTES, SendRequest, TappableConfig, TurnBundle,
    TurnHistoryEntry, Variable, VariableMap,
};
pub use turnforge_store::{Scope, VariableStore};
pub use turnforge_tappables::{FixedRect, ScreenQuery, ScreenRect, TappableRegion, TappableSet};
pub use turnforge_transport::{
    InboundTurn, LoopbackGateway, NullGateway, ParticipantRef, RemoteApi, RemoteGateway,
    ScriptedGateway, TransportError, TurnGateway,
};
