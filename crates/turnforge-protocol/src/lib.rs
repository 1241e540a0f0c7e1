//! Wire format for Turnforge's asynchronous turn exchange.
//!
//! This crate defines the data that travels between the two
//! participants inside an asynchronous reply message:
//!
//! - **Types** ([`TurnBundle`], [`TurnHistoryEntry`], [`SendRequest`],
//!   [`TappableConfig`], …) — the JSON structures of the wire contract.
//! - **Codec** ([`BundleCodec`]) — total serialize/deserialize with
//!   defensive recovery to an empty bundle on malformed input.
//! - **Errors** ([`ProtocolError`]) — the underlying causes, for
//!   callers that need more than the recovered value.
//!
//! # Architecture
//!
//! The protocol layer sits below everything else. It knows nothing
//! about turns in progress, dirty flags, or transports — only how the
//! exchanged state is shaped and encoded.
//!
//! ```text
//! Transport (request bodies) → Protocol (TurnBundle) → Lifecycle (turn state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::BundleCodec;
pub use error::ProtocolError;
pub use types::{
    EMPTY_TURN_COUNT, FetchResponse, MAX_USERS, PAYLOAD_SIZE_LIMIT_BYTES, SendRequest,
    TappableConfig, TurnBundle, TurnHistoryEntry, Variable, VariableMap, is_composite,
};
