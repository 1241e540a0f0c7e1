//! Transport gateway for Turnforge.
//!
//! The turn flow talks to the outside world through exactly one seam,
//! the [`TurnGateway`] trait: fetch the inbound turn once at startup,
//! push the outbound request whenever local state changed. Everything
//! else (endpoints, status codes, preview stand-ins) lives behind it.
//!
//! Implementations:
//!
//! - [`RemoteGateway`] — the real thing, over an injected [`RemoteApi`]
//! - [`NullGateway`] — no data in, sends swallowed (single-turn preview)
//! - [`ScriptedGateway`] — fabricated inbound turn for preview runs
//! - [`LoopbackGateway`] — replays the last send as the next inbound
//!   turn, letting one process play both seats

#![allow(async_fn_in_trait)]

mod error;
mod preview;
mod remote;

pub use error::{RemoteStatus, TransportError};
pub use preview::{LoopbackGateway, NullGateway, ScriptedGateway};
pub use remote::{ApiRequest, ApiResponse, RemoteApi, RemoteGateway};

use turnforge_protocol::SendRequest;

/// Opaque handle to the other participant, as issued by the host.
///
/// The turn flow never inspects it; it is carried through so game code
/// can hand it back to host APIs (display names, avatars).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRef(pub String);

/// Everything the gateway learned from the inbound fetch.
///
/// All fields are optional: on the first-ever turn there is no data
/// and no other participant yet, and `tapped_key` is only present when
/// the session was opened by tapping a named hit-region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundTurn {
    /// The serialized turn bundle from the previous turn, if any.
    pub associated_data: Option<String>,
    /// The other participant, once known.
    pub other_user: Option<ParticipantRef>,
    /// Key of the tappable region that opened this session.
    pub tapped_key: Option<String>,
}

/// The collaborator boundary between the turn flow and the host.
pub trait TurnGateway: Send + Sync + 'static {
    /// Fetches the inbound turn. Called once, when the session starts.
    ///
    /// Missing prior data is not an error: implementations resolve it
    /// as a default [`InboundTurn`].
    async fn fetch_inbound(&self) -> Result<InboundTurn, TransportError>;

    /// Attempts to transmit one outbound request.
    ///
    /// # Errors
    /// [`TransportError::PayloadTooLarge`] when the body fails the
    /// local size check, [`TransportError::Remote`] when the host
    /// refuses the call.
    async fn try_send(&self, request: &SendRequest) -> Result<(), TransportError>;

    /// Pure local check: would this request pass the size limit?
    ///
    /// The send driver uses this to trim turn history before calling
    /// [`try_send`](Self::try_send); no I/O happens here.
    fn fits(&self, request: &SendRequest) -> bool {
        request.fits_size_limit()
    }
}

/// Gateways are commonly shared (the loopback gateway outlives each
/// per-turn session), so `Arc<G>` forwards to `G`.
impl<G: TurnGateway> TurnGateway for std::sync::Arc<G> {
    async fn fetch_inbound(&self) -> Result<InboundTurn, TransportError> {
        (**self).fetch_inbound().await
    }

    async fn try_send(&self, request: &SendRequest) -> Result<(), TransportError> {
        (**self).try_send(request).await
    }

    fn fits(&self, request: &SendRequest) -> bool {
        (**self).fits(request)
    }
}
