//! Turn-history retention for Turnforge.
//!
//! History is a bounded ring of past turns' variable snapshots, oldest
//! first. Two independent limits apply:
//!
//! 1. A configured **count cap**, applied when a finished turn is
//!    folded into history ([`trim_to_saved_limit`]).
//! 2. The transport's **payload size limit**: before each send the
//!    bundle is re-serialized and the oldest entries are removed until
//!    the transport's size predicate passes ([`trim_to_fit`]).
//!
//! Both trim from the front, so retained history is always the most
//! recent contiguous suffix of turns.

use tracing::{debug, warn};
use turnforge_protocol::{BundleCodec, TurnBundle, TurnHistoryEntry};

/// Trims `history` to the configured saved-count limit, oldest first.
///
/// `limit` of `None` means uncapped. When `counting_pending` is true
/// the effective cap is `limit - 1`: one slot is reserved for an entry
/// that is about to be appended but isn't in the list yet. Returns the
/// number of entries removed.
pub fn trim_to_saved_limit(
    history: &mut Vec<TurnHistoryEntry>,
    limit: Option<usize>,
    counting_pending: bool,
) -> usize {
    let Some(limit) = limit else {
        return 0;
    };
    let cap = if counting_pending { limit.saturating_sub(1) } else { limit };
    if history.len() <= cap {
        return 0;
    }
    let removed = history.len() - cap;
    history.drain(..removed);
    debug!(removed, cap, "trimmed turn history to saved limit");
    removed
}

/// Trims the bundle's history until the serialized bundle satisfies
/// the transport's size predicate, oldest entries first.
///
/// `fits` is the transport's pure local check (serialized bundle in,
/// verdict out — no I/O). The loop terminates because each iteration
/// removes one entry and stops when the history is empty; at that
/// point the caller decides whether an empty-history payload that
/// still fails is a refused send. Returns the number removed.
pub fn trim_to_fit(bundle: &mut TurnBundle, mut fits: impl FnMut(&str) -> bool) -> usize {
    let mut removed = 0;
    let mut serialized = BundleCodec::serialize(bundle, false);
    while !bundle.turn_history.is_empty() && !fits(&serialized) {
        bundle.turn_history.remove(0);
        serialized = BundleCodec::serialize(bundle, false);
        removed += 1;
    }
    if removed > 0 {
        warn!(removed, "removed turn history entries because request size exceeded limits");
    }
    removed
}

/// `true` when entries are sorted by strictly ascending turn count
/// with no gaps. Trimming from the front preserves this.
pub fn is_contiguous_ascending(history: &[TurnHistoryEntry]) -> bool {
    history
        .windows(2)
        .all(|pair| pair[1].turn_count == pair[0].turn_count + 1)
}
