//! Scoped variable stores and change detection for Turnforge.
//!
//! # Key types
//!
//! - [`VariableStore`] — one scope's key/value container with a dirty
//!   flag and pending-until-resolved accessors
//! - [`StoreResolver`] — the one-shot latch the lifecycle controller
//!   uses to unblock a store once inbound data arrives
//! - [`Scope`] — the four variable namespaces
//! - [`Watcher`] — polled change detection for derived signals

mod store;
mod watcher;

pub use store::{Scope, StoreResolver, VariableStore};
pub use watcher::Watcher;
