//! Scoped variable stores with mutation tracking.
//!
//! A [`VariableStore`] is one scope's key/value container (global,
//! per-user, or current-turn). Stores are constructed *pending* —
//! before the inbound turn data has finished loading — and every
//! accessor awaits the one-shot readiness latch before touching the
//! data. There is no timeout at this layer: an unresolved store simply
//! suspends the caller's continuation until the lifecycle controller
//! resolves it (timeouts, if needed, belong to the transport).

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::warn;
use turnforge_protocol::{Variable, VariableMap, is_composite};

/// The four variable namespaces of a turn session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Shared by both players, copied forward every turn.
    Global,
    /// Persistent storage of the player at index 0.
    User0,
    /// Persistent storage of the player at index 1.
    User1,
    /// Variables of the turn in progress; folded into history at turn end.
    CurrentTurn,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "Global"),
            Self::User0 => write!(f, "User0"),
            Self::User1 => write!(f, "User1"),
            Self::CurrentTurn => write!(f, "CurrentTurn"),
        }
    }
}

struct StoreState {
    variables: VariableMap,
    dirty: bool,
}

struct StoreShared {
    scope: Scope,
    ready_rx: watch::Receiver<bool>,
    state: Mutex<StoreState>,
}

/// One scope's key/value container with a dirty flag.
///
/// Cheap to clone — clones share the same underlying state. The dirty
/// flag becomes `true` when a `set` writes a composite value or a
/// primitive that differs from the prior value, and when `clear`
/// empties a non-empty store; it resets only via [`reset_changed`],
/// once per transmission cycle.
///
/// [`reset_changed`]: VariableStore::reset_changed
#[derive(Clone)]
pub struct VariableStore {
    inner: Arc<StoreShared>,
}

/// One-shot handle that resolves a pending store with its initial data.
///
/// Held by the lifecycle controller until the inbound bundle arrives.
/// Dropping it without resolving unblocks waiters with an empty map
/// (session teardown) rather than suspending them forever.
pub struct StoreResolver {
    ready_tx: watch::Sender<bool>,
    inner: Arc<StoreShared>,
}

impl VariableStore {
    /// Creates a pending store and the resolver that will fill it.
    pub fn pending(scope: Scope) -> (Self, StoreResolver) {
        let (ready_tx, ready_rx) = watch::channel(false);
        let inner = Arc::new(StoreShared {
            scope,
            ready_rx,
            state: Mutex::new(StoreState {
                variables: VariableMap::new(),
                dirty: false,
            }),
        });
        let store = Self { inner: inner.clone() };
        (store, StoreResolver { ready_tx, inner })
    }

    /// Creates a store that is readable/writable immediately.
    pub fn resolved(scope: Scope, variables: VariableMap) -> Self {
        let (store, resolver) = Self::pending(scope);
        resolver.resolve(variables);
        store
    }

    /// Which scope this store backs.
    pub fn scope(&self) -> Scope {
        self.inner.scope
    }

    /// `true` once the backing data has been resolved.
    pub fn is_resolved(&self) -> bool {
        *self.inner.ready_rx.borrow()
    }

    /// Suspends until the store is resolved.
    async fn wait_ready(&self) {
        let mut rx = self.inner.ready_rx.clone();
        if rx.wait_for(|ready| *ready).await.is_err() {
            // Resolver dropped without resolving: session teardown.
            warn!(scope = %self.inner.scope, "store resolver dropped, continuing with empty data");
        }
    }

    /// Returns the variable under `key`, awaiting resolution first.
    pub async fn get(&self, key: &str) -> Option<Variable> {
        self.wait_ready().await;
        let state = self.inner.state.lock().expect("store lock");
        state.variables.get(key).cloned()
    }

    /// Writes `key = value`, awaiting resolution first.
    ///
    /// Marks the store dirty if `value` is an object/array (identity of
    /// composites cannot be compared cheaply, so they always count as
    /// changed) or a primitive that differs from the existing value.
    /// Always overwrites.
    pub async fn set(&self, key: &str, value: Variable) {
        self.wait_ready().await;
        let mut state = self.inner.state.lock().expect("store lock");
        if is_composite(&value) || state.variables.get(key) != Some(&value) {
            state.dirty = true;
        }
        state.variables.insert(key.to_string(), value);
    }

    /// Removes `key`, awaiting resolution first. Dirty iff it existed.
    pub async fn remove(&self, key: &str) {
        self.wait_ready().await;
        let mut state = self.inner.state.lock().expect("store lock");
        if state.variables.remove(key).is_some() {
            state.dirty = true;
        }
    }

    /// Snapshot of all variables in this scope.
    ///
    /// An owned copy, so callers cannot mutate behind the
    /// dirty-tracking's back. Writes go through [`set`](Self::set).
    pub async fn all(&self) -> VariableMap {
        self.wait_ready().await;
        let state = self.inner.state.lock().expect("store lock");
        state.variables.clone()
    }

    /// Removes every variable, awaiting resolution first.
    /// Marks the store dirty iff it was non-empty.
    pub async fn clear(&self) {
        self.wait_ready().await;
        let mut state = self.inner.state.lock().expect("store lock");
        if !state.variables.is_empty() {
            state.dirty = true;
        }
        state.variables.clear();
    }

    /// Whether any qualifying mutation happened since the last reset.
    ///
    /// Non-suspending: an unresolved store reports `false` (there is
    /// nothing to transmit before the turn data exists).
    pub fn was_changed(&self) -> bool {
        if !self.is_resolved() {
            return false;
        }
        self.inner.state.lock().expect("store lock").dirty
    }

    /// Acknowledges the dirty flag. Called once per transmission
    /// cycle, after the outbound snapshot has been taken.
    pub fn reset_changed(&self) {
        self.inner.state.lock().expect("store lock").dirty = false;
    }
}

impl StoreResolver {
    /// Resolves the store with its initial data, unblocking every
    /// accessor that is awaiting it. Resolution does not mark the
    /// store dirty — the inbound data is by definition already known
    /// to the other side.
    pub fn resolve(self, variables: VariableMap) {
        {
            let mut state = self.inner.state.lock().expect("store lock");
            state.variables = variables;
        }
        let _ = self.ready_tx.send(true);
    }
}
