//! The turn lifecycle controller: owns the working turn state.
//!
//! One controller lives for exactly one local turn. It starts with all
//! four variable stores pending, absorbs the inbound bundle in
//! [`initialize`](TurnController::initialize) (folding the other
//! player's finished turn into history and copying storages forward),
//! then serves game logic for the rest of the turn and assembles the
//! outbound bundle for every transmission cycle.

use tracing::{debug, info, warn};
use turnforge_history::trim_to_saved_limit;
use turnforge_protocol::{
    EMPTY_TURN_COUNT, MAX_USERS, TurnBundle, TurnHistoryEntry, Variable, VariableMap,
};
use turnforge_store::{Scope, StoreResolver, VariableStore, Watcher};

use crate::TurnConfig;

struct PendingResolvers {
    current_turn: StoreResolver,
    global: StoreResolver,
    users: [StoreResolver; MAX_USERS],
}

pub struct TurnController {
    config: TurnConfig,
    turn_count: i64,
    is_turn_complete: bool,
    is_final: bool,
    score: Option<f64>,
    turn_history: Vec<TurnHistoryEntry>,
    previous_turn_variables: VariableMap,
    current_turn: VariableStore,
    global: VariableStore,
    users: [VariableStore; MAX_USERS],
    resolvers: Option<PendingResolvers>,
    /// Covers the non-store parts of the outbound payload: a fresh
    /// turn, a submission, a score change.
    turn_data_dirty: bool,
    finality_watcher: Watcher<bool>,
    /// Whether any transmitted bundle carried `is_turn_complete`.
    /// False from construction: until a complete bundle has gone out,
    /// everything the other player could see is incomplete.
    complete_data_sent: bool,
}

impl TurnController {
    /// Creates a controller with all stores pending. Nothing is
    /// readable until [`initialize`](Self::initialize) runs.
    pub fn new(config: TurnConfig) -> Self {
        let (current_turn, current_turn_resolver) = VariableStore::pending(Scope::CurrentTurn);
        let (global, global_resolver) = VariableStore::pending(Scope::Global);
        let (user0, user0_resolver) = VariableStore::pending(Scope::User0);
        let (user1, user1_resolver) = VariableStore::pending(Scope::User1);
        Self {
            config,
            turn_count: EMPTY_TURN_COUNT,
            is_turn_complete: false,
            is_final: false,
            score: None,
            turn_history: Vec::new(),
            previous_turn_variables: VariableMap::new(),
            current_turn,
            global,
            users: [user0, user1],
            resolvers: Some(PendingResolvers {
                current_turn: current_turn_resolver,
                global: global_resolver,
                users: [user0_resolver, user1_resolver],
            }),
            turn_data_dirty: false,
            finality_watcher: Watcher::new(),
            complete_data_sent: false,
        }
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    /// Absorbs the (already sanitized) inbound bundle and starts the
    /// local turn.
    ///
    /// Computes the new turn count, folds the just-finished turn into
    /// history (turn 0 starts with the history as received — there is
    /// no finished turn to fold), applies the configured history cap,
    /// copies the three storages forward verbatim, seeds the
    /// current-turn scope with the configured defaults, and resolves
    /// every store latch. The fresh turn is marked dirty so it always
    /// announces its existence on the next transmission cycle.
    pub fn initialize(&mut self, bundle: TurnBundle) {
        let Some(resolvers) = self.resolvers.take() else {
            warn!("controller is already initialized, ignoring inbound bundle");
            return;
        };

        let new_turn_count = bundle.turn_count + 1;
        let mut history = bundle.turn_history;
        if new_turn_count > 0 {
            history.push(TurnHistoryEntry {
                turn_count: bundle.turn_count,
                user_defined_game_variables: bundle.user_defined_game_variables.clone(),
                is_turn_complete: bundle.is_turn_complete,
            });
            trim_to_saved_limit(&mut history, self.config.history_limit(), false);
        }

        self.turn_count = new_turn_count;
        self.turn_history = history;
        self.previous_turn_variables = bundle.user_defined_game_variables;

        resolvers.current_turn.resolve(self.config.default_variables());
        resolvers.global.resolve(bundle.global_storage);
        let [user0, user1] = resolvers.users;
        user0.resolve(bundle.user0_storage);
        user1.resolve(bundle.user1_storage);

        self.turn_data_dirty = true;
        info!(
            turn_count = self.turn_count,
            user_index = self.current_user_index(),
            history_len = self.turn_history.len(),
            "turn initialized"
        );
    }

    /// `true` once the inbound bundle has been absorbed.
    pub fn is_initialized(&self) -> bool {
        self.resolvers.is_none()
    }

    pub fn config(&self) -> &TurnConfig {
        &self.config
    }

    /// The turn index of the turn in progress.
    pub fn turn_count(&self) -> i64 {
        self.turn_count
    }

    /// Which of the two participants plays this turn: `turn_count % 2`.
    pub fn current_user_index(&self) -> usize {
        if self.turn_count <= 0 {
            0
        } else {
            (self.turn_count % 2) as usize
        }
    }

    // -----------------------------------------------------------------------
    // Finality
    // -----------------------------------------------------------------------

    /// Whether a turn at `turn_count` would be the game's last.
    ///
    /// True when a turn limit is configured and `turn_count + 1 >= limit`,
    /// or when the terminal flag was set explicitly — an OR, both
    /// conditions can independently end the game. The limit fires one
    /// index early on purpose: a limit of 2 plays turns 0 and 1, and
    /// turn 1 is final.
    pub fn is_final_turn_for_count(&self, turn_count: i64) -> bool {
        let limit_reached = self
            .config
            .turn_limit
            .is_some_and(|limit| turn_count + 1 >= limit);
        limit_reached || self.is_final
    }

    /// Whether the turn in progress is the game's last.
    pub fn is_final_turn(&self) -> bool {
        self.is_final_turn_for_count(self.turn_count)
    }

    /// Forces (or lifts) game-over regardless of the turn limit.
    pub fn set_is_final_turn(&mut self, is_final: bool) {
        self.is_final = is_final;
    }

    // -----------------------------------------------------------------------
    // Turn variables (CurrentTurn scope)
    // -----------------------------------------------------------------------

    /// Whether turn variables are currently writable: post-submission
    /// edits are allowed, or the turn is not submitted yet, or
    /// submission is not required at all (the default — then variables
    /// are always writable).
    pub fn can_change_variables(&self) -> bool {
        self.config.allow_changing_turn_variables_after_submission
            || !self.is_turn_complete
            || !self.config.require_turn_submission
    }

    pub async fn variable(&self, key: &str) -> Option<Variable> {
        self.current_turn.get(key).await
    }

    pub async fn variables(&self) -> VariableMap {
        self.current_turn.all().await
    }

    /// Writes one turn variable. Rejected (logged, value unchanged)
    /// once the turn is submitted and post-submission edits are off.
    pub async fn set_variable(&self, key: &str, value: Variable) {
        if !self.can_change_variables() {
            warn!(key, "cannot change turn variables after the turn was submitted");
            return;
        }
        self.current_turn.set(key, value).await;
    }

    /// Clears the turn variables, gated like [`set_variable`](Self::set_variable).
    pub async fn clear_variables(&self) {
        if !self.can_change_variables() {
            warn!("cannot change turn variables after the turn was submitted");
            return;
        }
        self.current_turn.clear().await;
    }

    // -----------------------------------------------------------------------
    // Submission, score
    // -----------------------------------------------------------------------

    /// Marks the turn complete. Only meaningful when submission is
    /// required; otherwise every transmitted turn counts as complete
    /// already and this is a no-op.
    pub fn end_turn(&mut self) {
        if !self.config.require_turn_submission {
            debug!("turn submission is not required, end_turn changes nothing");
            return;
        }
        self.is_turn_complete = true;
        self.turn_data_dirty = true;
    }

    pub fn is_turn_complete(&self) -> bool {
        self.is_turn_complete
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// Sets the score submitted alongside the next send.
    pub fn set_score(&mut self, score: f64) {
        if self.score != Some(score) {
            self.score = Some(score);
            self.turn_data_dirty = true;
        }
    }

    // -----------------------------------------------------------------------
    // Storage scopes
    // -----------------------------------------------------------------------

    /// Handle to the shared storage scope.
    pub fn global_storage(&self) -> VariableStore {
        self.global.clone()
    }

    /// Handle to one player's storage scope, `None` for an index out
    /// of range.
    pub fn user_storage(&self, index: usize) -> Option<VariableStore> {
        if index >= MAX_USERS {
            warn!(index, max = MAX_USERS, "user storage index out of range");
            return None;
        }
        Some(self.users[index].clone())
    }

    /// Storage of the player whose turn this is.
    pub fn current_user_storage(&self) -> VariableStore {
        self.users[self.current_user_index()].clone()
    }

    /// Storage of the player waiting for this turn to finish.
    pub fn other_user_storage(&self) -> VariableStore {
        self.users[1 - self.current_user_index()].clone()
    }

    // -----------------------------------------------------------------------
    // History and previous-turn queries
    // -----------------------------------------------------------------------

    /// Retained history, oldest first.
    pub fn history(&self) -> &[TurnHistoryEntry] {
        &self.turn_history
    }

    /// The retained entry for a specific turn index, if not trimmed.
    pub fn turn(&self, turn_count: i64) -> Option<&TurnHistoryEntry> {
        self.turn_history.iter().find(|e| e.turn_count == turn_count)
    }

    /// The most recently finished turn, if retained.
    pub fn previous_turn(&self) -> Option<&TurnHistoryEntry> {
        self.turn_history.last()
    }

    /// The inbound turn's variables, exactly as received. Available
    /// even when history saving is off.
    pub fn previous_turn_variables(&self) -> &VariableMap {
        &self.previous_turn_variables
    }

    pub fn previous_turn_variable(&self, key: &str) -> Option<&Variable> {
        self.previous_turn_variables.get(key)
    }

    // -----------------------------------------------------------------------
    // Transmission support
    // -----------------------------------------------------------------------

    /// Whether the turn payload (variables, submission, score) changed
    /// since the last transmission cycle.
    pub fn was_turn_data_modified(&self) -> bool {
        self.turn_data_dirty || self.current_turn.was_changed()
    }

    /// Whether any storage scope changed since the last cycle.
    pub fn was_storage_modified(&self) -> bool {
        self.global.was_changed() || self.users.iter().any(VariableStore::was_changed)
    }

    /// Whether `is_final_turn()` flipped since the last poll. The
    /// first poll after initialization counts as a flip.
    pub fn was_finality_modified(&mut self) -> bool {
        if !self.is_initialized() {
            return false;
        }
        self.finality_watcher.update(Some(self.is_final_turn()))
    }

    /// Clears every dirty flag together. Call after the outbound
    /// snapshot is taken, never before (snapshot-then-clear).
    pub fn reset_modified(&mut self) {
        self.turn_data_dirty = false;
        self.current_turn.reset_changed();
        self.global.reset_changed();
        for store in &self.users {
            store.reset_changed();
        }
    }

    /// Snapshot of the full outbound bundle for one transmission.
    pub async fn assemble_bundle(&self) -> TurnBundle {
        TurnBundle {
            turn_count: self.turn_count,
            user_defined_game_variables: self.current_turn.all().await,
            user0_storage: self.users[0].all().await,
            user1_storage: self.users[1].all().await,
            global_storage: self.global.all().await,
            turn_history: self.turn_history.clone(),
            is_turn_complete: self.is_turn_complete,
        }
    }

    /// Records the bundle-completion flag of a successful send. A
    /// complete bundle settles the condition for good; later sends
    /// cannot make it incomplete again.
    pub fn on_sent(&mut self, bundle_complete: bool) {
        if bundle_complete {
            self.complete_data_sent = true;
        }
    }

    /// Whether submission is required and no complete bundle has been
    /// transmitted yet — true from construction, so a capture before
    /// the first complete send already warrants the advisory.
    pub fn was_incomplete_data_sent(&self) -> bool {
        self.config.require_turn_submission && !self.complete_data_sent
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, Variable)]) -> VariableMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn initialized(config: TurnConfig, bundle: TurnBundle) -> TurnController {
        let mut controller = TurnController::new(config.validated());
        controller.initialize(bundle);
        controller
    }

    fn fresh(config: TurnConfig) -> TurnController {
        initialized(config, TurnBundle::empty(EMPTY_TURN_COUNT, None))
    }

    #[tokio::test]
    async fn test_first_turn_starts_at_zero_with_empty_state() {
        let controller = fresh(TurnConfig::default());
        assert_eq!(controller.turn_count(), 0);
        assert_eq!(controller.current_user_index(), 0);
        assert!(controller.history().is_empty());
        assert!(controller.global_storage().all().await.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_folds_finished_turn_into_history() {
        let mut inbound = TurnBundle::empty(4, None);
        inbound.user_defined_game_variables = vars(&[("selectedWarrior", json!("Rock"))]);
        inbound.is_turn_complete = true;
        inbound.turn_history = vec![TurnHistoryEntry {
            turn_count: 3,
            user_defined_game_variables: VariableMap::new(),
            is_turn_complete: true,
        }];

        let controller = initialized(TurnConfig::default(), inbound);
        assert_eq!(controller.turn_count(), 5);
        let counts: Vec<i64> = controller.history().iter().map(|e| e.turn_count).collect();
        assert_eq!(counts, [3, 4]);
        let folded = controller.turn(4).unwrap();
        assert_eq!(folded.user_defined_game_variables["selectedWarrior"], json!("Rock"));
        assert!(folded.is_turn_complete);
    }

    #[tokio::test]
    async fn test_initialize_applies_history_cap() {
        let mut inbound = TurnBundle::empty(9, None);
        inbound.turn_history = (5..9)
            .map(|n| TurnHistoryEntry {
                turn_count: n,
                user_defined_game_variables: VariableMap::new(),
                is_turn_complete: true,
            })
            .collect();

        let config = TurnConfig { turns_saved_limit: Some(3), ..Default::default() };
        let controller = initialized(config, inbound);
        let counts: Vec<i64> = controller.history().iter().map(|e| e.turn_count).collect();
        assert_eq!(counts, [7, 8, 9]);
    }

    #[tokio::test]
    async fn test_disabled_history_keeps_nothing() {
        let mut inbound = TurnBundle::empty(2, None);
        inbound.turn_history = vec![TurnHistoryEntry {
            turn_count: 1,
            user_defined_game_variables: VariableMap::new(),
            is_turn_complete: true,
        }];
        let config = TurnConfig { save_turn_history: false, ..Default::default() };
        let controller = initialized(config, inbound);
        assert!(controller.history().is_empty());
        // The inbound variables stay queryable regardless.
        assert_eq!(controller.previous_turn_variables().len(), 0);
    }

    #[tokio::test]
    async fn test_initialize_copies_storages_forward() {
        let mut inbound = TurnBundle::empty(0, None);
        inbound.global_storage = vars(&[("score0", json!(1)), ("score1", json!(0))]);
        inbound.user0_storage = vars(&[("name", json!("alice"))]);

        let controller = initialized(TurnConfig::default(), inbound);
        assert_eq!(controller.global_storage().get("score0").await, Some(json!(1)));
        assert_eq!(
            controller.user_storage(0).unwrap().get("name").await,
            Some(json!("alice"))
        );
        assert!(controller.user_storage(1).unwrap().all().await.is_empty());
        // Copying forward is not a local change.
        assert!(!controller.was_storage_modified());
    }

    #[tokio::test]
    async fn test_initialize_seeds_default_turn_variables() {
        let config = TurnConfig {
            default_turn_variables: vec![crate::VariableInput::new(
                "difficulty",
                crate::VariableValue::Str("hard".into()),
            )],
            ..Default::default()
        };
        let controller = fresh(config);
        assert_eq!(controller.variable("difficulty").await, Some(json!("hard")));
    }

    #[tokio::test]
    async fn test_second_initialize_is_ignored() {
        let mut controller = fresh(TurnConfig::default());
        controller.initialize(TurnBundle::empty(7, None));
        assert_eq!(controller.turn_count(), 0);
    }

    #[tokio::test]
    async fn test_user_index_parity_alternates() {
        for turn in 0..6 {
            let controller = initialized(
                TurnConfig::default(),
                TurnBundle::empty(turn - 1, None),
            );
            assert_eq!(controller.turn_count(), turn);
            assert_eq!(controller.current_user_index(), (turn % 2) as usize);
        }
    }

    #[tokio::test]
    async fn test_current_and_other_user_storage_follow_parity() {
        let controller = initialized(TurnConfig::default(), TurnBundle::empty(0, None));
        // Turn 1: user 1 plays.
        assert_eq!(controller.current_user_index(), 1);
        controller.current_user_storage().set("mine", json!(true)).await;
        assert_eq!(
            controller.user_storage(1).unwrap().get("mine").await,
            Some(json!(true))
        );
        assert!(controller.other_user_storage().get("mine").await.is_none());
    }

    #[tokio::test]
    async fn test_user_storage_out_of_range_is_none() {
        let controller = fresh(TurnConfig::default());
        assert!(controller.user_storage(2).is_none());
    }

    // -- finality ----------------------------------------------------------

    #[tokio::test]
    async fn test_finality_from_turn_limit_fires_one_turn_early() {
        let config = TurnConfig { turn_limit: Some(2), ..Default::default() };
        let controller = TurnController::new(config.validated());
        assert!(!controller.is_final_turn_for_count(0));
        assert!(controller.is_final_turn_for_count(1));
        assert!(controller.is_final_turn_for_count(2));
    }

    #[tokio::test]
    async fn test_finality_explicit_flag_without_limit() {
        let mut controller = fresh(TurnConfig::default());
        assert!(!controller.is_final_turn());
        controller.set_is_final_turn(true);
        assert!(controller.is_final_turn_for_count(0));
        assert!(controller.is_final_turn_for_count(100));
        controller.set_is_final_turn(false);
        assert!(!controller.is_final_turn());
    }

    #[tokio::test]
    async fn test_finality_watcher_reports_flip_once() {
        let mut controller = fresh(TurnConfig::default());
        // First poll after initialization counts as a flip.
        assert!(controller.was_finality_modified());
        assert!(!controller.was_finality_modified());

        controller.set_is_final_turn(true);
        assert!(controller.was_finality_modified());
        assert!(!controller.was_finality_modified());
    }

    #[tokio::test]
    async fn test_finality_watcher_silent_before_initialization() {
        let mut controller = TurnController::new(TurnConfig::default());
        assert!(!controller.was_finality_modified());
    }

    // -- variable gating ---------------------------------------------------

    #[tokio::test]
    async fn test_variables_frozen_after_submission_by_default() {
        let mut controller = fresh(TurnConfig::default());
        controller.set_variable("word", json!("before")).await;
        controller.end_turn();
        assert!(!controller.can_change_variables());

        controller.set_variable("word", json!("after")).await;
        controller.clear_variables().await;
        assert_eq!(controller.variable("word").await, Some(json!("before")));
    }

    #[tokio::test]
    async fn test_post_submission_edits_when_allowed() {
        let config = TurnConfig {
            allow_changing_turn_variables_after_submission: true,
            ..Default::default()
        };
        let mut controller = fresh(config);
        controller.end_turn();
        controller.set_variable("word", json!("late")).await;
        assert_eq!(controller.variable("word").await, Some(json!("late")));
    }

    #[tokio::test]
    async fn test_no_submission_requirement_means_always_writable() {
        let config = TurnConfig { require_turn_submission: false, ..Default::default() };
        let mut controller = fresh(config);
        controller.end_turn();
        // end_turn changed nothing: no requirement.
        assert!(!controller.is_turn_complete());
        controller.set_variable("word", json!("free")).await;
        assert_eq!(controller.variable("word").await, Some(json!("free")));
    }

    // -- transmission support ----------------------------------------------

    #[tokio::test]
    async fn test_fresh_turn_is_dirty_until_reset() {
        let mut controller = fresh(TurnConfig::default());
        assert!(controller.was_turn_data_modified());
        controller.reset_modified();
        assert!(!controller.was_turn_data_modified());

        controller.set_variable("word", json!("crate")).await;
        assert!(controller.was_turn_data_modified());
    }

    #[tokio::test]
    async fn test_end_turn_and_score_mark_dirty() {
        let mut controller = fresh(TurnConfig::default());
        controller.reset_modified();

        controller.end_turn();
        assert!(controller.was_turn_data_modified());
        controller.reset_modified();

        controller.set_score(10.0);
        assert!(controller.was_turn_data_modified());
        controller.reset_modified();

        // Same score again: nothing new to say.
        controller.set_score(10.0);
        assert!(!controller.was_turn_data_modified());
    }

    #[tokio::test]
    async fn test_assemble_bundle_reflects_current_state() {
        let mut controller = fresh(TurnConfig::default());
        controller.set_variable("word", json!("crate")).await;
        controller.global_storage().set("round", json!(1)).await;
        controller.end_turn();

        let bundle = controller.assemble_bundle().await;
        assert_eq!(bundle.turn_count, 0);
        assert_eq!(bundle.user_defined_game_variables["word"], json!("crate"));
        assert_eq!(bundle.global_storage["round"], json!(1));
        assert!(bundle.is_turn_complete);
        assert!(bundle.turn_history.is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_sent_true_until_a_complete_send() {
        let mut controller = fresh(TurnConfig::default());
        // Nothing transmitted yet: already incomplete.
        assert!(controller.was_incomplete_data_sent());
        controller.on_sent(false);
        assert!(controller.was_incomplete_data_sent());

        controller.on_sent(true);
        assert!(!controller.was_incomplete_data_sent());
        // A complete send settles it for good.
        controller.on_sent(false);
        assert!(!controller.was_incomplete_data_sent());

        // Without a submission requirement the condition never holds.
        let relaxed = fresh(TurnConfig {
            require_turn_submission: false,
            ..Default::default()
        });
        assert!(!relaxed.was_incomplete_data_sent());
    }
}
