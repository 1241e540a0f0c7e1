//! The active set of tappable regions for one turn session.

use std::sync::Arc;

use tracing::{error, warn};
use turnforge_protocol::TappableConfig;
use turnforge_store::Watcher;

use crate::{ScreenQuery, TappableRegion, TappableValidator};

/// Owns the declared tappable regions and produces the validated
/// config list for each outbound request.
///
/// Also tracks whether the effective set changed since the last
/// transmission: geometry comes from live host transforms, so change
/// detection is a polled fingerprint comparison, not a mutation flag.
pub struct TappableSet {
    regions: Vec<TappableRegion>,
    is_game_over: bool,
    watcher: Watcher<String>,
}

impl TappableSet {
    /// Builds a set from declared regions, dropping entries with
    /// invalid or duplicate keys (warned, never an error).
    pub fn new(declared: Vec<TappableRegion>) -> Self {
        let mut regions: Vec<TappableRegion> = Vec::with_capacity(declared.len());
        for region in declared {
            if !TappableValidator::is_key_valid(&region.key) {
                continue;
            }
            if regions.iter().any(|r| r.key == region.key) {
                warn!(key = region.key, "duplicate tappable key, all keys must be unique");
                continue;
            }
            regions.push(region);
        }
        Self {
            regions,
            is_game_over: false,
            watcher: Watcher::new(),
        }
    }

    /// Adds a region, or overrides the transform of an existing key.
    pub fn add(&mut self, key: impl Into<String>, source: Arc<dyn ScreenQuery>) {
        let key = key.into();
        if !TappableValidator::is_key_valid(&key) {
            return;
        }
        if let Some(existing) = self.regions.iter_mut().find(|r| r.key == key) {
            warn!(key, "tappable region already exists, overriding its transform");
            existing.source = source;
        } else {
            self.regions.push(TappableRegion::new(key, source));
        }
    }

    /// Removes the region with the given key, if present.
    pub fn remove(&mut self, key: &str) {
        self.regions.retain(|r| r.key != key);
    }

    /// Removes every region.
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Declared regions, including currently inactive ones.
    pub fn regions(&self) -> &[TappableRegion] {
        &self.regions
    }

    /// Once the game is over no region is submitted: the final reply
    /// must not invite another tap.
    pub fn set_game_over(&mut self, is_game_over: bool) {
        self.is_game_over = is_game_over;
    }

    /// The validated config list for the next outbound request:
    /// count cap, then per-region shape checks, then the greedy
    /// total-coverage budget. Regions whose transform query fails are
    /// dropped with a logged error.
    pub fn config(&self) -> Vec<TappableConfig> {
        let active = TappableValidator::validate_count(self.active_regions());
        let configs = active
            .into_iter()
            .filter_map(|region| match region.config() {
                Ok(config) => Some(config),
                Err(err) => {
                    error!(key = region.key, %err, "failed to query tappable region transform");
                    None
                }
            })
            .filter(TappableValidator::validate_config)
            .collect();
        TappableValidator::validate_total_coverage(configs)
    }

    /// Whether the effective region set changed since the last call.
    /// Polled once per scheduling tick by the send driver.
    pub fn was_modified(&mut self) -> bool {
        let fingerprint = self.fingerprint();
        self.watcher.update(Some(fingerprint))
    }

    fn active_regions(&self) -> Vec<TappableRegion> {
        if self.is_game_over {
            return Vec::new();
        }
        self.regions.iter().filter(|r| r.source.is_active()).cloned().collect()
    }

    /// A stable textual digest of every active region's key and
    /// current geometry, sorted so declaration order doesn't matter.
    fn fingerprint(&self) -> String {
        let mut parts: Vec<String> = self
            .active_regions()
            .iter()
            .map(|region| match region.source.screen_rect() {
                Ok(rect) => format!(
                    "{}@{:.6},{:.6},{:.6},{:.6},{}",
                    region.key, rect.center_x, rect.center_y, rect.width, rect.height, rect.rotation_degrees
                ),
                Err(err) => {
                    error!(key = region.key, %err, "failed to query tappable region transform");
                    format!("{}@invalid", region.key)
                }
            })
            .collect();
        parts.sort();
        parts.join(";")
    }
}
