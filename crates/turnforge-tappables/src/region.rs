//! Tappable region inputs and the host-transform boundary.

use std::fmt;
use std::sync::Arc;

use turnforge_protocol::TappableConfig;

/// Screen-space geometry of a region, normalized to the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    /// Center x in [0, 1].
    pub center_x: f64,
    /// Center y in [0, 1].
    pub center_y: f64,
    /// Normalized width.
    pub width: f64,
    /// Normalized height.
    pub height: f64,
    /// Rotation in whole degrees.
    pub rotation_degrees: i32,
}

/// Failure to query a host transform's screen geometry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScreenQueryError {
    /// The transform is no longer attached to a live scene object.
    #[error("transform detached: {0}")]
    Detached(String),
    /// The host query itself failed.
    #[error("screen query failed: {0}")]
    QueryFailed(String),
}

/// The opaque host-object boundary: everything the core is allowed to
/// ask of the scene handle backing a tappable region.
///
/// The host's transform objects are dynamic and duck-typed; the core
/// never inspects them beyond this one geometry query plus an enabled
/// check. Geometry is queried at validation time, not cached — region
/// positions can animate between ticks.
pub trait ScreenQuery: Send + Sync {
    /// Current screen-space rect of the region.
    ///
    /// # Errors
    /// Fails when the underlying transform is detached or invalid; the
    /// caller drops the region with a logged error rather than
    /// propagating.
    fn screen_rect(&self) -> Result<ScreenRect, ScreenQueryError>;

    /// Whether the region's scene object is enabled in the hierarchy.
    /// Disabled regions are excluded from submission.
    fn is_active(&self) -> bool {
        true
    }
}

/// A named interactive hit-area backed by a host transform.
#[derive(Clone)]
pub struct TappableRegion {
    pub key: String,
    pub source: Arc<dyn ScreenQuery>,
}

impl TappableRegion {
    pub fn new(key: impl Into<String>, source: Arc<dyn ScreenQuery>) -> Self {
        Self { key: key.into(), source }
    }

    /// Derives the transmissible descriptor from the current geometry.
    ///
    /// # Errors
    /// Propagates the [`ScreenQueryError`] of the underlying transform.
    pub fn config(&self) -> Result<TappableConfig, ScreenQueryError> {
        let rect = self.source.screen_rect()?;
        Ok(TappableConfig {
            key: self.key.clone(),
            normalized_x: rect.center_x,
            normalized_y: rect.center_y,
            normalized_width: rect.width,
            normalized_height: rect.height,
            rotation_degrees: rect.rotation_degrees,
        })
    }
}

impl fmt::Debug for TappableRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TappableRegion").field("key", &self.key).finish_non_exhaustive()
    }
}

/// A fixed-geometry [`ScreenQuery`], for tests and static layouts.
#[derive(Debug, Clone)]
pub struct FixedRect {
    pub rect: ScreenRect,
    pub active: bool,
}

impl FixedRect {
    pub fn new(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self {
            rect: ScreenRect {
                center_x,
                center_y,
                width,
                height,
                rotation_degrees: 0,
            },
            active: true,
        }
    }
}

impl ScreenQuery for FixedRect {
    fn screen_rect(&self) -> Result<ScreenRect, ScreenQueryError> {
        Ok(self.rect)
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
