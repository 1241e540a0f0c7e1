//! Tappable hit-region handling for Turnforge.
//!
//! A tappable region is a named interactive hit-area rendered as part
//! of the asynchronous reply message. The host platform limits how
//! much of the recipient's screen those regions may cover; this crate
//! performs the local pre-checks and tracks changes for the send
//! driver.
//!
//! # Key types
//!
//! - [`ScreenQuery`] — the opaque host-transform boundary
//! - [`TappableRegion`] — a declared region (key + transform handle)
//! - [`TappableValidator`] — shape/count/coverage limit enforcement
//! - [`TappableSet`] — the per-session region set and config pipeline

mod region;
mod set;
mod validator;

pub use region::{FixedRect, ScreenQuery, ScreenQueryError, ScreenRect, TappableRegion};
pub use set::TappableSet;
pub use validator::{
    CENTER_BOUNDS, KEY_LENGTH_LIMIT, MAX_AREA, MAX_REGIONS, MAX_TOTAL_AREA, MIN_ASPECT_RATIO,
    TappableValidator,
};
