//! Limit enforcement for tappable hit-regions.
//!
//! Any custom 2D design may be rendered as a reply prompt, so the host
//! platform limits how much of the screen the prompt's tappable areas
//! may occlude. This validator is the local pre-check that keeps an
//! outbound request from being rejected server-side. Violations drop
//! or truncate the offending regions with a warning; they never abort
//! the request.

use tracing::warn;
use turnforge_protocol::TappableConfig;

use crate::TappableRegion;

/// Maximum key length in characters.
pub const KEY_LENGTH_LIMIT: usize = 24;
/// Maximum number of active regions in one request.
pub const MAX_REGIONS: usize = 16;
/// Combined normalized area budget for all regions.
pub const MAX_TOTAL_AREA: f64 = 0.4;
/// Normalized area limit for a single region.
pub const MAX_AREA: f64 = 0.4;
/// Valid range for a region's center coordinates.
pub const CENTER_BOUNDS: (f64, f64) = (0.05, 0.95);
/// Minimum aspect ratio (short side over long side).
pub const MIN_ASPECT_RATIO: f64 = 0.125;

const EPS: f64 = 1e-9;

/// Stateless checks over regions and their derived configs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TappableValidator;

impl TappableValidator {
    /// `true` for a usable region key: non-empty, at most
    /// [`KEY_LENGTH_LIMIT`] characters. Rejections are logged.
    pub fn is_key_valid(key: &str) -> bool {
        if key.is_empty() {
            warn!("skipping tappable region with empty key");
            return false;
        }
        if key.chars().count() > KEY_LENGTH_LIMIT {
            warn!(
                key,
                limit = KEY_LENGTH_LIMIT,
                length = key.chars().count(),
                "tappable region key exceeds length limit"
            );
            return false;
        }
        true
    }

    /// Truncates to the first [`MAX_REGIONS`] regions, warning when
    /// anything is dropped.
    pub fn validate_count(mut regions: Vec<TappableRegion>) -> Vec<TappableRegion> {
        if regions.len() > MAX_REGIONS {
            warn!(
                max = MAX_REGIONS,
                dropped = regions.len() - MAX_REGIONS,
                "too many tappable regions, skipping excess"
            );
            regions.truncate(MAX_REGIONS);
        }
        regions
    }

    /// Checks one derived config against the shape restrictions.
    /// Every rejection logs its reason and the offending key.
    pub fn validate_config(config: &TappableConfig) -> bool {
        let (min, max) = CENTER_BOUNDS;
        if config.normalized_x < min || config.normalized_x > max {
            warn!(
                key = config.key,
                x = config.normalized_x,
                "tappable region center x outside [{min}, {max}]"
            );
            return false;
        }
        if config.normalized_y < min || config.normalized_y > max {
            warn!(
                key = config.key,
                y = config.normalized_y,
                "tappable region center y outside [{min}, {max}]"
            );
            return false;
        }
        let (width, height) = (config.normalized_width, config.normalized_height);
        if width < EPS || height < EPS {
            warn!(key = config.key, "skipping tappable region with zero width or height");
            return false;
        }
        let aspect = width.min(height) / width.max(height);
        if aspect < MIN_ASPECT_RATIO {
            warn!(
                key = config.key,
                aspect,
                limit = MIN_ASPECT_RATIO,
                "tappable region aspect ratio below limit"
            );
            return false;
        }
        if !Self::is_key_valid(&config.key) {
            return false;
        }
        if config.area() > MAX_AREA {
            warn!(
                key = config.key,
                area = config.area(),
                limit = MAX_AREA,
                "tappable region area exceeds limit"
            );
            return false;
        }
        true
    }

    /// Greedy first-fit-by-declaration-order coverage check.
    ///
    /// Walks configs in order accumulating area; the first config that
    /// would push the total past [`MAX_TOTAL_AREA`] is dropped along
    /// with everything after it. Declaration order matters — this is
    /// not an optimal packing.
    pub fn validate_total_coverage(configs: Vec<TappableConfig>) -> Vec<TappableConfig> {
        let mut total_area = 0.0;
        let mut kept = 0;
        while kept < configs.len() {
            let area = configs[kept].area();
            if total_area + area > MAX_TOTAL_AREA {
                let dropped: Vec<&str> = configs[kept..].iter().map(|c| c.key.as_str()).collect();
                warn!(
                    limit = MAX_TOTAL_AREA,
                    ?dropped,
                    "total tappable coverage exceeds limit, skipping excess regions"
                );
                break;
            }
            total_area += area;
            kept += 1;
        }
        let mut configs = configs;
        configs.truncate(kept);
        configs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: &str, x: f64, y: f64, w: f64, h: f64) -> TappableConfig {
        TappableConfig {
            key: key.into(),
            normalized_x: x,
            normalized_y: y,
            normalized_width: w,
            normalized_height: h,
            rotation_degrees: 0,
        }
    }

    #[test]
    fn test_key_rules() {
        assert!(TappableValidator::is_key_valid("attack"));
        assert!(TappableValidator::is_key_valid(&"k".repeat(24)));
        assert!(!TappableValidator::is_key_valid(""));
        assert!(!TappableValidator::is_key_valid(&"k".repeat(25)));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(TappableValidator::validate_config(&config("ok", 0.5, 0.5, 0.2, 0.1)));
    }

    #[test]
    fn test_center_out_of_bounds_rejected() {
        assert!(!TappableValidator::validate_config(&config("x-low", 0.04, 0.5, 0.2, 0.1)));
        assert!(!TappableValidator::validate_config(&config("x-high", 0.96, 0.5, 0.2, 0.1)));
        assert!(!TappableValidator::validate_config(&config("y-low", 0.5, 0.0, 0.2, 0.1)));
        assert!(!TappableValidator::validate_config(&config("y-high", 0.5, 1.0, 0.2, 0.1)));
    }

    #[test]
    fn test_boundary_centers_accepted() {
        assert!(TappableValidator::validate_config(&config("min", 0.05, 0.05, 0.2, 0.1)));
        assert!(TappableValidator::validate_config(&config("max", 0.95, 0.95, 0.2, 0.1)));
    }

    #[test]
    fn test_degenerate_size_rejected() {
        assert!(!TappableValidator::validate_config(&config("flat", 0.5, 0.5, 0.2, 0.0)));
        assert!(!TappableValidator::validate_config(&config("thin", 0.5, 0.5, 1e-12, 0.1)));
    }

    #[test]
    fn test_extreme_aspect_ratio_rejected() {
        // 0.8 x 0.05 => aspect 0.0625 < 0.125.
        assert!(!TappableValidator::validate_config(&config("sliver", 0.5, 0.5, 0.8, 0.05)));
        // 0.4 x 0.05 => aspect exactly 0.125, allowed.
        assert!(TappableValidator::validate_config(&config("edge", 0.5, 0.5, 0.4, 0.05)));
    }

    #[test]
    fn test_oversized_area_rejected() {
        assert!(!TappableValidator::validate_config(&config("big", 0.5, 0.5, 0.7, 0.6)));
    }

    #[test]
    fn test_long_key_config_rejected() {
        let key = "k".repeat(30);
        assert!(!TappableValidator::validate_config(&config(&key, 0.5, 0.5, 0.2, 0.1)));
    }

    #[test]
    fn test_coverage_drops_greedily_in_declaration_order() {
        // 0.15 + 0.15 fits; adding the third 0.15 would exceed 0.4,
        // so it and the small one after it are both dropped.
        let configs = vec![
            config("a", 0.3, 0.3, 0.5, 0.3),
            config("b", 0.5, 0.5, 0.5, 0.3),
            config("c", 0.7, 0.7, 0.5, 0.3),
            config("d", 0.9, 0.9, 0.1, 0.1),
        ];
        let kept = TappableValidator::validate_total_coverage(configs);
        let keys: Vec<&str> = kept.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn test_coverage_keeps_all_under_budget() {
        let configs = vec![
            config("a", 0.3, 0.3, 0.2, 0.2),
            config("b", 0.5, 0.5, 0.2, 0.2),
        ];
        assert_eq!(TappableValidator::validate_total_coverage(configs).len(), 2);
    }

    #[test]
    fn test_coverage_is_idempotent() {
        let configs = vec![
            config("a", 0.3, 0.3, 0.5, 0.3),
            config("b", 0.5, 0.5, 0.5, 0.3),
            config("c", 0.7, 0.7, 0.5, 0.3),
        ];
        let once = TappableValidator::validate_total_coverage(configs);
        let twice = TappableValidator::validate_total_coverage(once.clone());
        assert_eq!(once, twice);
    }
}
