//! Change detection by polled comparison.

/// Tracks the last observed value of some polled quantity and reports
/// whether a new observation differs from it.
///
/// Used once per scheduling tick for the signals that have no explicit
/// mutation path — the finality flip and the tappable-region
/// fingerprint — where comparing snapshots is the only way to notice a
/// change.
#[derive(Debug, Default)]
pub struct Watcher<T> {
    data: Option<T>,
}

impl<T: PartialEq> Watcher<T> {
    pub fn new() -> Self {
        Self { data: None }
    }

    /// The last observed value, if any observation happened yet.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Records `current` and returns `true` if it differs from the
    /// previously observed value. The very first observation of a
    /// `Some` value counts as a change.
    pub fn update(&mut self, current: Option<T>) -> bool {
        if self.data != current {
            self.data = current;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_is_a_change() {
        let mut watcher = Watcher::new();
        assert!(watcher.update(Some(false)));
        assert_eq!(watcher.data(), Some(&false));
    }

    #[test]
    fn test_repeated_observation_is_not_a_change() {
        let mut watcher = Watcher::new();
        watcher.update(Some(1));
        assert!(!watcher.update(Some(1)));
        assert!(watcher.update(Some(2)));
    }

    #[test]
    fn test_none_before_first_value_is_not_a_change() {
        // An uninitialized source polls as None until the turn data
        // resolves; that must not register as a flip.
        let mut watcher: Watcher<bool> = Watcher::new();
        assert!(!watcher.update(None));
        assert!(watcher.update(Some(true)));
    }
}
