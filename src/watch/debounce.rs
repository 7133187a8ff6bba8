// src/watch/debounce.rs

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::types::DebouncePolicy;

/// Entries older than the window are dropped once the map grows past this.
const PRUNE_THRESHOLD: usize = 1024;

/// Leading-edge, per-key suppression of repeated notifications.
///
/// The first notification for a key passes; further ones for the same key
/// are dropped until the window since the last admitted one has elapsed.
#[derive(Debug, Clone)]
pub struct Debouncer {
    enabled: bool,
    window: Duration,
    last_admitted: HashMap<String, Instant>,
}

impl Debouncer {
    pub fn new(policy: DebouncePolicy) -> Self {
        Self {
            enabled: policy.is_enabled(),
            window: Duration::from_millis(policy.window_ms),
            last_admitted: HashMap::new(),
        }
    }

    /// Whether a notification for `key` at `now` should be acted on.
    pub fn admit(&mut self, key: &str, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }

        if let Some(prev) = self.last_admitted.get(key) {
            if now.saturating_duration_since(*prev) < self.window {
                return false;
            }
        }

        if self.last_admitted.len() >= PRUNE_THRESHOLD {
            let window = self.window;
            self.last_admitted
                .retain(|_, at| now.saturating_duration_since(*at) < window);
        }
        self.last_admitted.insert(key.to_string(), now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_window_admits_everything() {
        assert!(!DebouncePolicy::none().is_enabled());
        let mut d = Debouncer::new(DebouncePolicy::none());
        let now = Instant::now();
        assert!(d.admit("a.scss", now));
        assert!(d.admit("a.scss", now));
    }

    #[test]
    fn repeats_inside_window_are_dropped_per_path() {
        let policy = DebouncePolicy { window_ms: 100 };
        assert!(policy.is_enabled());
        let mut d = Debouncer::new(policy);
        let t0 = Instant::now();
        assert!(d.admit("a.scss", t0));
        assert!(!d.admit("a.scss", t0 + Duration::from_millis(50)));
        assert!(d.admit("b.scss", t0 + Duration::from_millis(50)));
        assert!(d.admit("a.scss", t0 + Duration::from_millis(100)));
    }
}
