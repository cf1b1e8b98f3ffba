//! Per-key admission control for user-triggered actions.

use std::{
    fmt,
    sync::{Arc, Mutex},
    time::Duration,
};

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::time::Instant;

/// Default minimum spacing between two accepted requests for the same key.
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// Identifies one logical action on one entity (e.g. `claim-quest` on quest 7 for a player).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupeKey {
    /// Name of the action, shared by every request of that kind.
    pub action: &'static str,
    /// Entity the action targets.
    pub entity: String,
}

impl DedupeKey {
    /// Build a key from an action name and an entity identifier.
    pub fn new(action: &'static str, entity: impl Into<String>) -> Self {
        Self {
            action,
            entity: entity.into(),
        }
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.entity)
    }
}

#[derive(Debug, Clone, Copy)]
struct GuardEntry {
    last_accepted: Instant,
    in_flight: bool,
}

/// Rejects duplicate or rapid-fire submissions of the same logical action.
///
/// A request for a key is accepted only when nothing is in flight for that key
/// and the previous accepted request is older than the debounce delay. Accepted
/// requests hold a [`GuardPermit`]; dropping the permit releases the key.
///
/// Idle entries whose window has passed are pruned lazily, at most once per
/// delay, so the table only holds keys that can still reject a request.
#[derive(Debug)]
pub struct DebounceGuard {
    delay: Duration,
    entries: DashMap<DedupeKey, GuardEntry>,
    last_prune: Mutex<Option<Instant>>,
}

impl DebounceGuard {
    /// Create a guard with the given debounce delay.
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            entries: DashMap::new(),
            last_prune: Mutex::new(None),
        })
    }

    /// Configured debounce delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Try to admit a request for `key` at the current instant.
    pub fn try_acquire(self: &Arc<Self>, key: DedupeKey) -> Option<GuardPermit> {
        self.try_acquire_at(key, Instant::now())
    }

    /// Try to admit a request for `key` observed at `now`.
    ///
    /// Rejections leave the recorded state untouched.
    pub fn try_acquire_at(self: &Arc<Self>, key: DedupeKey, now: Instant) -> Option<GuardPermit> {
        self.prune_idle(now);

        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.in_flight || now.duration_since(entry.last_accepted) < self.delay {
                    return None;
                }
                entry.last_accepted = now;
                entry.in_flight = true;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(GuardEntry {
                    last_accepted: now,
                    in_flight: true,
                });
            }
        }

        Some(GuardPermit {
            guard: Arc::clone(self),
            key,
        })
    }

    /// Whether a request for `key` is currently in flight.
    pub fn is_in_flight(&self, key: &DedupeKey) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.in_flight)
            .unwrap_or(false)
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }

    /// Drop entries that are not in flight and whose window has elapsed.
    fn prune_idle(&self, now: Instant) {
        {
            let Ok(mut last_prune) = self.last_prune.lock() else {
                return;
            };
            match *last_prune {
                Some(at) if now.duration_since(at) < self.delay => return,
                _ => *last_prune = Some(now),
            }
        }

        let delay = self.delay;
        self.entries
            .retain(|_, entry| entry.in_flight || now.duration_since(entry.last_accepted) < delay);
    }

    fn release(&self, key: &DedupeKey) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.in_flight = false;
        }
    }
}

/// Proof that a request was admitted. Releases the in-flight flag when dropped.
#[derive(Debug)]
pub struct GuardPermit {
    guard: Arc<DebounceGuard>,
    key: DedupeKey,
}

impl GuardPermit {
    /// Key this permit was issued for.
    pub fn key(&self) -> &DedupeKey {
        &self.key
    }
}

impl Drop for GuardPermit {
    fn drop(&mut self) {
        self.guard.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(entity: &str) -> DedupeKey {
        DedupeKey::new("complete-quest", entity)
    }

    #[test]
    fn first_request_is_accepted() {
        let guard = DebounceGuard::new(DEFAULT_DEBOUNCE_DELAY);
        let permit = guard.try_acquire_at(key("q1"), Instant::now());
        assert!(permit.is_some());
        assert!(guard.is_in_flight(&key("q1")));
    }

    #[test]
    fn concurrent_request_is_rejected_while_in_flight() {
        let guard = DebounceGuard::new(DEFAULT_DEBOUNCE_DELAY);
        let start = Instant::now();
        let _permit = guard.try_acquire_at(key("q1"), start).unwrap();

        let later = start + Duration::from_secs(5);
        assert!(guard.try_acquire_at(key("q1"), later).is_none());
    }

    #[test]
    fn rapid_request_is_rejected_after_release() {
        let guard = DebounceGuard::new(DEFAULT_DEBOUNCE_DELAY);
        let start = Instant::now();
        drop(guard.try_acquire_at(key("q1"), start).unwrap());

        assert!(!guard.is_in_flight(&key("q1")));
        assert!(
            guard
                .try_acquire_at(key("q1"), start + Duration::from_millis(100))
                .is_none()
        );
        assert!(
            guard
                .try_acquire_at(key("q1"), start + Duration::from_millis(500))
                .is_some()
        );
    }

    #[test]
    fn rejection_does_not_move_the_window() {
        let guard = DebounceGuard::new(DEFAULT_DEBOUNCE_DELAY);
        let start = Instant::now();
        drop(guard.try_acquire_at(key("q1"), start).unwrap());

        assert!(
            guard
                .try_acquire_at(key("q1"), start + Duration::from_millis(400))
                .is_none()
        );
        // Measured from the accepted request, not the rejected one.
        assert!(
            guard
                .try_acquire_at(key("q1"), start + Duration::from_millis(600))
                .is_some()
        );
    }

    #[test]
    fn idle_keys_are_pruned_after_their_window() {
        let guard = DebounceGuard::new(DEFAULT_DEBOUNCE_DELAY);
        let start = Instant::now();
        for n in 0..10_000 {
            drop(guard.try_acquire_at(key(&format!("q{n}")), start).unwrap());
        }
        let _busy = guard
            .try_acquire_at(DedupeKey::new("claim-quest", "q0"), start)
            .unwrap();
        assert_eq!(guard.tracked_keys(), 10_001);

        let later = start + Duration::from_secs(3600);
        assert!(guard.try_acquire_at(key("fresh"), later).is_some());
        // The in-flight claim survives; every idle completion key is gone.
        assert_eq!(guard.tracked_keys(), 2);
    }

    #[test]
    fn pruning_keeps_keys_inside_their_window() {
        let guard = DebounceGuard::new(DEFAULT_DEBOUNCE_DELAY);
        let start = Instant::now();
        drop(guard.try_acquire_at(key("q1"), start).unwrap());

        let soon = start + Duration::from_millis(600);
        drop(guard.try_acquire_at(key("q2"), soon).unwrap());
        assert_eq!(guard.tracked_keys(), 1);
        assert!(
            guard
                .try_acquire_at(key("q2"), soon + Duration::from_millis(100))
                .is_none()
        );
    }

    #[test]
    fn keys_are_independent() {
        let guard = DebounceGuard::new(DEFAULT_DEBOUNCE_DELAY);
        let now = Instant::now();
        let _a = guard.try_acquire_at(key("q1"), now).unwrap();
        assert!(guard.try_acquire_at(key("q2"), now).is_some());
        assert!(
            guard
                .try_acquire_at(DedupeKey::new("claim-quest", "q1"), now)
                .is_some()
        );
    }
}
