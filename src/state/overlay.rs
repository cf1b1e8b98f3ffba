//! Transient predicted states layered over authoritative data.

use std::{fmt, hash::Hash, sync::Arc};

use dashmap::DashMap;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::state::guard::DedupeKey;

/// Unique identifier for an installed overlay.
pub type OverlayId = Uuid;

/// Predicted post-action state of one entity, owned by one in-flight request.
#[derive(Debug, Clone)]
pub struct Overlay<S> {
    /// Unique identifier for this overlay.
    pub id: OverlayId,
    /// Request scope the overlay belongs to.
    pub key: DedupeKey,
    /// Predicted value shown until the request settles.
    pub predicted: S,
    /// When the overlay was installed.
    pub installed_at: Instant,
}

/// Errors raised when installing an overlay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallError {
    /// An overlay already exists for this dedupe key.
    #[error("an overlay is already active for `{0}`")]
    AlreadyActive(DedupeKey),
}

/// Errors raised when settling or rolling back an overlay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClearError {
    /// No overlay is active for this dedupe key.
    #[error("no overlay is active")]
    NoOverlay,
    /// Overlay id does not match the active overlay.
    #[error("overlay id mismatch (expected {expected}, got {got})")]
    IdMismatch {
        /// Active overlay id.
        expected: OverlayId,
        /// Provided overlay id.
        got: OverlayId,
    },
}

/// Overlays indexed by the query key of the entity they patch.
///
/// Several actions may patch the same entity (completing then claiming a
/// quest); each keeps its own overlay and the most recently installed one wins
/// when projecting.
#[derive(Debug)]
pub struct OverlayTable<K, S>
where
    K: Eq + Hash,
{
    entries: DashMap<K, IndexMap<DedupeKey, Overlay<S>>>,
}

impl<K, S> Default for OverlayTable<K, S>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K, S> OverlayTable<K, S>
where
    K: Eq + Hash + Clone + fmt::Debug,
    S: Clone,
{
    /// Create an empty table behind an [`Arc`].
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Install a prediction for `query_key` on behalf of `key`.
    pub fn install(
        &self,
        query_key: K,
        key: DedupeKey,
        predicted: S,
    ) -> Result<OverlayId, InstallError> {
        let mut slot = self.entries.entry(query_key).or_default();
        if slot.contains_key(&key) {
            return Err(InstallError::AlreadyActive(key));
        }

        let overlay = Overlay {
            id: Uuid::new_v4(),
            key: key.clone(),
            predicted,
            installed_at: Instant::now(),
        };
        let id = overlay.id;
        slot.insert(key, overlay);
        Ok(id)
    }

    /// Remove the overlay once the authoritative state reflects the outcome.
    pub fn settle(&self, query_key: &K, key: &DedupeKey, id: OverlayId) -> Result<Overlay<S>, ClearError> {
        self.remove(query_key, key, id)
    }

    /// Discard the prediction after a failed request.
    pub fn rollback(
        &self,
        query_key: &K,
        key: &DedupeKey,
        id: OverlayId,
    ) -> Result<Overlay<S>, ClearError> {
        self.remove(query_key, key, id)
    }

    /// Newest predicted value for `query_key`, if any overlay is active.
    pub fn current(&self, query_key: &K) -> Option<S> {
        self.entries
            .get(query_key)
            .and_then(|slot| slot.last().map(|(_, overlay)| overlay.predicted.clone()))
    }

    /// Whether the request scope `key` currently has an overlay.
    pub fn is_active(&self, key: &DedupeKey) -> bool {
        self.entries.iter().any(|slot| slot.contains_key(key))
    }

    /// Number of active overlays for `query_key`.
    pub fn active_for(&self, query_key: &K) -> usize {
        self.entries.get(query_key).map(|slot| slot.len()).unwrap_or(0)
    }

    fn remove(&self, query_key: &K, key: &DedupeKey, id: OverlayId) -> Result<Overlay<S>, ClearError> {
        let mut slot = self.entries.get_mut(query_key).ok_or(ClearError::NoOverlay)?;
        let active = slot.get(key).ok_or(ClearError::NoOverlay)?;

        if active.id != id {
            return Err(ClearError::IdMismatch {
                expected: active.id,
                got: id,
            });
        }

        let overlay = slot.shift_remove(key).ok_or(ClearError::NoOverlay)?;
        let empty = slot.is_empty();
        drop(slot);

        if empty {
            self.entries.remove_if(query_key, |_, slot| slot.is_empty());
        }

        Ok(overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> DedupeKey {
        DedupeKey::new("complete-quest", "q1")
    }

    fn claim() -> DedupeKey {
        DedupeKey::new("claim-quest", "q1")
    }

    #[test]
    fn install_exposes_prediction() {
        let table = OverlayTable::<&str, u32>::new();
        table.install("q1", complete(), 3).unwrap();
        assert_eq!(table.current(&"q1"), Some(3));
        assert!(table.is_active(&complete()));
    }

    #[test]
    fn second_install_for_same_key_is_refused() {
        let table = OverlayTable::<&str, u32>::new();
        table.install("q1", complete(), 3).unwrap();
        let err = table.install("q1", complete(), 4).unwrap_err();
        assert_eq!(err, InstallError::AlreadyActive(complete()));
        assert_eq!(table.current(&"q1"), Some(3));
    }

    #[test]
    fn newest_overlay_wins_for_shared_entity() {
        let table = OverlayTable::<&str, u32>::new();
        let first = table.install("q1", complete(), 1).unwrap();
        table.install("q1", claim(), 2).unwrap();
        assert_eq!(table.current(&"q1"), Some(2));
        assert_eq!(table.active_for(&"q1"), 2);

        table.settle(&"q1", &complete(), first).unwrap();
        assert_eq!(table.current(&"q1"), Some(2));
    }

    #[test]
    fn rollback_clears_entity() {
        let table = OverlayTable::<&str, u32>::new();
        let id = table.install("q1", complete(), 3).unwrap();
        let overlay = table.rollback(&"q1", &complete(), id).unwrap();
        assert_eq!(overlay.predicted, 3);
        assert_eq!(table.current(&"q1"), None);
        assert!(!table.is_active(&complete()));
    }

    #[test]
    fn clearing_with_wrong_id_keeps_overlay() {
        let table = OverlayTable::<&str, u32>::new();
        let id = table.install("q1", complete(), 3).unwrap();
        let other = Uuid::new_v4();
        let err = table.settle(&"q1", &complete(), other).unwrap_err();
        assert_eq!(
            err,
            ClearError::IdMismatch {
                expected: id,
                got: other
            }
        );
        assert_eq!(table.current(&"q1"), Some(3));
    }

    #[test]
    fn clearing_missing_overlay_fails() {
        let table = OverlayTable::<&str, u32>::new();
        let err = table.rollback(&"q1", &complete(), Uuid::new_v4()).unwrap_err();
        assert_eq!(err, ClearError::NoOverlay);
    }
}
