//! Cache of server-confirmed entity state, refreshed on demand.

use std::{fmt, hash::Hash, sync::Arc};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::dao::remote::{RemoteError, RemoteResult};

/// Loads the authoritative value of an entity. `Ok(None)` means the entity does not exist yet.
pub trait QuerySource<K, S>: Send + Sync {
    /// Fetch the current value for `key`.
    fn fetch(&self, key: &K) -> BoxFuture<'static, RemoteResult<Option<S>>>;
}

/// Read-only view of a cached query, mirroring a `{ data, isLoading, error }` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot<S> {
    /// Last confirmed value.
    pub data: Option<S>,
    /// A fetch is running for this key.
    pub is_loading: bool,
    /// Message of the last failed fetch, cleared on the next success.
    pub error: Option<String>,
    /// Bumped on every confirmed write.
    pub version: u64,
}

impl<S> Default for QuerySnapshot<S> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
            version: 0,
        }
    }
}

/// Authoritative state store keyed by query key.
pub struct QueryCache<K, S>
where
    K: Eq + Hash,
{
    entries: DashMap<K, QuerySnapshot<S>>,
    source: Arc<dyn QuerySource<K, S>>,
}

impl<K, S> QueryCache<K, S>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    /// Build a cache backed by `source`.
    pub fn new(source: Arc<dyn QuerySource<K, S>>) -> Arc<Self> {
        Arc::new(Self {
            entries: DashMap::new(),
            source,
        })
    }

    /// Current snapshot for `key`; an unknown key yields an empty snapshot.
    pub fn snapshot(&self, key: &K) -> QuerySnapshot<S> {
        self.entries
            .get(key)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Last confirmed value for `key`.
    pub fn data(&self, key: &K) -> Option<S> {
        self.entries.get(key).and_then(|entry| entry.data.clone())
    }

    /// Whether `key` has been loaded at least once.
    pub fn is_loaded(&self, key: &K) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.version > 0)
            .unwrap_or(false)
    }

    /// Store a value confirmed by a mutation response.
    pub fn set(&self, key: K, value: Option<S>) {
        let mut entry = self.entries.entry(key).or_default();
        entry.data = value;
        entry.error = None;
        entry.version += 1;
    }

    /// Fetch `key` from the source and store the result.
    ///
    /// On failure the previous value is kept and the error is recorded. A
    /// fetched value is discarded when a newer one was stored while the fetch
    /// was in flight; the newer value is returned instead.
    pub async fn refetch(&self, key: &K) -> RemoteResult<Option<S>> {
        let started_at = {
            let mut entry = self.entries.entry(key.clone()).or_default();
            entry.is_loading = true;
            entry.version
        };

        let result = self.source.fetch(key).await;

        let mut entry = self.entries.entry(key.clone()).or_default();
        entry.is_loading = false;
        if entry.version != started_at {
            debug!(?key, "fetched value superseded by a newer write");
            return match result {
                Ok(_) => Ok(entry.data.clone()),
                Err(err) => Err(err),
            };
        }
        match result {
            Ok(value) => {
                debug!(?key, "query refreshed");
                entry.data = value.clone();
                entry.error = None;
                entry.version += 1;
                Ok(value)
            }
            Err(err) => {
                warn!(?key, error = %err, "query refresh failed");
                entry.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Return the cached value, fetching it first when the key was never loaded.
    pub async fn ensure(&self, key: &K) -> Result<Option<S>, RemoteError> {
        if self.is_loaded(key) {
            return Ok(self.data(key));
        }
        self.refetch(key).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{sync::Mutex, time::Duration};

    use super::*;

    /// Source returning queued answers in order, then `None`.
    pub(crate) struct ScriptedSource<S> {
        answers: Mutex<Vec<RemoteResult<Option<S>>>>,
    }

    impl<S> ScriptedSource<S> {
        pub(crate) fn new(mut answers: Vec<RemoteResult<Option<S>>>) -> Arc<Self> {
            answers.reverse();
            Arc::new(Self {
                answers: Mutex::new(answers),
            })
        }
    }

    impl<K, S> QuerySource<K, S> for ScriptedSource<S>
    where
        S: Send + 'static,
    {
        fn fetch(&self, _key: &K) -> BoxFuture<'static, RemoteResult<Option<S>>> {
            let next = self.answers.lock().unwrap().pop().unwrap_or(Ok(None));
            Box::pin(async move { next })
        }
    }

    #[tokio::test]
    async fn unknown_key_snapshot_is_empty() {
        let cache: Arc<QueryCache<&str, u32>> = QueryCache::new(ScriptedSource::<u32>::new(vec![]));
        let snapshot = cache.snapshot(&"a");
        assert_eq!(snapshot, QuerySnapshot::default());
        assert!(!cache.is_loaded(&"a"));
    }

    #[tokio::test]
    async fn refetch_stores_value() {
        let cache: Arc<QueryCache<&str, u32>> =
            QueryCache::new(ScriptedSource::<u32>::new(vec![Ok(Some(7))]));
        assert_eq!(cache.refetch(&"a").await.unwrap(), Some(7));

        let snapshot = cache.snapshot(&"a");
        assert_eq!(snapshot.data, Some(7));
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.version, 1);
    }

    #[tokio::test]
    async fn failed_refetch_keeps_previous_value() {
        let cache: Arc<QueryCache<&str, u32>> = QueryCache::new(ScriptedSource::<u32>::new(vec![
            Ok(Some(1)),
            Err(RemoteError::Status {
                path: "quests".into(),
                status: 500,
            }),
        ]));
        cache.refetch(&"a").await.unwrap();
        assert!(cache.refetch(&"a").await.is_err());

        let snapshot = cache.snapshot(&"a");
        assert_eq!(snapshot.data, Some(1));
        assert!(snapshot.error.is_some());
        assert_eq!(snapshot.version, 1);
    }

    /// Source answering `Some(value)` after `delay`.
    struct SlowSource {
        value: u32,
        delay: Duration,
    }

    impl<K> QuerySource<K, u32> for SlowSource {
        fn fetch(&self, _key: &K) -> BoxFuture<'static, RemoteResult<Option<u32>>> {
            let (value, delay) = (self.value, self.delay);
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(Some(value))
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_does_not_overwrite_newer_write() {
        let cache: Arc<QueryCache<&'static str, u32>> = QueryCache::new(Arc::new(SlowSource {
            value: 1,
            delay: Duration::from_millis(200),
        }));

        let pending = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.refetch(&"q").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.set("q", Some(2));

        assert_eq!(pending.await.unwrap().unwrap(), Some(2));
        let snapshot = cache.snapshot(&"q");
        assert_eq!(snapshot.data, Some(2));
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.version, 1);
    }

    #[tokio::test]
    async fn ensure_fetches_once() {
        let cache: Arc<QueryCache<&str, u32>> =
            QueryCache::new(ScriptedSource::<u32>::new(vec![Ok(Some(1)), Ok(Some(2))]));
        assert_eq!(cache.ensure(&"a").await.unwrap(), Some(1));
        assert_eq!(cache.ensure(&"a").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn set_bumps_version_and_clears_error() {
        let cache: Arc<QueryCache<&str, u32>> = QueryCache::new(ScriptedSource::<u32>::new(vec![]));
        cache.set("a", Some(4));
        cache.set("a", None);
        let snapshot = cache.snapshot(&"a");
        assert_eq!(snapshot.data, None);
        assert_eq!(snapshot.version, 2);
        assert!(cache.is_loaded(&"a"));
    }
}
