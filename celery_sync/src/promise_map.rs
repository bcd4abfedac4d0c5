use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// The reason a [`PromiseMap`] entry settled without an application-supplied
/// value.
#[derive(Debug, Clone)]
pub enum PromiseError<E> {
    /// The whole map was [cleared](PromiseMap::clear) while this entry was
    /// still pending.
    Cleared,
    /// The entry was [deleted](PromiseMap::delete) while still pending.
    Deleted,
    /// An application-supplied rejection reason.
    Custom(E),
}

impl<E: fmt::Display> fmt::Display for PromiseError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromiseError::Cleared => write!(f, "the promise map was cleared"),
            PromiseError::Deleted => write!(f, "the entry was deleted before it settled"),
            PromiseError::Custom(e) => write!(f, "{e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for PromiseError<E> {}

type Outcome<V, E> = Result<V, PromiseError<E>>;

enum EntryState<V, E> {
    Pending(Vec<oneshot::Sender<Outcome<V, E>>>),
    Settled(Outcome<V, E>),
}

struct Entry<V, E> {
    state: EntryState<V, E>,
    generation: u64,
}

struct Inner<K, V, E> {
    entries: HashMap<K, Entry<V, E>>,
    next_generation: u64,
}

/// A keyed registry of settle-once values, allowing any number of concurrent
/// waiters on the same key to share a single eventual outcome.
///
/// Every key tracked by a [`PromiseMap`] is, at any point in time, in exactly
/// one of three states: pending (no outcome has arrived yet, but one or more
/// callers may be [`get`](PromiseMap::get)-ing it), fulfilled, or rejected.
/// Settling a key that nobody has asked for yet is perfectly fine — the
/// settled value is simply held until a caller asks.
///
/// With a configured `timeout`, settled entries are automatically forgotten
/// after that much time has elapsed past settlement, bounding the memory
/// this map holds on to for tasks nobody ever collects.
pub struct PromiseMap<K, V, E = std::convert::Infallible> {
    inner: Arc<Mutex<Inner<K, V, E>>>,
    timeout: Option<Duration>,
}

impl<K, V, E> Clone for PromiseMap<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            timeout: self.timeout,
        }
    }
}

impl<K, V, E> PromiseMap<K, V, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates a [`PromiseMap`] whose settled entries are held indefinitely.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                next_generation: 0,
            })),
            timeout: None,
        }
    }

    /// Creates a [`PromiseMap`] whose settled entries are automatically
    /// deleted `timeout` after they settle.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                next_generation: 0,
            })),
            timeout: Some(timeout),
        }
    }

    /// Waits for and returns the outcome associated with `key`, creating a
    /// pending entry for it if none exists yet.
    pub async fn get(&self, key: K) -> Outcome<V, E> {
        let receiver = {
            let mut inner = self.inner.lock();

            match inner.entries.get_mut(&key) {
                Some(entry) => match &mut entry.state {
                    EntryState::Settled(outcome) => return outcome.clone(),
                    EntryState::Pending(waiters) => {
                        let (tx, rx) = oneshot::channel();
                        waiters.push(tx);
                        rx
                    }
                },
                None => {
                    let (tx, rx) = oneshot::channel();
                    let generation = inner.next_generation;
                    inner.next_generation += 1;
                    inner.entries.insert(
                        key.clone(),
                        Entry {
                            state: EntryState::Pending(vec![tx]),
                            generation,
                        },
                    );
                    rx
                }
            }
        };

        receiver
            .await
            .unwrap_or(Err(PromiseError::Deleted))
    }

    /// Reports whether `key` is currently tracked by this map, in any state.
    pub fn has(&self, key: &K) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    /// Reports whether `key` is tracked and still pending.
    pub fn is_pending(&self, key: &K) -> bool {
        matches!(
            self.inner.lock().entries.get(key).map(|e| &e.state),
            Some(EntryState::Pending(_))
        )
    }

    /// Reports whether `key` is tracked and settled with a value.
    pub fn is_fulfilled(&self, key: &K) -> bool {
        matches!(
            self.inner.lock().entries.get(key).map(|e| &e.state),
            Some(EntryState::Settled(Ok(_)))
        )
    }

    /// Reports whether `key` is tracked and settled with a rejection.
    pub fn is_rejected(&self, key: &K) -> bool {
        matches!(
            self.inner.lock().entries.get(key).map(|e| &e.state),
            Some(EntryState::Settled(Err(_)))
        )
    }

    /// Settles `key` with `value`. Returns `true` if this call created the
    /// tracked entry (nobody had called [`get`](Self::get) or settled this
    /// key before), `false` if the entry already existed (whether pending or
    /// already settled — in the latter case, the stored value is replaced,
    /// but waiters that already observed the prior value are unaffected).
    pub fn resolve(&self, key: K, value: V) -> bool {
        self.settle(key, Ok(value))
    }

    /// Settles `key` with rejection reason `error`. See [`resolve`](Self::resolve)
    /// for the meaning of the returned flag.
    pub fn reject(&self, key: K, error: E) -> bool {
        self.settle(key, Err(PromiseError::Custom(error)))
    }

    /// Settles `key` with the eventual outcome of `future`, without blocking
    /// the caller on it. While `future` is still running, `key` remains
    /// pending.
    pub fn resolve_with<F>(&self, key: K, future: F) -> bool
    where
        F: Future<Output = Outcome<V, E>> + Send + 'static,
    {
        let created = self.ensure_pending(key.clone());

        let map = self.clone();
        tokio::spawn(async move {
            let outcome = future.await;
            map.settle(key, outcome);
        });

        created
    }

    /// Deletes `key`, rejecting any pending waiter with
    /// [`PromiseError::Deleted`]. Returns whether an entry was present to
    /// delete.
    pub fn delete(&self, key: &K) -> bool {
        let removed = self.inner.lock().entries.remove(key);

        match removed {
            Some(Entry {
                state: EntryState::Pending(waiters),
                ..
            }) => {
                for waiter in waiters {
                    let _ = waiter.send(Err(PromiseError::Deleted));
                }
                true
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Rejects every currently-pending key with `error`, leaving already
    /// settled keys untouched.
    pub fn reject_all(&self, error: E) {
        let mut inner = self.inner.lock();

        for entry in inner.entries.values_mut() {
            if let EntryState::Pending(waiters) = &mut entry.state {
                let waiters = std::mem::take(waiters);
                let outcome: Outcome<V, E> = Err(PromiseError::Custom(error.clone()));
                for waiter in waiters {
                    let _ = waiter.send(outcome.clone());
                }
                entry.state = EntryState::Settled(Err(PromiseError::Custom(error.clone())));
            }
        }
    }

    /// Rejects every pending key with [`PromiseError::Cleared`] and empties
    /// the map entirely, including already-settled entries.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();

        for (_, entry) in inner.entries.drain() {
            if let EntryState::Pending(waiters) = entry.state {
                for waiter in waiters {
                    let _ = waiter.send(Err(PromiseError::Cleared));
                }
            }
        }
    }

    fn ensure_pending(&self, key: K) -> bool {
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&key) {
            false
        } else {
            let generation = inner.next_generation;
            inner.next_generation += 1;
            inner.entries.insert(
                key,
                Entry {
                    state: EntryState::Pending(Vec::new()),
                    generation,
                },
            );
            true
        }
    }

    fn settle(&self, key: K, outcome: Outcome<V, E>) -> bool {
        let (created, generation, waiters) = {
            let mut inner = self.inner.lock();

            match inner.entries.remove(&key) {
                Some(entry) => {
                    let waiters = match entry.state {
                        EntryState::Pending(waiters) => waiters,
                        EntryState::Settled(_) => Vec::new(),
                    };

                    inner.entries.insert(
                        key.clone(),
                        Entry {
                            state: EntryState::Settled(outcome.clone()),
                            generation: entry.generation,
                        },
                    );

                    (false, entry.generation, waiters)
                }
                None => {
                    let generation = inner.next_generation;
                    inner.next_generation += 1;

                    inner.entries.insert(
                        key.clone(),
                        Entry {
                            state: EntryState::Settled(outcome.clone()),
                            generation,
                        },
                    );

                    (true, generation, Vec::new())
                }
            }
        };

        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }

        if let Some(timeout) = self.timeout {
            let map = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                map.expire(&key, generation);
            });
        }

        created
    }

    fn expire(&self, key: &K, generation: u64) {
        let mut inner = self.inner.lock();

        if let Some(entry) = inner.entries.get(key) {
            if entry.generation == generation {
                inner.entries.remove(key);
            }
        }
    }
}

impl<K, V, E> Default for PromiseMap<K, V, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[tokio::test]
    async fn get_then_resolve() {
        // Given
        let map: PromiseMap<String, i32, String> = PromiseMap::new();
        let key = "task-a".to_string();

        // When
        let waiter = tokio::spawn({
            let map = map.clone();
            let key = key.clone();
            async move { map.get(key).await }
        });
        tokio::task::yield_now().await;
        let created = map.resolve(key, 42);

        // Then
        assert!(created);
        assert_eq!(waiter.await.unwrap(), Ok(42));
    }

    #[tokio::test]
    async fn resolve_then_get() {
        // Given
        let map: PromiseMap<String, i32, String> = PromiseMap::new();
        let key = "task-b".to_string();

        // When
        let created = map.resolve(key.clone(), 7);
        let outcome = map.get(key).await;

        // Then
        assert!(created);
        assert_eq!(outcome, Ok(7));
    }

    #[tokio::test]
    async fn reject_all_spares_settled_entries() {
        // Given
        let map: PromiseMap<String, i32, String> = PromiseMap::new();
        map.resolve("settled".to_string(), 1);
        let pending = tokio::spawn({
            let map = map.clone();
            async move { map.get("pending".to_string()).await }
        });
        tokio::task::yield_now().await;

        // When
        map.reject_all("disconnecting".to_string());

        // Then
        assert_eq!(map.get("settled".to_string()).await, Ok(1));
        assert_eq!(
            pending.await.unwrap(),
            Err(PromiseError::Custom("disconnecting".to_string()))
        );
    }

    #[tokio::test]
    async fn clear_rejects_pending_with_cleared() {
        // Given
        let map: PromiseMap<String, i32, String> = PromiseMap::new();
        let pending = tokio::spawn({
            let map = map.clone();
            async move { map.get("x".to_string()).await }
        });
        tokio::task::yield_now().await;

        // When
        map.clear();

        // Then
        assert!(matches!(
            pending.await.unwrap(),
            Err(PromiseError::Cleared)
        ));
        assert!(!map.has(&"x".to_string()));
    }

    #[tokio::test]
    async fn entries_auto_delete_after_timeout() {
        // Given
        let map: PromiseMap<String, i32, String> = PromiseMap::with_timeout(Duration::from_millis(10));
        map.resolve("expiring".to_string(), 1);

        // Then
        assert!(map.has(&"expiring".to_string()));
        tokio::time::sleep(Duration::from_millis(15)).await;
        assert!(!map.has(&"expiring".to_string()));
    }

    #[tokio::test]
    async fn resolve_with_future_tracks_its_outcome() {
        // Given
        let map: PromiseMap<String, i32, String> = PromiseMap::new();

        // When
        map.resolve_with("deferred".to_string(), async { Ok(99) });

        // Then
        assert_eq!(map.get("deferred".to_string()).await, Ok(99));
    }
}

impl<E: PartialEq> PartialEq for PromiseError<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PromiseError::Cleared, PromiseError::Cleared) => true,
            (PromiseError::Deleted, PromiseError::Deleted) => true,
            (PromiseError::Custom(a), PromiseError::Custom(b)) => a == b,
            _ => false,
        }
    }
}
