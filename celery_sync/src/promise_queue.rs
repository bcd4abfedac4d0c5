use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

/// A strictly FIFO queue of not-yet-settled futures.
///
/// Callers [`push`](Self::push) a future onto the back of the queue and get a
/// handle to await it; some other task later settles the *head* of the queue
/// with [`resolve_one`](Self::resolve_one) or [`reject_one`](Self::reject_one),
/// in the order the futures were pushed.
pub struct PromiseQueue<V, E = std::convert::Infallible> {
    waiters: Arc<Mutex<VecDeque<oneshot::Sender<Result<V, E>>>>>,
}

impl<V, E> Clone for PromiseQueue<V, E> {
    fn clone(&self) -> Self {
        Self {
            waiters: Arc::clone(&self.waiters),
        }
    }
}

impl<V, E> PromiseQueue<V, E>
where
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            waiters: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Enqueues a new pending future at the back of the queue and returns a
    /// future that resolves when this entry is eventually settled.
    pub fn push(&self) -> impl Future<Output = Result<V, E>> {
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().push_back(tx);

        async move { rx.await.expect("promise queue entry dropped without settling") }
    }

    /// Settles the oldest still-pending entry with `value`. Returns `true`
    /// if an entry was settled, `false` if the queue was empty.
    pub fn resolve_one(&self, value: V) -> bool {
        self.settle_one(Ok(value))
    }

    /// Settles the oldest still-pending entry with rejection `error`.
    /// Returns `true` if an entry was settled, `false` if the queue was
    /// empty.
    pub fn reject_one(&self, error: E) -> bool {
        self.settle_one(Err(error))
    }

    /// Settles the oldest still-pending entry with the outcome of `future`,
    /// once that future resolves. The head of the queue follows `future`
    /// rather than a value already in hand.
    ///
    /// Unlike [`resolve_one`](Self::resolve_one), this spawns a task and
    /// returns immediately; it does not report whether an entry was present
    /// to settle, since the queue may still be empty at spawn time and gain
    /// an entry before `future` resolves.
    pub fn resolve_one_with<F>(&self, future: F)
    where
        F: Future<Output = Result<V, E>> + Send + 'static,
    {
        let queue = self.clone();
        tokio::spawn(async move {
            let outcome = future.await;
            queue.settle_one(outcome);
        });
    }

    /// Settles every currently-pending entry with `value`, draining the
    /// queue. Returns the number of entries settled.
    pub fn resolve_all(&self, value: V) -> usize {
        self.settle_all(Ok(value))
    }

    /// Settles every currently-pending entry with rejection `error`,
    /// draining the queue. Returns the number of entries settled.
    pub fn reject_all(&self, error: E) -> usize {
        self.settle_all(Err(error))
    }

    /// Reports the number of entries still awaiting settlement.
    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    /// Reports whether the queue has no pending entries.
    pub fn is_empty(&self) -> bool {
        self.waiters.lock().is_empty()
    }

    fn settle_one(&self, outcome: Result<V, E>) -> bool {
        let waiter = self.waiters.lock().pop_front();

        match waiter {
            Some(waiter) => {
                let _ = waiter.send(outcome);
                true
            }
            None => false,
        }
    }

    fn settle_all(&self, outcome: Result<V, E>) -> usize {
        let drained: VecDeque<_> = std::mem::take(&mut *self.waiters.lock());
        let count = drained.len();

        for waiter in drained {
            let _ = waiter.send(outcome.clone());
        }

        count
    }
}

impl<V, E> Default for PromiseQueue<V, E>
where
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

    #[tokio::test]
    async fn settles_in_fifo_order() {
        // Given
        let queue: PromiseQueue<i32, String> = PromiseQueue::new();
        let first = queue.push();
        let second = queue.push();

        // When
        assert!(queue.resolve_one(0));
        assert!(queue.resolve_one(1));

        // Then
        assert_eq!(first.await, Ok(0));
        assert_eq!(second.await, Ok(1));
        assert!(!queue.resolve_one(2));
    }

    #[tokio::test]
    async fn resolve_all_settles_every_pending_entry() {
        // Given
        let queue: PromiseQueue<i32, String> = PromiseQueue::new();
        let waiters: Vec<_> = (0..5).map(|_| queue.push()).collect();

        // When
        let settled_count = queue.resolve_all(9);

        // Then
        assert_eq!(settled_count, 5);
        for waiter in waiters {
            assert_eq!(waiter.await, Ok(9));
        }
    }

    #[tokio::test]
    async fn resolve_one_with_future_tracks_its_outcome() {
        // Given
        let queue: PromiseQueue<i32, String> = PromiseQueue::new();
        let head = queue.push();

        // When
        queue.resolve_one_with(async { Ok(42) });

        // Then
        assert_eq!(head.await, Ok(42));
    }

    #[tokio::test]
    async fn reject_one_rejects_the_head() {
        // Given
        let queue: PromiseQueue<i32, String> = PromiseQueue::new();
        let first = queue.push();

        // When
        assert!(queue.reject_one("broken".to_string()));

        // Then
        assert_eq!(first.await, Err("broken".to_string()));
    }
}
