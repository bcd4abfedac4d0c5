use crate::latch::Latch;
use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Creates new resources `R` on demand, on behalf of a [`ResourcePool`].
#[async_trait]
pub trait ResourceFactory<R>: Send + Sync {
    /// Creates a brand new resource.
    async fn create(&self) -> R;
}

/// Destroys resources `R` on behalf of a [`ResourcePool`], returning a
/// human-readable outcome description.
#[async_trait]
pub trait ResourceDestructor<R>: Send + Sync
where
    R: Send,
{
    /// Destroys the given resource.
    async fn destroy(&self, resource: R) -> String;
}

#[async_trait]
impl<R, F> ResourceFactory<R> for F
where
    F: Fn() -> R + Send + Sync,
    R: Send,
{
    async fn create(&self) -> R {
        (self)()
    }
}

struct Inner<R> {
    unused: VecDeque<R>,
    num_owned: usize,
    waiters: VecDeque<oneshot::Sender<R>>,
    draining: bool,
    destroy_outcomes: Vec<String>,
}

/// A bounded pool of resources `R`, borrowed and returned in strict FIFO
/// fairness.
///
/// The pool lazily creates resources up to `capacity`, reuses returned
/// resources in the order they were returned, and queues excess borrowers
/// until a resource comes back. Once [`destroy_all`](Self::destroy_all) is
/// called, the pool stops handing out resources; unused resources are
/// destroyed immediately, and in-use resources are destroyed as soon as they
/// are returned.
pub struct ResourcePool<R>
where
    R: Send + 'static,
{
    inner: Arc<SyncMutex<Inner<R>>>,
    capacity: usize,
    factory: Arc<dyn ResourceFactory<R>>,
    destructor: Arc<dyn ResourceDestructor<R>>,
    drained: Latch,
}

impl<R> Clone for ResourcePool<R>
where
    R: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            capacity: self.capacity,
            factory: Arc::clone(&self.factory),
            destructor: Arc::clone(&self.destructor),
            drained: self.drained.clone(),
        }
    }
}

impl<R> ResourcePool<R>
where
    R: Send + 'static,
{
    /// Builds a new pool with the given `capacity`, resource `factory`, and
    /// `destructor`.
    pub fn new(
        capacity: usize,
        factory: impl ResourceFactory<R> + 'static,
        destructor: impl ResourceDestructor<R> + 'static,
    ) -> Self {
        assert!(capacity > 0, "resource pool capacity must be at least 1");

        Self {
            inner: Arc::new(SyncMutex::new(Inner {
                unused: VecDeque::new(),
                num_owned: 0,
                waiters: VecDeque::new(),
                draining: false,
                destroy_outcomes: Vec::new(),
            })),
            capacity,
            factory: Arc::new(factory),
            destructor: Arc::new(destructor),
            drained: Latch::new(),
        }
    }

    /// Acquires a resource: the FIFO-oldest unused one if any exists,
    /// otherwise a newly-created one if capacity allows, otherwise waits
    /// until some other borrower [gives one back](Self::give_back).
    pub async fn get(&self) -> R {
        enum Decision<R> {
            Immediate(R),
            Create,
            Wait(oneshot::Receiver<R>),
        }

        let decision = {
            let mut inner = self.inner.lock();

            if let Some(resource) = inner.unused.pop_front() {
                Decision::Immediate(resource)
            } else if inner.num_owned < self.capacity {
                inner.num_owned += 1;
                Decision::Create
            } else {
                let (tx, rx) = oneshot::channel();
                inner.waiters.push_back(tx);
                Decision::Wait(rx)
            }
        };

        match decision {
            Decision::Immediate(resource) => resource,
            Decision::Create => self.factory.create().await,
            Decision::Wait(rx) => rx
                .await
                .expect("resource pool waiter dropped without a resource"),
        }
    }

    /// Returns a resource previously obtained from [`get`](Self::get) back to
    /// the pool. If the pool is draining, the resource is destroyed instead.
    ///
    /// Returns an error if this resource was not created by this pool's
    /// current lifetime (i.e. it would overfill the pool's accounting).
    pub fn give_back(&self, resource: R) -> Result<(), ForeignResourceError> {
        let mut inner = self.inner.lock();

        if inner.num_owned == 0 {
            return Err(ForeignResourceError);
        }

        if inner.draining {
            inner.num_owned -= 1;
            drop(inner);

            let pool = self.clone();
            tokio::spawn(async move {
                let outcome = pool.destructor.destroy(resource).await;
                let mut inner = pool.inner.lock();
                inner.destroy_outcomes.push(outcome);
                if inner.num_owned == 0 {
                    drop(inner);
                    pool.drained.release();
                }
            });

            return Ok(());
        }

        if let Some(waiter) = inner.waiters.pop_front() {
            drop(inner);
            let _ = waiter.send(resource);
            return Ok(());
        }

        inner.unused.push_back(resource);

        Ok(())
    }

    /// Acquires a resource, runs `body` with it, and returns the resource to
    /// the pool regardless of whether `body` succeeded, propagating `body`'s
    /// outcome.
    pub async fn use_with<T, Fut>(&self, body: impl FnOnce(R) -> Fut) -> T
    where
        Fut: Future<Output = (R, T)>,
    {
        let resource = self.get().await;
        let (resource, output) = body(resource).await;
        let _ = self.give_back(resource);
        output
    }

    /// Schedules `resource` to be given back once `completion` settles,
    /// regardless of `completion`'s outcome.
    pub fn give_back_after<T>(&self, completion: impl Future<Output = T> + Send + 'static, resource: R)
    where
        T: Send + 'static,
    {
        let pool = self.clone();
        tokio::spawn(async move {
            completion.await;
            let _ = pool.give_back(resource);
        });
    }

    /// The number of resources currently owned by this pool (in use plus
    /// unused).
    pub fn num_owned(&self) -> usize {
        self.inner.lock().num_owned
    }

    /// The number of resources currently borrowed and not yet given back.
    pub fn num_in_use(&self) -> usize {
        let inner = self.inner.lock();
        inner.num_owned - inner.unused.len()
    }

    /// Stops handing out further resources, destroys every currently-unused
    /// resource, and schedules destruction of every in-use resource as soon
    /// as it is returned. Resolves once every owned resource has been
    /// destroyed, in the order each was destroyed.
    pub async fn destroy_all(&self) -> Vec<String> {
        let gate = self.drained.gate();

        let unused = {
            let mut inner = self.inner.lock();
            inner.draining = true;
            std::mem::take(&mut inner.unused)
        };

        for resource in unused {
            let outcome = self.destructor.destroy(resource).await;

            let mut inner = self.inner.lock();
            inner.num_owned -= 1;
            inner.destroy_outcomes.push(outcome);

            if inner.num_owned == 0 {
                drop(inner);
                self.drained.release();
            }
        }

        // Wait for any still-in-use resources to be returned and destroyed
        // by `give_back`, unless everything was already unused above.
        if self.inner.lock().num_owned > 0 {
            gate.opened().await;
        }

        self.inner.lock().destroy_outcomes.clone()
    }
}

/// Returned when a resource is given back to a pool that did not create it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("resource was not issued by this pool")]
pub struct ForeignResourceError;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFactory {
        next: AtomicUsize,
    }

    #[async_trait]
    impl ResourceFactory<usize> for CountingFactory {
        async fn create(&self) -> usize {
            self.next.fetch_add(1, Ordering::SeqCst)
        }
    }

    struct RecordingDestructor {
        order: Arc<SyncMutex<Vec<usize>>>,
    }

    #[async_trait]
    impl ResourceDestructor<usize> for RecordingDestructor {
        async fn destroy(&self, resource: usize) -> String {
            self.order.lock().push(resource);
            "destroyed".to_string()
        }
    }

    fn pool(capacity: usize) -> (ResourcePool<usize>, Arc<SyncMutex<Vec<usize>>>) {
        let order = Arc::new(SyncMutex::new(Vec::new()));
        let pool = ResourcePool::new(
            capacity,
            CountingFactory {
                next: AtomicUsize::new(0),
            },
            RecordingDestructor {
                order: Arc::clone(&order),
            },
        );
        (pool, order)
    }

    #[tokio::test]
    async fn reuses_resources_in_fifo_order_of_return() {
        // Given
        let (pool, _) = pool(4);
        let first = pool.get().await;
        let second = pool.get().await;
        let third = pool.get().await;
        assert_eq!((first, second, third), (0, 1, 2));

        // When: return out of acquisition order
        pool.give_back(second).unwrap();
        pool.give_back(first).unwrap();
        pool.give_back(third).unwrap();

        // Then: re-acquisition follows FIFO-of-returns
        assert_eq!(pool.get().await, 1);
        assert_eq!(pool.get().await, 0);
        assert_eq!(pool.get().await, 2);
    }

    #[tokio::test]
    async fn give_back_rejects_when_pool_owns_nothing() {
        // Given
        let (pool, _) = pool(1);

        // Then
        assert!(pool.give_back(0).is_err());
    }

    #[tokio::test]
    async fn use_with_returns_resource_on_success_and_failure() {
        // Given
        let (pool, _) = pool(1);

        // When
        let ok: Result<(), ()> = pool
            .use_with(|r| async move { (r, Ok(())) })
            .await;
        assert!(ok.is_ok());

        let failed: Result<(), &str> = pool
            .use_with(|r| async move { (r, Err("boom")) })
            .await;
        assert_eq!(failed, Err("boom"));

        // Then: the single resource is still owned and reusable
        assert_eq!(pool.num_owned(), 1);
        let _ = pool.get().await;
    }

    #[tokio::test]
    async fn blocks_beyond_capacity_until_give_back() {
        // Given
        let (pool, _) = pool(1);
        let resource = pool.get().await;

        // When
        let waiter = tokio::spawn({
            let pool = pool.clone();
            async move { pool.get().await }
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        // Then
        pool.give_back(resource).unwrap();
        assert_eq!(waiter.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn destroy_all_defers_in_use_resources() {
        // Given
        let (pool, order) = pool(2);
        let held = pool.get().await;
        let unused = pool.get().await;
        pool.give_back(unused).unwrap();

        // When
        let destroy_future = tokio::spawn({
            let pool = pool.clone();
            async move { pool.destroy_all().await }
        });
        tokio::task::yield_now().await;

        // Then: the unused resource is destroyed immediately, the held one is not
        assert_eq!(order.lock().clone(), vec![1]);

        // When
        pool.give_back(held).unwrap();
        let outcomes = destroy_future.await.unwrap();

        // Then
        assert_eq!(outcomes, vec!["destroyed".to_string(), "destroyed".to_string()]);
        assert_eq!(order.lock().clone(), vec![1, 0]);
    }

    #[tokio::test]
    async fn use_with_destroyed_after_drain() {
        // Given
        let (pool, _) = pool(1);
        let _ = pool.destroy_all().await;

        // Then: nothing left owned
        assert_eq!(pool.num_owned(), 0);
    }
}
