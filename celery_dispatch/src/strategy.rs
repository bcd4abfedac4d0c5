use std::sync::atomic::{AtomicUsize, Ordering};

/// Chooses which broker a [`FailoverDispatcher`](crate::FailoverDispatcher)
/// should try next, given how many brokers it holds and which indices have
/// already failed during the current `publish` call.
pub trait FailoverStrategy: Send + Sync {
    /// Returns the index of the next broker to try, excluding every index
    /// already present in `tried`, or `None` once every broker has been
    /// tried.
    fn next(&self, broker_count: usize, tried: &[usize]) -> Option<usize>;
}

impl FailoverStrategy for Box<dyn FailoverStrategy> {
    fn next(&self, broker_count: usize, tried: &[usize]) -> Option<usize> {
        (**self).next(broker_count, tried)
    }
}

/// Cycles through brokers starting from index 0.
///
/// The starting point advances by one on every fresh `publish` call (not on
/// retries within the same call), spreading traffic evenly across a healthy
/// group; a retry within one call simply walks forward from that call's
/// starting point, skipping indices already tried.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    /// Creates a new round-robin strategy starting at index 0.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FailoverStrategy for RoundRobin {
    fn next(&self, broker_count: usize, tried: &[usize]) -> Option<usize> {
        if broker_count == 0 || tried.len() >= broker_count {
            return None;
        }

        let start = if tried.is_empty() {
            self.cursor.fetch_add(1, Ordering::Relaxed) % broker_count
        } else {
            self.cursor.load(Ordering::Relaxed) % broker_count
        };

        (0..broker_count)
            .map(|offset| (start + offset) % broker_count)
            .find(|index| !tried.contains(index))
    }
}
