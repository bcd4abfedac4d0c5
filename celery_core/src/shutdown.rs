use tokio_util::sync::CancellationToken;

/// A per-instance cooperative shutdown signal.
///
/// Each broker or backend owns one `Shutdown`. Calling [`terminate`](Self::terminate)
/// marks the instance as ending: in-flight suspension points observe
/// [`terminated`](Self::terminated) resolving and reject with a
/// [`DisconnectedError`](crate::DisconnectedError), and any code path that
/// checks [`is_terminated`](Self::is_terminated) before starting new work
/// refuses it. Unlike a process-wide shutdown signal, this is scoped to one
/// client instance, so ending one broker never disturbs another.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Creates a fresh, not-yet-terminated signal.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Reports whether [`terminate`](Self::terminate) has been called.
    pub fn is_terminated(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Marks this instance as ending. Idempotent.
    pub fn terminate(&self) {
        self.token.cancel();
    }

    /// Resolves once [`terminate`](Self::terminate) has been called.
    pub async fn terminated(&self) {
        self.token.cancelled().await;
    }

    /// Returns a token that resolves alongside this signal, for use in
    /// `tokio::select!` against other suspension points.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn terminated_resolves_after_terminate() {
        // Given
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_terminated());

        // When
        shutdown.terminate();

        // Then
        shutdown.terminated().await;
        assert!(shutdown.is_terminated());
    }

    #[test]
    fn terminate_is_idempotent() {
        let shutdown = Shutdown::new();
        shutdown.terminate();
        shutdown.terminate();
        assert!(shutdown.is_terminated());
    }
}
