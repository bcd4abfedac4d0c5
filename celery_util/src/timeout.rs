use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Indicates that a future did not settle within the allotted duration.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("operation timed out")]
pub struct TimeoutError;

/// Returns a future that resolves to [`TimeoutError`] after `duration`
/// elapses. Used to build up races against other futures.
pub async fn timer(duration: Duration) -> TimeoutError {
    tokio::time::sleep(duration).await;
    TimeoutError
}

/// Awaits `future`, racing it against `duration` when given. With no
/// duration, this is equivalent to awaiting `future` directly.
pub async fn with_timeout<F, T>(future: F, duration: Option<Duration>) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    match duration {
        None => Ok(future.await),
        Some(duration) => tokio::time::timeout(duration, future)
            .await
            .map_err(|_| TimeoutError),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn resolves_before_timeout() {
        let result = with_timeout(async { 42 }, Some(Duration::from_millis(50))).await;

        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn times_out() {
        let result = with_timeout(
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                42
            },
            Some(Duration::from_millis(5)),
        )
        .await;

        assert_eq!(result, Err(TimeoutError));
    }

    #[tokio::test]
    async fn no_duration_always_resolves() {
        let result = with_timeout(async { "done" }, None).await;

        assert_eq!(result, Ok("done"));
    }
}
