use std::{error::Error, future::Future, time::Duration};
use thiserror::Error;

/// Returned when a conditional balance update touched no row, meaning another
/// request changed the balance between our read and our write.
#[derive(Debug, Error)]
#[error("concurrent balance update conflict")]
pub struct ConflictError;

const MAX_ATTEMPTS: u32 = 8;
const BASE_BACKOFF: Duration = Duration::from_millis(20);

/// Retries the callback as long as it returns an error whose chain includes a
/// [`ConflictError`], backing off exponentially between attempts. Any other
/// error is returned immediately. After [`MAX_ATTEMPTS`] the callback runs one
/// final time and its result is returned as-is.
pub async fn retry_loop<F: Future<Output = Result<T, E>>, T, E: Error + 'static>(
    mut cb: impl FnMut() -> F,
) -> Result<T, E> {
    for attempt in 0..MAX_ATTEMPTS {
        match cb().await {
            Ok(result) => return Ok(result),
            Err(e) if is_conflict(Some(&e)) => {
                let backoff = BASE_BACKOFF * 2u32.pow(attempt);
                log::info!("balance update conflict, retrying in {:?}", backoff);
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
    cb().await
}

fn is_conflict(e: Option<&(dyn Error + 'static)>) -> bool {
    e.map(|e| e.is::<ConflictError>() || is_conflict(e.source()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Error)]
    enum TestError {
        #[error("{0:?}")]
        Conflict(#[from] ConflictError),
        #[error("fatal")]
        Fatal,
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = Cell::new(0);
        let result: Result<i32, TestError> = retry_loop(|| async {
            calls.set(calls.get() + 1);
            Ok(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn non_conflict_error_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<i32, TestError> = retry_loop(|| async {
            calls.set(calls.get() + 1);
            Err(TestError::Fatal)
        })
        .await;
        assert!(matches!(result, Err(TestError::Fatal)));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn conflict_is_retried_until_success() {
        let calls = Cell::new(0);
        let result: Result<i32, TestError> = retry_loop(|| async {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(ConflictError.into())
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn conflict_surfaces_after_retries_are_exhausted() {
        let calls = Cell::new(0);
        let result: Result<i32, TestError> = retry_loop(|| async {
            calls.set(calls.get() + 1);
            Err(TestError::from(ConflictError))
        })
        .await;
        assert!(matches!(result, Err(TestError::Conflict(_))));
        assert_eq!(calls.get(), MAX_ATTEMPTS as i32 + 1);
    }
}
