//! Storage boundary.
//!
//! All database access goes through this module. Every call runs under a
//! bounded timeout so no request blocks indefinitely on the pool; an elapsed
//! timeout or a connection-level failure surfaces as the retryable
//! `AppError::Unavailable`, which callers must keep distinct from `NotFound`.

pub mod tasks;
pub mod users;

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Upper bound for a single storage call.
const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs a storage future under [`STORE_TIMEOUT`].
pub(crate) async fn bounded<T, E, F>(op: &'static str, fut: F) -> Result<T, AppError>
where
    E: Into<AppError>,
    F: Future<Output = Result<T, E>>,
{
    bounded_with(STORE_TIMEOUT, op, fut).await
}

async fn bounded_with<T, E, F>(limit: Duration, op: &'static str, fut: F) -> Result<T, AppError>
where
    E: Into<AppError>,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(AppError::Unavailable(format!("{} timed out", op))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test(actix_rt::test)]
    async fn test_bounded_times_out_as_unavailable() {
        let result: Result<(), AppError> = bounded_with(
            Duration::from_millis(10),
            "hang",
            std::future::pending::<Result<(), sqlx::Error>>(),
        )
        .await;

        match result {
            Err(AppError::Unavailable(msg)) => assert!(msg.contains("hang")),
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_bounded_passes_through_result() {
        let result =
            bounded_with(Duration::from_millis(10), "ok", async { Ok::<_, sqlx::Error>(7) }).await;
        assert_eq!(result.unwrap(), 7);

        let result: Result<i32, AppError> = bounded_with(Duration::from_millis(10), "err", async {
            Err(sqlx::Error::RowNotFound)
        })
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
