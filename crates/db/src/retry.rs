use std::{future::Future, time::Duration};

use sea_orm::DbErr;

const MAX_ATTEMPTS: usize = 3;
const RETRY_DELAY_MS: u64 = 100;

/// Re-runs `op` when it fails with a connection-reset error, up to
/// three attempts with a fixed 100ms pause between them. Every other
/// error propagates unchanged on the first attempt.
pub async fn retry_on_connection_reset<T, F, Fut>(mut op: F) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    for attempt in 1..=MAX_ATTEMPTS {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if is_connection_reset(&err) && attempt < MAX_ATTEMPTS => {
                tracing::warn!(
                    "connection reset on attempt {}/{}, retrying: {}",
                    attempt,
                    MAX_ATTEMPTS,
                    err
                );
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("retry loop returns on success or error")
}

pub fn is_connection_reset(err: &DbErr) -> bool {
    let message = err.to_string().to_lowercase();
    message.contains("connection reset") || message.contains("econnreset")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use sea_orm::DbErr;

    use super::retry_on_connection_reset;

    fn reset_err() -> DbErr {
        DbErr::Conn(sea_orm::RuntimeErr::Internal(
            "Connection reset by peer (os error 104)".to_string(),
        ))
    }

    #[tokio::test]
    async fn retries_connection_reset_until_success() {
        let calls = AtomicUsize::new(0);
        let result = retry_on_connection_reset(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(reset_err())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_three_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), DbErr> = retry_on_connection_reset(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(reset_err()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn other_errors_propagate_immediately() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), DbErr> = retry_on_connection_reset(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DbErr::RecordNotFound("missing".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(DbErr::RecordNotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
