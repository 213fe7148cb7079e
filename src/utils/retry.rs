// Retry with exponential backoff

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

const MAX_BACKOFF_EXPONENT: u32 = 5;

/// Runs `operation` up to `max_attempts` times, sleeping 1s, 2s, 4s, ...
/// (capped at 32s) between failures. Returns the last error.
pub async fn with_retry<F, Fut, T, E>(operation: F, max_attempts: u32) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_base(operation, max_attempts, Duration::from_secs(1)).await
}

pub async fn with_retry_base<F, Fut, T, E>(
    mut operation: F,
    max_attempts: u32,
    base_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                attempt += 1;
                if attempt >= max_attempts.max(1) {
                    return Err(error);
                }

                let delay = base_delay * 2u32.pow((attempt - 1).min(MAX_BACKOFF_EXPONENT));
                debug!(attempt, ?delay, %error, "Retrying after failure");
                sleep(delay).await;
            }
        }
    }
}
