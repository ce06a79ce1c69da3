use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::FetchError;

const MAX_ATTEMPTS: u32 = 4;
const BASE_DELAY: Duration = Duration::from_millis(250);

/// Whether an error is worth retrying the same request for.
pub fn is_retriable(err: &FetchError) -> bool {
    err.is_retriable()
}

/// Retries `operation` with exponential backoff and jitter, up to
/// [`MAX_ATTEMPTS`] total attempts, stopping as soon as `is_retriable`
/// returns `false` for the latest error.
pub async fn retry_with_backoff<F, Fut, T>(mut operation: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_ATTEMPTS && is_retriable(&err) => {
                let delay = backoff_delay(attempt);
                tracing::warn!(attempt, ?delay, error = %err, "retrying fetch after transient error");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    let base = BASE_DELAY * 2u32.saturating_pow(exponent);
    let jitter_ms = rand::rng().random_range(0..100);
    base + Duration::from_millis(jitter_ms)
}
