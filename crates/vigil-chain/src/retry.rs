//! Bounded retry for chain queries.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use vigil_protocols::ChainError;

/// Run `op` up to `attempts` times, backing off between failures.
///
/// The call counts as failed only after every attempt is exhausted; the
/// last error is returned. `attempts` of zero is treated as one.
pub async fn with_retries<T, F, Fut>(attempts: u32, op: F) -> Result<T, ChainError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    let attempts = attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < attempts {
                    debug!("attempt {attempt}/{attempts} failed: {e}, retrying");
                    tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(ChainError::Timeout))
}
