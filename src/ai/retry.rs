use std::future::Future;
use std::time::Duration;

use crate::error::GenerationError;

const MAX_ATTEMPTS: u32 = 3;
const MIN_DELAY: Duration = Duration::from_secs(30);
const DEFAULT_DELAY: Duration = Duration::from_secs(60);

// Retries a single generator call while it is rate limited. Every other
// failure is returned on the spot.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    // Lower bound on any server-suggested delay.
    pub min_delay: Duration,
    // Used when the server suggests nothing.
    pub default_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            min_delay: MIN_DELAY,
            default_delay: DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(suggested) => suggested.max(self.min_delay),
            None => self.default_delay,
        }
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut call: F) -> Result<T, GenerationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(GenerationError::RateLimited { retry_after }) => {
                    if attempt >= self.max_attempts {
                        tracing::error!("{} still rate limited after {} attempts", label, attempt);
                        return Err(GenerationError::RetryExhausted {
                            attempts: attempt,
                            last: Box::new(GenerationError::RateLimited { retry_after }),
                        });
                    }
                    let delay = self.delay_for(retry_after);
                    tracing::warn!(
                        "{} rate limited (attempt {}/{}), waiting {:?}",
                        label,
                        attempt,
                        self.max_attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
