//! Waiting for the tool host to come up.
//!
//! Tool servers are launched in the background, so the first listings are
//! often empty. The poller keeps asking with exponential backoff until some
//! tools show up or the retry budget runs out.

use std::time::Duration;

use backoff::ExponentialBackoffBuilder;

use crate::tool::{Error, ToolInfo};

/// Controls how the tool listing is retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound of the delay between two attempts.
    pub max_delay: Duration,
    /// Retries after the first attempt; `0` lists exactly once.
    pub max_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            max_retries: 8,
        }
    }
}

/// Lists tools until the listing is non-empty or the policy gives up.
///
/// Listing errors are treated as "not available yet". When all attempts
/// are used up, an empty list is returned.
pub async fn poll_tools<F, Fut>(policy: &PollPolicy, mut list: F) -> Vec<ToolInfo>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<ToolInfo>, Error>>,
{
    let backoff = ExponentialBackoffBuilder::new()
        .with_initial_interval(policy.initial_delay)
        .with_multiplier(2.0)
        .with_max_interval(policy.max_delay)
        .with_randomization_factor(0.0)
        .with_max_elapsed_time(None)
        .build();

    let max_retries = policy.max_retries;
    let mut attempts = 0;
    let result = backoff::future::retry(backoff, || {
        attempts += 1;
        let attempt = attempts;
        let fut = list();
        async move {
            let err = match fut.await {
                Ok(tools) if !tools.is_empty() => {
                    debug!("{} tool(s) available after {attempt} attempt(s)", tools.len());
                    return Ok(tools);
                }
                Ok(_) => Error::unavailable().with_reason("no tools listed yet"),
                Err(err) => err,
            };
            trace!("tool listing attempt {attempt} failed: {err}");
            if attempt > max_retries {
                Err(backoff::Error::permanent(err))
            } else {
                Err(backoff::Error::transient(err))
            }
        }
    })
    .await;

    result.unwrap_or_else(|err| {
        warn!("no tools available, giving up: {err}");
        vec![]
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use serde_json::Value;
    use tokio::time::Instant;

    use super::*;

    fn tool(name: &str) -> ToolInfo {
        ToolInfo {
            name: name.to_owned(),
            description: String::new(),
            input_schema: Value::Null,
            server_name: None,
        }
    }

    // Timers fire on millisecond ticks, so allow a little slack.
    fn assert_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(50),
            "elapsed {elapsed:?}, expected {expected:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_first_listing() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();
        let tools = poll_tools(&PollPolicy::default(), || {
            let calls = Arc::clone(&calls);
            async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => Ok(vec![]),
                    1 => Err(Error::unavailable()),
                    _ => Ok(vec![tool("search_files")]),
                }
            }
        })
        .await;

        assert_eq!(tools, [tool("search_files")]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 500ms, then 1s.
        assert_elapsed(start, Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = PollPolicy {
            max_retries: 4,
            ..Default::default()
        };
        let start = Instant::now();
        let tools = poll_tools(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(vec![]) }
        })
        .await;

        assert!(tools.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // 0.5s + 1s + 2s + 4s.
        assert_elapsed(start, Duration::from_millis(7500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_capped() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();
        let tools = poll_tools(&PollPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::unavailable()) }
        })
        .await;

        assert!(tools.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 9);
        // 0.5 + 1 + 2 + 4, then 5s four times.
        assert_elapsed(start, Duration::from_millis(27500));
    }
}
