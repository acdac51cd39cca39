use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

/// Fixed minimum spacing between upstream requests. Callers queue on the
/// lock, so the spacing holds across every task sharing the throttle.
#[derive(Debug)]
pub struct RequestThrottle {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub async fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_requests_are_spaced() {
        let throttle = RequestThrottle::new(Duration::from_millis(20));
        let start = Instant::now();
        for _ in 0..3 {
            throttle.wait().await;
        }
        // First request goes out immediately, the next two wait.
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let throttle = RequestThrottle::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..100 {
            throttle.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
