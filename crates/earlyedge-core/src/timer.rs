//! Display timer for the active trial.
//!
//! The ticker only feeds display surfaces; the response time that is
//! actually transmitted is always the wall-clock delta computed at
//! submission. The two may diverge and the ticker value must never win.

use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A cancellable periodic task that publishes elapsed seconds for the
/// active trial. Cancelled (dropped) on every phase transition.
pub struct TrialTicker {
    handle: JoinHandle<()>,
    elapsed: watch::Receiver<f64>,
}

impl TrialTicker {
    /// Start ticking from now at the given period.
    pub fn start(period: Duration) -> Self {
        let started = Instant::now();
        let (tx, rx) = watch::channel(0.0f64);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick fires immediately; skip it so 0.0 stays until
            // one period has passed.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(started.elapsed().as_secs_f64()).is_err() {
                    break;
                }
            }
        });

        Self {
            handle,
            elapsed: rx,
        }
    }

    /// Last published elapsed value, in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        *self.elapsed.borrow()
    }

    /// Stop the ticker.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for TrialTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ticker_advances() {
        let ticker = TrialTicker::start(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(ticker.elapsed_secs() > 0.0);
    }

    #[tokio::test]
    async fn cancel_freezes_the_value() {
        let ticker = TrialTicker::start(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;
        let rx = ticker.elapsed.clone();
        ticker.cancel();
        let frozen = *rx.borrow();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(*rx.borrow(), frozen);
    }
}
