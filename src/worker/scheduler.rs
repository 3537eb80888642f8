//! Running tasks on a fixed period until shutdown.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// One unit of periodic background work.
///
/// `run` handles its own errors; a failing pass is logged and the next pass
/// happens on schedule.
pub trait PeriodicTask: Send {
    fn name(&self) -> &'static str;

    fn run(&mut self) -> impl Future<Output = ()> + Send;
}

/// Runs `task` immediately and then every `period` until `shutdown` fires.
///
/// A pass that is already running is allowed to finish; tasks that may block
/// for long (tracker retries) observe the same token themselves. Passes that
/// overrun the period delay the next one instead of bunching up.
pub async fn run_periodic<T: PeriodicTask>(
    mut task: T,
    period: Duration,
    shutdown: CancellationToken,
) -> usize {
    let name = task.name();
    let mut ticks = tokio::time::interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(task = name, period_secs = period.as_secs(), "periodic task started");

    let mut passes = 0;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticks.tick() => {}
        }
        debug!(task = name, pass = passes + 1, "running periodic task");
        task.run().await;
        passes += 1;
    }

    info!(task = name, passes, "periodic task stopped");
    passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(Arc<AtomicUsize>);

    impl PeriodicTask for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn run(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_immediately_then_on_each_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run_periodic(
            Counting(count.clone()),
            Duration::from_secs(60),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(150)).await;
        shutdown.cancel();

        assert_eq!(handle.await.unwrap(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_runs_nothing() {
        let count = Arc::new(AtomicUsize::new(0));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let passes = run_periodic(Counting(count.clone()), Duration::from_secs(1), shutdown).await;

        assert_eq!(passes, 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
