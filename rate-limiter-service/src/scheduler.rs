//! Background loops for the refresh and notification cycles.

use crate::engine::LimitCache;
use crate::notifier::Notifier;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Refreshes the cache every `period` until `shutdown` fires.
pub fn spawn_refresh_task(
    cache: Arc<LimitCache>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    spawn_periodic("refresh", period, shutdown, move || {
        let cache = Arc::clone(&cache);
        async move {
            if let Err(e) = cache.refresh().await {
                tracing::error!(stage = e.stage(), error = %e, "Cache refresh failed");
            }
        }
    })
}

/// Runs a notification cycle every `period` until `shutdown` fires.
pub fn spawn_notifier_task(
    notifier: Arc<Notifier>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    spawn_periodic("notifier", period, shutdown, move || {
        let notifier = Arc::clone(&notifier);
        async move {
            if let Err(e) = notifier.run().await {
                tracing::error!(error = %e, "Notification cycle failed");
            }
        }
    })
}

/// Waits for a periodic task to end. Returns `false`, after logging, when the
/// task panicked or was aborted.
pub async fn join_task(name: &'static str, handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(
                task = name,
                error = %e,
                panicked = e.is_panic(),
                "Periodic task ended abnormally"
            );
            false
        }
    }
}

// The first run happens one full period after start. A run is awaited before
// the next tick is taken, so runs of the same task never overlap.
fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    shutdown: CancellationToken,
    mut run: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(task = name, period_secs = period.as_secs(), "Periodic task started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => run().await,
            }
        }

        tracing::info!(task = name, "Periodic task stopped");
    })
}
