use crate::core::tracker::{Handled, SeenTracker};
use crate::core::{Membership, PostStream, SeenStore};
use crate::utils::monitor::SystemMonitor;
use std::future::Future;

/// Counters for one listener run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub posts: u64,
    pub first_time: u64,
    pub repeat: u64,
    pub store_failures: u64,
    pub notices: u64,
}

impl ListenerStats {
    fn record(&mut self, handled: &Handled) {
        match handled {
            Handled::Post(Membership::FirstTime { .. }) => {
                self.posts += 1;
                self.first_time += 1;
            }
            Handled::Post(Membership::Repeat) => {
                self.posts += 1;
                self.repeat += 1;
            }
            Handled::StoreFailed => {
                self.posts += 1;
                self.store_failures += 1;
            }
            Handled::Notice(_) => self.notices += 1,
        }
    }
}

/// Drives the stream into the tracker, one message at a time.
pub struct Listener<P: PostStream, S: SeenStore> {
    stream: P,
    tracker: SeenTracker<S>,
    monitor: SystemMonitor,
    stats_every: u64,
}

impl<P: PostStream, S: SeenStore> Listener<P, S> {
    pub fn new(stream: P, tracker: SeenTracker<S>) -> Self {
        Self::new_with_monitoring(stream, tracker, false)
    }

    pub fn new_with_monitoring(stream: P, tracker: SeenTracker<S>, enable_monitoring: bool) -> Self {
        Self {
            stream,
            tracker,
            monitor: SystemMonitor::new(enable_monitoring),
            stats_every: 1000,
        }
    }

    /// How many posts between two process-stats log lines (monitoring only).
    pub fn with_stats_every(mut self, posts: u64) -> Self {
        self.stats_every = posts.max(1);
        self
    }

    pub fn tracker(&self) -> &SeenTracker<S> {
        &self.tracker
    }

    /// Runs until Ctrl+C or until the stream ends.
    pub async fn run(&mut self) -> ListenerStats {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received, stopping gracefully...");
        })
        .await
    }

    pub async fn run_until<F>(&mut self, shutdown: F) -> ListenerStats
    where
        F: Future<Output = ()>,
    {
        tracing::info!("🚀 Listening for posts");
        self.monitor.log_stats("Start");

        let mut stats = ListenerStats::default();
        tokio::pin!(shutdown);

        loop {
            let message = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                message = self.stream.next_message() => message,
            };

            let Some(message) = message else {
                tracing::warn!("Stream ended");
                break;
            };

            let handled = self.tracker.handle(&message).await;
            stats.record(&handled);

            if self.monitor.is_enabled()
                && matches!(handled, Handled::Post(_) | Handled::StoreFailed)
                && stats.posts % self.stats_every == 0
            {
                self.monitor.log_stats("Listening");
            }
        }

        tracing::info!(
            "Processed {} posts ({} first-time, {} repeat, {} store failures), {} notices",
            stats.posts,
            stats.first_time,
            stats.repeat,
            stats.store_failures,
            stats.notices
        );
        self.monitor.log_final_stats();

        stats
    }
}
