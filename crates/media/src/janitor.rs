use std::{sync::Arc, time::Duration};

use {
    tokio::{task::JoinHandle, time::MissedTickBehavior},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
};

use crate::cache::{MediaCache, SweepReport};

/// Periodically clears the media cache.
pub struct CacheJanitor {
    cache: Arc<MediaCache>,
    period: Duration,
    grace: Duration,
}

impl CacheJanitor {
    pub fn new(cache: Arc<MediaCache>, period: Duration, grace: Duration) -> Self {
        Self {
            cache,
            period,
            grace,
        }
    }

    /// Run one sweep now. Errors are logged, never returned.
    pub async fn sweep(&self) -> SweepReport {
        match self.cache.sweep(self.grace).await {
            Ok(report) => {
                info!(
                    removed = report.removed,
                    kept = report.kept,
                    failed = report.failed,
                    "cleaned media cache"
                );
                report
            },
            Err(e) => {
                error!(error = %e, "error cleaning media cache");
                SweepReport::default()
            },
        }
    }

    /// Sweep every `period` until `cancel` fires. The first sweep happens one
    /// period after the call.
    pub async fn run(self, cancel: CancellationToken) {
        if self.period.is_zero() {
            warn!("media cache janitor disabled: zero clean interval");
            return;
        }
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // `interval` fires immediately on the first tick.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep().await;
                },
            }
        }
        info!("media cache janitor stopped");
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
