use std::{sync::Arc, time::Duration};

use {
    ntfy_relay_channels::{ChannelOutbound, ChannelRegistry, ComposedMessage, Destination},
    tracing::{error, info, warn},
};

use crate::event::NotificationEvent;

/// Per-dispatch counters, mostly for logs and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
    /// Targets that did not parse as a destination.
    pub skipped: usize,
    /// No adapter was available; nothing was attempted.
    pub dropped: bool,
}

/// Delivers a composed message to an ordered list of destinations.
///
/// Sends are serialized with a fixed pause after every attempt. A failure
/// for one destination never stops delivery to the rest.
pub struct Dispatcher {
    registry: Arc<ChannelRegistry>,
    send_interval: Duration,
    /// Admins notified of send failures; empty disables reporting.
    report_to: Vec<i64>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ChannelRegistry>, send_interval: Duration) -> Self {
        Self {
            registry,
            send_interval,
            report_to: Vec::new(),
        }
    }

    /// Report send failures to these admin user ids.
    #[must_use]
    pub fn with_error_reports(mut self, admins: Vec<i64>) -> Self {
        self.report_to = admins;
        self
    }

    /// Whether an adapter is registered to send through.
    pub fn has_adapter(&self) -> bool {
        !self.registry.is_empty()
    }

    pub async fn dispatch(
        &self,
        event: &NotificationEvent,
        message: &ComposedMessage,
        targets: &[String],
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        let Some(adapter) = self.registry.first() else {
            error!("no bot instances available, dropping message");
            report.dropped = true;
            return report;
        };

        for target in targets {
            let destination = match target.parse::<Destination>() {
                Ok(d) => d,
                Err(e) => {
                    error!(target = %target, error = %e, "invalid qq_target format");
                    report.skipped += 1;
                    tokio::time::sleep(self.send_interval).await;
                    continue;
                },
            };

            let result = adapter.send_to(destination, message).await;
            tokio::time::sleep(self.send_interval).await;

            match result {
                Ok(()) => {
                    info!(target = %destination, adapter = adapter.id(), "forwarded message");
                    report.sent += 1;
                },
                Err(e) => {
                    error!(target = %destination, error = %e, "error sending message");
                    report.failed += 1;
                    self.report_failure(adapter.as_ref(), destination, &e, event)
                        .await;
                },
            }
        }

        report
    }

    async fn report_failure(
        &self,
        adapter: &dyn ChannelOutbound,
        destination: Destination,
        err: &ntfy_relay_channels::Error,
        event: &NotificationEvent,
    ) {
        if self.report_to.is_empty() {
            return;
        }

        let attachment = event
            .attachment
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string);
        let notice = ComposedMessage::text(format!(
            "Error sending message to {destination}: {err}\nMessage: {} Attachment: {attachment}",
            event.text.as_deref().unwrap_or_default(),
        ));

        for &admin in &self.report_to {
            if let Err(e) = adapter.send_user(admin, &notice).await {
                warn!(admin, error = %e, "error sending error report");
            }
            tokio::time::sleep(self.send_interval).await;
        }
    }
}
