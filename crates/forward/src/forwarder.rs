use {
    std::sync::Arc,
    tracing::{debug, error, warn},
};

use crate::{
    dispatch::{DispatchReport, Dispatcher},
    event::NotificationEvent,
    transform::MessageTransformer,
};

/// Transform-then-dispatch for one notification. Shared by all listeners.
pub struct Forwarder {
    transformer: MessageTransformer,
    dispatcher: Dispatcher,
}

impl Forwarder {
    pub fn new(transformer: MessageTransformer, dispatcher: Dispatcher) -> Arc<Self> {
        Arc::new(Self {
            transformer,
            dispatcher,
        })
    }

    pub async fn forward(&self, event: &NotificationEvent, targets: &[String]) -> DispatchReport {
        // Nothing to send through, so skip the media downloads too.
        if !self.dispatcher.has_adapter() {
            error!("no bot instances available, dropping message");
            return DispatchReport {
                dropped: true,
                ..Default::default()
            };
        }

        let message = self.transformer.transform(event).await;
        if message.is_empty() {
            debug!("notification has no forwardable content");
        }

        let report = self.dispatcher.dispatch(event, &message, targets).await;
        if report.failed > 0 || report.skipped > 0 {
            warn!(
                sent = report.sent,
                failed = report.failed,
                skipped = report.skipped,
                "notification only partially delivered"
            );
        }
        report
    }
}
