use std::{sync::Arc, time::Duration};

use {
    futures::StreamExt,
    tokio::sync::watch,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{error::ListenError, event::Frame, forwarder::Forwarder, source::EventSource};

/// Connection state of one topic subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Disconnected,
    Connecting,
    Connected,
}

/// Keeps one topic subscription alive and forwards every notification it
/// receives to the topic's targets.
///
/// Any connection failure or stream end drops back to
/// [`ListenerState::Disconnected`], waits `reconnect_delay`, and tries
/// again. There is no attempt limit.
pub struct ChannelListener {
    topic: String,
    targets: Vec<String>,
    source: Arc<dyn EventSource>,
    forwarder: Arc<Forwarder>,
    reconnect_delay: Duration,
    state: watch::Sender<ListenerState>,
}

impl ChannelListener {
    pub fn new(
        topic: impl Into<String>,
        targets: Vec<String>,
        source: Arc<dyn EventSource>,
        forwarder: Arc<Forwarder>,
        reconnect_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ListenerState::Disconnected);
        Self {
            topic: topic.into(),
            targets,
            source,
            forwarder,
            reconnect_delay,
            state,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Watch the listener's connection state.
    pub fn state(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    /// Run until `cancel` fires. An in-flight forward is abandoned on
    /// cancellation.
    pub async fn run(self, cancel: CancellationToken) {
        let topic = self.topic.as_str();
        loop {
            self.state.send_replace(ListenerState::Connecting);
            info!(topic, "connecting to ntfy topic");

            let outcome = tokio::select! {
                () = cancel.cancelled() => break,
                outcome = self.session() => outcome,
            };
            self.state.send_replace(ListenerState::Disconnected);

            match outcome {
                Ok(()) => info!(topic, "subscription closed by server"),
                Err(e) => error!(topic, error = %e, "subscription failed"),
            }

            info!(
                topic,
                delay_secs = self.reconnect_delay.as_secs_f64(),
                "reconnecting after delay"
            );
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.reconnect_delay) => {},
            }
        }

        self.state.send_replace(ListenerState::Disconnected);
        info!(topic, "listener stopped");
    }

    /// One subscription: connect, then handle frames strictly in order
    /// until the stream ends or fails.
    async fn session(&self) -> Result<(), ListenError> {
        let mut frames = self.source.subscribe(&self.topic).await?;
        self.state.send_replace(ListenerState::Connected);
        info!(topic = %self.topic, "subscribed");

        while let Some(frame) = frames.next().await {
            let text = frame?;
            match Frame::decode(&text) {
                Ok(Frame::Notification(event)) => {
                    debug!(
                        topic = %self.topic,
                        has_attachment = event.attachment.is_some(),
                        "received notification"
                    );
                    self.forwarder.forward(&event, &self.targets).await;
                },
                Ok(Frame::Control(kind)) => {
                    debug!(topic = %self.topic, event = %kind, "control frame");
                },
                Err(e) => {
                    warn!(topic = %self.topic, error = %e, "skipping undecodable frame");
                },
            }
        }

        Ok(())
    }
}
