use std::sync::Arc;

use {
    ntfy_relay_media::CacheJanitor,
    tokio::{
        sync::{Mutex, watch},
        task::{JoinHandle, JoinSet},
    },
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
};

use crate::{
    context::RelayContext,
    dispatch::Dispatcher,
    error::{Error, Result},
    forwarder::Forwarder,
    listener::{ChannelListener, ListenerState},
    source::{EventSource, WsEventSource},
    transform::MessageTransformer,
};

enum Lifecycle {
    Idle,
    Running(Running),
    Stopped,
}

struct Running {
    cancel: CancellationToken,
    supervisor: JoinHandle<()>,
    janitor: JoinHandle<()>,
    states: Vec<(String, watch::Receiver<ListenerState>)>,
}

/// Startup and shutdown of the whole relay: one listener per configured
/// topic plus the cache janitor.
///
/// A service runs at most once. After [`stop`](Self::stop) the media cache is
/// gone and [`start`](Self::start) returns [`Error::Stopped`].
pub struct ForwardService {
    ctx: RelayContext,
    source: Arc<dyn EventSource>,
    lifecycle: Mutex<Lifecycle>,
}

impl ForwardService {
    /// Subscribe over WebSocket to the configured ntfy server.
    pub fn new(ctx: RelayContext) -> Self {
        let source = WsEventSource::new(ctx.config.ntfy_server.clone(), ctx.config.token());
        Self::with_source(ctx, Arc::new(source))
    }

    pub fn with_source(ctx: RelayContext, source: Arc<dyn EventSource>) -> Self {
        Self {
            ctx,
            source,
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    pub fn context(&self) -> &RelayContext {
        &self.ctx
    }

    /// Spawn all listeners and the janitor. Returns once they are spawned,
    /// not once they are connected.
    pub async fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        match *lifecycle {
            Lifecycle::Idle => {},
            Lifecycle::Running(_) => return Err(Error::AlreadyRunning),
            Lifecycle::Stopped => return Err(Error::Stopped),
        }

        let config = Arc::clone(&self.ctx.config);
        let forwarder = self.build_forwarder()?;
        let cancel = CancellationToken::new();

        let mut listeners = JoinSet::new();
        let mut states = Vec::with_capacity(config.ntfy_to_qq_mapping.len());
        for mapping in &config.ntfy_to_qq_mapping {
            let listener = ChannelListener::new(
                mapping.ntfy_channel.clone(),
                mapping.qq_targets.clone(),
                Arc::clone(&self.source),
                Arc::clone(&forwarder),
                config.reconnect_delay(),
            );
            states.push((mapping.ntfy_channel.clone(), listener.state()));

            let topic = mapping.ntfy_channel.clone();
            let token = cancel.child_token();
            listeners.spawn(async move {
                listener.run(token).await;
                topic
            });
            info!(
                topic = %mapping.ntfy_channel,
                targets = mapping.qq_targets.len(),
                "listener started"
            );
        }

        let supervisor = tokio::spawn(supervise(listeners, cancel.clone()));
        let janitor = CacheJanitor::new(
            Arc::clone(&self.ctx.cache),
            config.cache_clean_period(),
            config.cache_grace(),
        )
        .spawn(cancel.child_token());

        let adapters = self.ctx.registry.list();
        if adapters.is_empty() {
            warn!("no channel adapter registered; notifications will be dropped");
        }
        info!(
            listeners = states.len(),
            adapters = ?adapters,
            "forward service started"
        );
        *lifecycle = Lifecycle::Running(Running {
            cancel,
            supervisor,
            janitor,
            states,
        });
        Ok(())
    }

    /// Cancel every task, wait for them to finish, then remove the media
    /// cache. A no-op unless running.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if !matches!(*lifecycle, Lifecycle::Running(_)) {
            return;
        }
        let Lifecycle::Running(running) = std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        else {
            return;
        };

        running.cancel.cancel();
        if let Err(e) = running.supervisor.await {
            warn!(error = %e, "listener supervisor did not shut down cleanly");
        }
        if let Err(e) = running.janitor.await {
            warn!(error = %e, "cache janitor did not shut down cleanly");
        }
        self.ctx.close();
        info!("forward service stopped");
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.lifecycle.lock().await, Lifecycle::Running(_))
    }

    /// Current state of each listener, in configured order. Empty unless
    /// running.
    pub async fn listener_states(&self) -> Vec<(String, ListenerState)> {
        match &*self.lifecycle.lock().await {
            Lifecycle::Running(running) => running
                .states
                .iter()
                .map(|(topic, rx)| (topic.clone(), *rx.borrow()))
                .collect(),
            Lifecycle::Idle | Lifecycle::Stopped => Vec::new(),
        }
    }

    fn build_forwarder(&self) -> Result<Arc<Forwarder>> {
        let config = &self.ctx.config;
        let transformer = MessageTransformer::new(self.ctx.host_rewriter(), self.ctx.fetcher())?;

        let mut dispatcher =
            Dispatcher::new(Arc::clone(&self.ctx.registry), config.send_interval());
        if config.report_error {
            dispatcher = dispatcher.with_error_reports(config.superusers.clone());
        }

        Ok(Forwarder::new(transformer, dispatcher))
    }
}

/// Listeners only return on cancellation; anything else is logged.
async fn supervise(mut listeners: JoinSet<String>, cancel: CancellationToken) {
    while let Some(result) = listeners.join_next().await {
        if cancel.is_cancelled() {
            continue;
        }
        match result {
            Ok(topic) => error!(topic = %topic, "listener exited unexpectedly"),
            Err(e) if e.is_panic() => error!(error = %e, "listener panicked"),
            Err(e) => warn!(error = %e, "listener task aborted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{error::ListenError, source::EventStream},
        async_trait::async_trait,
        futures::{StreamExt, stream},
        ntfy_relay_channels::{
            ChannelOutbound, ChannelRegistry, ComposedMessage, Result as ChannelResult,
        },
        ntfy_relay_config::{ChannelMapping, RelayConfig},
        std::{collections::HashMap, sync::Mutex as StdMutex, time::Duration},
    };

    /// Serves a fixed list of frames per topic, then stays open.
    struct TopicSource {
        frames: HashMap<String, Vec<String>>,
    }

    #[async_trait]
    impl EventSource for TopicSource {
        async fn subscribe(&self, topic: &str) -> std::result::Result<EventStream, ListenError> {
            let frames = self.frames.get(topic).cloned().unwrap_or_default();
            Ok(stream::iter(frames.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed())
        }
    }

    #[derive(Default)]
    struct Recorder {
        sent: StdMutex<Vec<String>>,
        fail_groups: Vec<i64>,
    }

    #[async_trait]
    impl ChannelOutbound for Recorder {
        fn id(&self) -> &str {
            "recorder"
        }

        async fn send_group(&self, group_id: i64, message: &ComposedMessage) -> ChannelResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push(format!("group_{group_id}: {}", message.plain_text()));
            if self.fail_groups.contains(&group_id) {
                return Err(ntfy_relay_channels::Error::unavailable("muted"));
            }
            Ok(())
        }

        async fn send_user(&self, user_id: i64, message: &ComposedMessage) -> ChannelResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push(format!("user_{user_id}: {}", message.plain_text()));
            Ok(())
        }
    }

    fn mapping(topic: &str, targets: &[&str]) -> ChannelMapping {
        ChannelMapping {
            ntfy_channel: topic.into(),
            qq_targets: targets.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn message(text: &str) -> String {
        format!(r#"{{"event":"message","message":"{text}"}}"#)
    }

    fn service(
        config: RelayConfig,
        recorder: Arc<Recorder>,
        frames: &[(&str, &str)],
    ) -> ForwardService {
        let registry = Arc::new(ChannelRegistry::new());
        registry.register(recorder as Arc<dyn ChannelOutbound>);
        let ctx = RelayContext::new(config, registry).unwrap();

        let mut by_topic: HashMap<String, Vec<String>> = HashMap::new();
        for (topic, text) in frames {
            by_topic
                .entry(topic.to_string())
                .or_default()
                .push(message(text));
        }
        ForwardService::with_source(ctx, Arc::new(TopicSource { frames: by_topic }))
    }

    async fn wait_for(mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn each_topic_forwards_to_its_own_targets() {
        let config = RelayConfig {
            send_interval_ms: 0,
            ntfy_to_qq_mapping: vec![
                mapping("alerts", &["group_1", "user_2"]),
                mapping("builds", &["group_3"]),
            ],
            ..RelayConfig::default()
        };
        let recorder = Arc::new(Recorder::default());
        let svc = service(config, Arc::clone(&recorder), &[
            ("alerts", "disk full"),
            ("builds", "build passed"),
        ]);

        svc.start().await.unwrap();
        wait_for(|| recorder.sent.lock().unwrap().len() == 3).await;

        let mut sent = recorder.sent.lock().unwrap().clone();
        sent.sort();
        assert_eq!(sent, vec![
            "group_1: disk full".to_string(),
            "group_3: build passed".to_string(),
            "user_2: disk full".to_string(),
        ]);

        let states = svc.listener_states().await;
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].0, "alerts");
        assert!(
            states
                .iter()
                .all(|(_, state)| *state == ListenerState::Connected)
        );

        svc.stop().await;
    }

    #[tokio::test]
    async fn send_failures_are_reported_to_superusers() {
        let config = RelayConfig {
            send_interval_ms: 0,
            report_error: true,
            superusers: vec![77],
            ntfy_to_qq_mapping: vec![mapping("alerts", &["group_1"])],
            ..RelayConfig::default()
        };
        let recorder = Arc::new(Recorder {
            fail_groups: vec![1],
            ..Default::default()
        });
        let svc = service(config, Arc::clone(&recorder), &[("alerts", "oops")]);

        svc.start().await.unwrap();
        wait_for(|| recorder.sent.lock().unwrap().len() == 2).await;
        svc.stop().await;

        let sent = recorder.sent.lock().unwrap().clone();
        assert_eq!(sent[0], "group_1: oops");
        assert!(sent[1].starts_with("user_77: Error sending message to group_1: "));
    }

    #[tokio::test]
    async fn start_is_single_shot_and_stop_removes_cache() {
        let svc = service(
            RelayConfig {
                ntfy_to_qq_mapping: vec![mapping("alerts", &["group_1"])],
                ..RelayConfig::default()
            },
            Arc::new(Recorder::default()),
            &[],
        );
        let cache_dir = svc.context().cache.dir().to_path_buf();

        svc.start().await.unwrap();
        assert!(svc.is_running().await);
        assert!(matches!(svc.start().await, Err(Error::AlreadyRunning)));

        svc.stop().await;
        assert!(!svc.is_running().await);
        assert!(!cache_dir.exists());
        assert!(svc.listener_states().await.is_empty());
        assert!(matches!(svc.start().await, Err(Error::Stopped)));

        // Stopping twice is harmless.
        svc.stop().await;
    }

    #[tokio::test]
    async fn stop_before_start_is_a_noop() {
        let svc = service(RelayConfig::default(), Arc::new(Recorder::default()), &[]);
        let cache_dir = svc.context().cache.dir().to_path_buf();
        svc.stop().await;
        assert!(cache_dir.exists());
        svc.start().await.unwrap();
        svc.stop().await;
    }
}
