use {
    async_trait::async_trait,
    futures::{StreamExt, future, stream::BoxStream},
    tokio_tungstenite::{
        connect_async,
        tungstenite::{
            Message,
            client::IntoClientRequest,
            http::{HeaderValue, header::AUTHORIZATION},
        },
    },
    tracing::debug,
};

use crate::error::ListenError;

/// Text frames of one subscription, in arrival order. The stream ends when
/// the server closes the connection.
pub type EventStream = BoxStream<'static, Result<String, ListenError>>;

/// Opens a streaming subscription to a topic.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<EventStream, ListenError>;
}

/// Subscribes to `{server}/{topic}/ws` over WebSocket.
pub struct WsEventSource {
    server: String,
    token: Option<String>,
}

impl WsEventSource {
    pub fn new(server: impl Into<String>, token: Option<&str>) -> Self {
        Self {
            server: server.into(),
            token: token.map(str::to_string),
        }
    }

    /// WebSocket URL for `topic`; `http(s)` servers map to `ws(s)`.
    pub fn topic_url(&self, topic: &str) -> Result<url::Url, ListenError> {
        let invalid = |reason: &str| ListenError::InvalidUrl {
            url: self.server.clone(),
            reason: reason.to_string(),
        };

        let mut url = url::Url::parse(&self.server).map_err(|e| invalid(&e.to_string()))?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            _ => return Err(invalid("scheme must be http, https, ws or wss")),
        };
        url.set_scheme(scheme)
            .map_err(|()| invalid("cannot switch to websocket scheme"))?;
        url.path_segments_mut()
            .map_err(|()| invalid("server url cannot have a path"))?
            .pop_if_empty()
            .push(topic)
            .push("ws");
        Ok(url)
    }
}

#[async_trait]
impl EventSource for WsEventSource {
    async fn subscribe(&self, topic: &str) -> Result<EventStream, ListenError> {
        let url = self.topic_url(topic)?;
        let mut request = url.as_str().into_client_request()?;
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ListenError::message(format!("invalid ntfy token: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (ws, response) =
            connect_async(request)
                .await
                .map_err(|source| ListenError::Connect {
                    url: url.to_string(),
                    source,
                })?;
        debug!(topic, status = %response.status(), "websocket handshake complete");

        let frames = ws.filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(Ok(text.to_string())),
                // Ping, pong, binary and close frames carry no notifications.
                Ok(_) => None,
                Err(e) => Some(Err(ListenError::Stream(e))),
            })
        });
        Ok(frames.boxed())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("https://ntfy.sh", "alerts", "wss://ntfy.sh/alerts/ws")]
    #[case("http://10.0.0.2:8080/", "alerts", "ws://10.0.0.2:8080/alerts/ws")]
    #[case("https://example.com/ntfy", "ops", "wss://example.com/ntfy/ops/ws")]
    #[case("wss://ntfy.sh", "a b", "wss://ntfy.sh/a%20b/ws")]
    fn builds_websocket_url(#[case] server: &str, #[case] topic: &str, #[case] expected: &str) {
        let source = WsEventSource::new(server, None);
        assert_eq!(source.topic_url(topic).unwrap().as_str(), expected);
    }

    #[test]
    fn rejects_unknown_scheme() {
        let source = WsEventSource::new("ftp://ntfy.sh", None);
        assert!(matches!(
            source.topic_url("x"),
            Err(ListenError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn connect_failure_is_a_connection_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let source = WsEventSource::new(format!("http://127.0.0.1:{port}"), Some("tk"));
        let err = source.subscribe("alerts").await.err().unwrap();
        assert!(matches!(err, ListenError::Connect { .. }));
    }

    #[tokio::test]
    async fn streams_text_frames_with_bearer_token() {
        use {futures::SinkExt, tokio_tungstenite::tungstenite::handshake::server};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_task = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut seen = None;
            let callback = |req: &server::Request,
                            resp: server::Response|
             -> Result<server::Response, server::ErrorResponse> {
                seen = Some((
                    req.uri().path().to_string(),
                    req.headers()
                        .get(AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                ));
                Ok(resp)
            };
            let mut ws = tokio_tungstenite::accept_hdr_async(tcp, callback)
                .await
                .unwrap();
            ws.send(Message::Text(r#"{"event":"open"}"#.into()))
                .await
                .unwrap();
            ws.send(Message::Ping(vec![1].into())).await.unwrap();
            ws.send(Message::Text(r#"{"event":"message","message":"hi"}"#.into()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
            seen
        });

        let source = WsEventSource::new(format!("http://{addr}"), Some("tk_secret"));
        let stream = source.subscribe("alerts").await.unwrap();
        let frames: Vec<String> = stream.filter_map(|f| future::ready(f.ok())).collect().await;

        assert_eq!(frames, vec![
            r#"{"event":"open"}"#.to_string(),
            r#"{"event":"message","message":"hi"}"#.to_string(),
        ]);
        let (path, auth) = server_task.await.unwrap().unwrap();
        assert_eq!(path, "/alerts/ws");
        assert_eq!(auth.as_deref(), Some("Bearer tk_secret"));
    }
}
