use std::time::Duration;

use {
    async_trait::async_trait,
    ntfy_relay_channels::{ChannelOutbound, ComposedMessage, Error, Result},
    ntfy_relay_config::OneBotConfig,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::segment::{self, WireSegment};

#[derive(Serialize)]
struct SendGroupMsg<'a> {
    group_id: i64,
    message: Vec<WireSegment<'a>>,
}

#[derive(Serialize)]
struct SendPrivateMsg<'a> {
    user_id: i64,
    message: Vec<WireSegment<'a>>,
}

/// Action response envelope. `status` is `ok`, `async`, or `failed`.
#[derive(Debug, Deserialize)]
struct ActionResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    retcode: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    wording: String,
}

/// Outbound sender for a OneBot v11 HTTP endpoint.
pub struct OneBotOutbound {
    http: reqwest::Client,
    api_url: String,
    access_token: Option<Secret<String>>,
}

impl OneBotOutbound {
    pub fn from_config(config: &OneBotConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::external("failed to build OneBot http client", e))?;
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token().map(|t| Secret::new(t.to_string())),
        })
    }

    async fn call<P: Serialize + Sync>(&self, action: &str, params: &P) -> Result<()> {
        let url = format!("{}/{action}", self.api_url);
        let mut request = self.http.post(&url).json(params);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let resp = request
            .send()
            .await
            .map_err(|e| Error::external(format!("OneBot {action} request"), e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::unavailable(format!(
                "OneBot {action} failed ({status}): {body}"
            )));
        }

        let body: ActionResponse = resp
            .json()
            .await
            .map_err(|e| Error::external(format!("OneBot {action} response"), e))?;
        if body.status == "failed" || body.retcode != 0 {
            let message = if body.wording.is_empty() {
                body.message
            } else {
                body.wording
            };
            return Err(Error::Rejected {
                action: action.to_string(),
                retcode: body.retcode,
                message,
            });
        }

        debug!(action, status = %body.status, "OneBot action succeeded");
        Ok(())
    }
}

#[async_trait]
impl ChannelOutbound for OneBotOutbound {
    fn id(&self) -> &str {
        "onebot"
    }

    async fn send_group(&self, group_id: i64, message: &ComposedMessage) -> Result<()> {
        let params = SendGroupMsg {
            group_id,
            message: segment::encode(message)?,
        };
        self.call("send_group_msg", &params).await
    }

    async fn send_user(&self, user_id: i64, message: &ComposedMessage) -> Result<()> {
        let params = SendPrivateMsg {
            user_id,
            message: segment::encode(message)?,
        };
        self.call("send_private_msg", &params).await
    }
}
