//! ntfy WebSocket frames.
//!
//! Every frame is a JSON object with an `event` field: `open` when the
//! subscription starts, `keepalive` periodically, `message` for a
//! notification, and `poll_request` for push-relayed polls. Only `message`
//! frames are forwarded.

use std::fmt;

use serde::Deserialize;

use crate::error::DecodeError;

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    attachment: Option<Attachment>,
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Notification(NotificationEvent),
    /// `open`, `keepalive`, or any other non-message event kind.
    Control(String),
}

impl Frame {
    /// Decode one text frame.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let raw: RawFrame = serde_json::from_str(text)?;
        match raw.event.as_deref() {
            // A bare `{ "message": ... }` is treated as a notification.
            None | Some("message") => Ok(Self::Notification(NotificationEvent {
                text: raw.message,
                attachment: raw.attachment,
            })),
            Some(other) => Ok(Self::Control(other.to_string())),
        }
    }
}

/// One received notification. Transient, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationEvent {
    pub text: Option<String>,
    pub attachment: Option<Attachment>,
}

impl NotificationEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attachment: None,
        }
    }
}

/// Attachment descriptor as sent by ntfy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub url: Option<String>,
    /// MIME type, e.g. `image/png`. Empty when ntfy did not detect one.
    #[serde(default, rename = "type")]
    pub mime_type: String,
}

impl Attachment {
    pub fn is_media(&self) -> bool {
        self.mime_type.starts_with("image/") || self.mime_type.starts_with("video/")
    }
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{url: {}, type: {}}}",
            self.url.as_deref().unwrap_or("-"),
            if self.mime_type.is_empty() {
                "-"
            } else {
                &self.mime_type
            }
        )
    }
}
