//! ntfy → chat forwarding pipeline.
//!
//! One [`ChannelListener`] per configured topic keeps a WebSocket
//! subscription open, decodes each notification, turns it into a
//! [`ComposedMessage`](ntfy_relay_channels::ComposedMessage) with the
//! [`MessageTransformer`], and hands it to the [`Dispatcher`]. The
//! [`ForwardService`] owns all listeners plus the media cache janitor.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod forwarder;
pub mod listener;
pub mod service;
pub mod source;
pub mod transform;

pub use {
    context::RelayContext,
    dispatch::{DispatchReport, Dispatcher},
    error::{DecodeError, Error, ListenError, Result},
    event::{Attachment, Frame, NotificationEvent},
    forwarder::Forwarder,
    listener::{ChannelListener, ListenerState},
    service::ForwardService,
    source::{EventSource, EventStream, WsEventSource},
    transform::MessageTransformer,
};
