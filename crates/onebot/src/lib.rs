//! OneBot v11 adapter.
//!
//! Delivers [`ComposedMessage`](ntfy_relay_channels::ComposedMessage)s through
//! the HTTP API of a OneBot v11 implementation (go-cqhttp, NapCat, Lagrange).
//! Media segments reference cached files by `file://` URI, so the bot must
//! share a filesystem with the relay.

pub mod outbound;
pub mod segment;

pub use outbound::OneBotOutbound;
