//! Messaging-platform side of the relay.
//!
//! A platform adapter implements [`ChannelOutbound`] to deliver a
//! [`ComposedMessage`] to a group or a user; the [`ChannelRegistry`] tracks
//! which adapter instances are currently available.

pub mod destination;
pub mod error;
pub mod message;
pub mod plugin;
pub mod registry;

pub use {
    destination::Destination,
    error::{Error, Result},
    message::{ComposedMessage, Segment},
    plugin::ChannelOutbound,
    registry::ChannelRegistry,
};
