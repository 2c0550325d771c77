use async_trait::async_trait;

use crate::{Result, destination::Destination, message::ComposedMessage};

/// Send messages to a messaging platform.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    /// Adapter identifier (e.g. "onebot").
    fn id(&self) -> &str;

    async fn send_group(&self, group_id: i64, message: &ComposedMessage) -> Result<()>;

    async fn send_user(&self, user_id: i64, message: &ComposedMessage) -> Result<()>;

    /// Route to [`send_group`](Self::send_group) or
    /// [`send_user`](Self::send_user) by destination kind.
    async fn send_to(&self, to: Destination, message: &ComposedMessage) -> Result<()> {
        match to {
            Destination::Group(id) => self.send_group(id, message).await,
            Destination::User(id) => self.send_user(id, message).await,
        }
    }
}
