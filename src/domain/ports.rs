use crate::domain::model::{Credentials, StreamMessage};
use crate::utils::error::Result;
use async_trait::async_trait;

/// A persistent set of author identifiers. Members are never removed.
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Adds `member` to the set, returning `true` when it was not already present.
    async fn add(&self, member: &str) -> Result<bool>;
}

/// A source of stream messages. `None` means the stream is finished for good.
#[async_trait]
pub trait PostStream: Send {
    async fn next_message(&mut self) -> Option<StreamMessage>;
}

pub trait ConfigProvider: Send + Sync {
    fn credentials(&self) -> &Credentials;
    fn track(&self) -> &str;
    fn stream_endpoint(&self) -> &str;
    fn redis_url(&self) -> &str;
    fn redis_key(&self) -> &str;
    fn debug_user(&self) -> Option<&str>;
}
