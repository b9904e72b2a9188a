use crate::core::{Membership, Post, SeenStore, StreamMessage};
use crate::utils::error::Result;

pub const FIRST_TIME_MESSAGE: &str = "This is a new user OR it is the debug user";
pub const REPEAT_MESSAGE: &str = "We have seen this user before";

/// What the tracker did with one stream message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    Post(Membership),
    /// The store failed; the error was logged and no membership message was.
    StoreFailed,
    /// A non-post message, logged once.
    Notice(&'static str),
}

/// Records post authors in the seen-set and logs one line per outcome.
pub struct SeenTracker<S: SeenStore> {
    store: S,
    debug_user: Option<String>,
}

impl<S: SeenStore> SeenTracker<S> {
    pub fn new(store: S, debug_user: Option<String>) -> Self {
        Self {
            store,
            debug_user: debug_user.filter(|name| !name.is_empty()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The debug account always takes the first-time branch.
    fn is_debug_user(&self, post: &Post) -> bool {
        self.debug_user
            .as_deref()
            .is_some_and(|name| name == post.author.screen_name)
    }

    /// Adds the author to the seen-set and decides which branch applies.
    pub async fn record(&self, post: &Post) -> Result<Membership> {
        let newly_added = self.store.add(&post.author.id).await?;
        let debug_user = self.is_debug_user(post);

        if newly_added || debug_user {
            Ok(Membership::FirstTime { debug_user })
        } else {
            Ok(Membership::Repeat)
        }
    }

    pub async fn handle(&self, message: &StreamMessage) -> Handled {
        match message {
            StreamMessage::Post(post) => self.handle_post(post).await,
            notice => {
                log_notice(notice);
                Handled::Notice(notice.kind())
            }
        }
    }

    async fn handle_post(&self, post: &Post) -> Handled {
        tracing::info!("{}", post.text);

        match self.record(post).await {
            Ok(membership) => {
                match membership {
                    Membership::FirstTime { .. } => tracing::info!(
                        author_id = %post.author.id,
                        screen_name = %post.author.screen_name,
                        "{}",
                        FIRST_TIME_MESSAGE
                    ),
                    Membership::Repeat => tracing::info!(
                        author_id = %post.author.id,
                        screen_name = %post.author.screen_name,
                        "{}",
                        REPEAT_MESSAGE
                    ),
                }
                Handled::Post(membership)
            }
            Err(e) => {
                tracing::error!(author_id = %post.author.id, "❌ {}", e);
                Handled::StoreFailed
            }
        }
    }
}

fn log_notice(message: &StreamMessage) {
    match message {
        StreamMessage::Connected => tracing::info!("✅ Connected to stream"),
        StreamMessage::Limit {
            track,
            timestamp_ms,
        } => tracing::warn!(
            "Limit notice: {} undelivered posts (timestamp_ms: {})",
            track,
            timestamp_ms.as_deref().unwrap_or("-")
        ),
        StreamMessage::Disconnect {
            code,
            stream_name,
            reason,
        } => tracing::warn!(
            "Disconnect notice: code {} on {}: {}",
            code,
            stream_name.as_deref().unwrap_or("stream"),
            reason
        ),
        StreamMessage::Warning { code, message } => {
            tracing::warn!("Stall warning {}: {}", code, message)
        }
        StreamMessage::Delete { status_id } => {
            tracing::debug!("Delete notice for status {}", status_id)
        }
        StreamMessage::Reconnect { delay, cause } => tracing::info!(
            cause = %cause,
            "Reconnecting in {}ms...",
            delay.as_millis()
        ),
        StreamMessage::Error(error) => tracing::error!("❌ {}", error),
        StreamMessage::Other(value) => tracing::debug!("Unhandled stream message: {}", value),
        StreamMessage::Post(_) => {}
    }
}
