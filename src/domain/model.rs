use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The author of a post. `id` is the stable identifier stored in the seen-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub screen_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub author: Author,
}

/// Why the stream is about to reconnect. Each cause has its own backoff curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectCause {
    Network,
    Http,
    RateLimited,
}

impl fmt::Display for ReconnectCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconnectCause::Network => write!(f, "network"),
            ReconnectCause::Http => write!(f, "http"),
            ReconnectCause::RateLimited => write!(f, "rate-limited"),
        }
    }
}

/// Everything the upstream stream can deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Connected,
    Post(Post),
    Limit {
        track: u64,
        timestamp_ms: Option<String>,
    },
    Disconnect {
        code: u64,
        stream_name: Option<String>,
        reason: String,
    },
    Warning {
        code: String,
        message: String,
    },
    Delete {
        status_id: String,
    },
    Reconnect {
        delay: Duration,
        cause: ReconnectCause,
    },
    Error(String),
    Other(serde_json::Value),
}

impl StreamMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            StreamMessage::Connected => "connected",
            StreamMessage::Post(_) => "post",
            StreamMessage::Limit { .. } => "limit",
            StreamMessage::Disconnect { .. } => "disconnect",
            StreamMessage::Warning { .. } => "warning",
            StreamMessage::Delete { .. } => "delete",
            StreamMessage::Reconnect { .. } => "reconnect",
            StreamMessage::Error(_) => "error",
            StreamMessage::Other(_) => "other",
        }
    }
}

/// OAuth 1.0a user-context credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

// 避免在日誌中洩漏密鑰
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"***")
            .field("access_token", &self.access_token)
            .field("access_secret", &"***")
            .finish()
    }
}

/// Result of recording an author in the seen-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Newly added, or the debug account (which always counts as new).
    FirstTime { debug_user: bool },
    Repeat,
}
