//! Splits the streaming body into lines and classifies each JSON message.

use crate::domain::model::{Author, Post, StreamMessage};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct RawUser {
    id_str: String,
    #[serde(default)]
    screen_name: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawExtended {
    full_text: String,
}

#[derive(Debug, Deserialize)]
struct RawTweet {
    #[serde(default)]
    id_str: String,
    text: String,
    user: RawUser,
    extended_tweet: Option<RawExtended>,
}

impl From<RawTweet> for Post {
    fn from(raw: RawTweet) -> Self {
        let text = match raw.extended_tweet {
            Some(extended) => extended.full_text,
            None => raw.text,
        };
        Post {
            id: raw.id_str,
            text,
            author: Author {
                id: raw.user.id_str,
                screen_name: raw.user.screen_name,
                name: raw.user.name,
            },
        }
    }
}

/// Accumulates raw body chunks and yields complete lines.
///
/// Lines are delimited by `\n` (the API sends `\r\n`); a trailing `\r` is
/// stripped. Bytes are buffered until the delimiter arrives, so a multi-byte
/// UTF-8 sequence split across chunks is decoded intact.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no `\n`.
    scanned: usize,
    max_line_bytes: usize,
    /// Dropping the tail of an oversized line until the next `\n`.
    discarding: bool,
    overflow: Option<usize>,
}

/// 單行上限，超過就丟棄到下一個換行為止
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_max_line_bytes(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            pending: Vec::new(),
            scanned: 0,
            max_line_bytes,
            discarding: false,
            overflow: None,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut chunk = chunk;
        if self.discarding {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    self.discarding = false;
                    chunk = &chunk[pos + 1..];
                }
                None => return Vec::new(),
            }
        }
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[self.scanned..]
            .iter()
            .position(|b| *b == b'\n')
        {
            let end = self.scanned + offset;
            let line = &self.pending[start..end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            lines.push(String::from_utf8_lossy(line).into_owned());
            start = end + 1;
            self.scanned = start;
        }
        self.pending.drain(..start);
        self.scanned = self.pending.len();

        if self.pending.len() > self.max_line_bytes {
            self.overflow = Some(self.pending.len());
            self.pending.clear();
            self.scanned = 0;
            self.discarding = true;
        }
        lines
    }

    /// Size of the partial line dropped by the last overflow, if any.
    pub fn take_overflow(&mut self) -> Option<usize> {
        self.overflow.take()
    }

    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.scanned = 0;
        self.discarding = false;
        self.overflow = None;
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Classifies one line of the stream. Keep-alive (blank) lines yield `None`.
pub fn parse_line(line: &str) -> Option<StreamMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(e) => {
            return Some(StreamMessage::Error(format!(
                "Unparseable stream message ({}): {}",
                e,
                truncate(trimmed, 200)
            )))
        }
    };

    Some(classify(value))
}

pub fn classify(value: Value) -> StreamMessage {
    if value.get("text").is_some() && value.get("user").is_some() {
        return match serde_json::from_value::<RawTweet>(value.clone()) {
            Ok(raw) => StreamMessage::Post(raw.into()),
            Err(e) => StreamMessage::Error(format!("Malformed post: {}", e)),
        };
    }

    if let Some(limit) = value.get("limit") {
        return StreamMessage::Limit {
            track: limit.get("track").and_then(Value::as_u64).unwrap_or(0),
            timestamp_ms: limit
                .get("timestamp_ms")
                .and_then(Value::as_str)
                .map(str::to_string),
        };
    }

    if let Some(disconnect) = value.get("disconnect") {
        return StreamMessage::Disconnect {
            code: disconnect.get("code").and_then(Value::as_u64).unwrap_or(0),
            stream_name: disconnect
                .get("stream_name")
                .and_then(Value::as_str)
                .map(str::to_string),
            reason: disconnect
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };
    }

    if let Some(warning) = value.get("warning") {
        return StreamMessage::Warning {
            code: warning
                .get("code")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            message: warning
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };
    }

    if let Some(delete) = value.get("delete") {
        let status_id = delete
            .pointer("/status/id_str")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return StreamMessage::Delete { status_id };
    }

    StreamMessage::Other(value)
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
