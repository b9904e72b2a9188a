//! Long-lived HTTP connection to the filtered post stream.
//!
//! The connection is re-established forever. Every reconnect is announced with
//! a `StreamMessage::Reconnect` *before* the delay is slept, and failures are
//! surfaced as `StreamMessage::Error`; nothing here decides to give up.

use super::oauth::{self, OAuthNonce};
use super::parser::{parse_line, LineBuffer, MAX_LINE_BYTES};
use crate::domain::model::{Credentials, ReconnectCause, StreamMessage};
use crate::domain::ports::PostStream;
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::collections::VecDeque;
use std::time::Duration;

pub const DEFAULT_STREAM_ENDPOINT: &str = "https://stream.twitter.com/1.1/statuses/filter.json";
pub const DEFAULT_TRACK: &str = "Thanks Obama";

/// Twitter 每 30 秒送一次 keep-alive，90 秒沒資料視為斷線
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(90);

/// Reconnect delays, per failure kind.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Linear step for transport errors, closed bodies and stalls.
    pub network_step: Duration,
    pub network_max: Duration,
    /// Exponential (doubling) for non-2xx responses.
    pub http_start: Duration,
    pub http_max: Duration,
    /// Exponential (doubling) for 420 / 429.
    pub rate_limit_start: Duration,
    pub rate_limit_max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            network_step: Duration::from_millis(250),
            network_max: Duration::from_secs(16),
            http_start: Duration::from_secs(5),
            http_max: Duration::from_secs(320),
            rate_limit_start: Duration::from_secs(60),
            rate_limit_max: Duration::from_secs(960),
        }
    }
}

#[derive(Debug, Clone)]
struct Backoff {
    policy: BackoffPolicy,
    network: Duration,
    http: Duration,
    rate_limited: Duration,
}

impl Backoff {
    fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            network: Duration::ZERO,
            http: Duration::ZERO,
            rate_limited: Duration::ZERO,
        }
    }

    fn next(&mut self, cause: ReconnectCause) -> Duration {
        let p = &self.policy;
        match cause {
            ReconnectCause::Network => {
                self.network = (self.network + p.network_step).min(p.network_max);
                self.network
            }
            ReconnectCause::Http => {
                self.http = double_or_start(self.http, p.http_start, p.http_max);
                self.http
            }
            ReconnectCause::RateLimited => {
                self.rate_limited =
                    double_or_start(self.rate_limited, p.rate_limit_start, p.rate_limit_max);
                self.rate_limited
            }
        }
    }

    fn reset(&mut self) {
        self.network = Duration::ZERO;
        self.http = Duration::ZERO;
        self.rate_limited = Duration::ZERO;
    }
}

fn double_or_start(current: Duration, start: Duration, max: Duration) -> Duration {
    if current.is_zero() {
        start.min(max)
    } else {
        (current * 2).min(max)
    }
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub endpoint: String,
    pub track: String,
    pub stall_timeout: Duration,
    /// A partial line longer than this is dropped with an `Error` notice.
    pub max_line_bytes: usize,
    pub backoff: BackoffPolicy,
}

impl StreamConfig {
    pub fn new(endpoint: impl Into<String>, track: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            track: track.into(),
            stall_timeout: DEFAULT_STALL_TIMEOUT,
            max_line_bytes: MAX_LINE_BYTES,
            backoff: BackoffPolicy::default(),
        }
    }
}

pub struct TwitterStream {
    client: Client,
    credentials: Credentials,
    config: StreamConfig,
    body: Option<BoxStream<'static, reqwest::Result<Bytes>>>,
    lines: LineBuffer,
    pending: VecDeque<StreamMessage>,
    backoff: Backoff,
    scheduled: Option<Duration>,
}

impl TwitterStream {
    pub fn new(credentials: Credentials, config: StreamConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("thanks-listener/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        let backoff = Backoff::new(config.backoff.clone());
        let lines = LineBuffer::with_max_line_bytes(config.max_line_bytes);
        Ok(Self {
            client,
            credentials,
            config,
            body: None,
            lines,
            pending: VecDeque::new(),
            backoff,
            scheduled: None,
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.body.is_some()
    }

    fn schedule_reconnect(&mut self, cause: ReconnectCause) {
        self.body = None;
        self.lines.clear();
        let delay = self.backoff.next(cause);
        self.scheduled = Some(delay);
        self.pending.push_back(StreamMessage::Reconnect { delay, cause });
    }

    async fn connect(&mut self) {
        if let Some(delay) = self.scheduled.take() {
            tokio::time::sleep(delay).await;
        }

        let track = self.config.track.as_str();
        let nonce = OAuthNonce::generate();
        let auth = match oauth::authorization_header(
            &self.credentials,
            "POST",
            &self.config.endpoint,
            &[("track", track)],
            &nonce,
        ) {
            Ok(header) => header,
            Err(e) => {
                self.pending.push_back(StreamMessage::Error(e.to_string()));
                self.schedule_reconnect(ReconnectCause::Http);
                return;
            }
        };
        let form = format!("track={}", oauth::percent_encode(track));

        tracing::debug!("Connecting to {} (track: {})", self.config.endpoint, track);
        let stall_timeout = self.config.stall_timeout;
        let request = self
            .client
            .post(&self.config.endpoint)
            .header(AUTHORIZATION, auth)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send();

        // 連線後遲遲不回 header 也算 stall
        let response = match tokio::time::timeout(stall_timeout, request).await {
            Ok(response) => response,
            Err(_) => {
                self.report_stall("no response headers", stall_timeout);
                return;
            }
        };

        match response {
            Ok(resp) if resp.status().is_success() => {
                self.backoff.reset();
                self.lines.clear();
                self.body = Some(resp.bytes_stream().boxed());
                self.pending.push_back(StreamMessage::Connected);
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = match tokio::time::timeout(stall_timeout, resp.text()).await {
                    Ok(text) => text.unwrap_or_default(),
                    Err(_) => {
                        let what = format!("HTTP {} body incomplete", status);
                        self.report_stall(&what, stall_timeout);
                        return;
                    }
                };
                let error = AppError::HttpStatusError {
                    status,
                    body: body.trim().to_string(),
                };
                self.pending.push_back(StreamMessage::Error(error.to_string()));

                let cause = match status {
                    420 | 429 => ReconnectCause::RateLimited,
                    _ => ReconnectCause::Http,
                };
                self.schedule_reconnect(cause);
            }
            Err(e) => {
                self.pending
                    .push_back(StreamMessage::Error(AppError::from(e).to_string()));
                self.schedule_reconnect(ReconnectCause::Network);
            }
        }
    }

    fn report_stall(&mut self, what: &str, waited: Duration) {
        let error = AppError::StreamError {
            message: format!("{}: no data received for {:?}", what, waited),
        };
        self.pending.push_back(StreamMessage::Error(error.to_string()));
        self.schedule_reconnect(ReconnectCause::Network);
    }

    async fn read_chunk(&mut self) {
        let stall_timeout = self.config.stall_timeout;
        let Some(body) = self.body.as_mut() else {
            return;
        };

        let next = tokio::time::timeout(stall_timeout, body.next()).await;
        match next {
            Ok(Some(Ok(chunk))) => {
                for line in self.lines.push(&chunk) {
                    if let Some(message) = parse_line(&line) {
                        self.pending.push_back(message);
                    }
                }
                if let Some(buffered) = self.lines.take_overflow() {
                    let error = AppError::StreamError {
                        message: format!(
                            "line exceeded {} bytes ({} buffered), discarded",
                            self.lines.max_line_bytes(),
                            buffered
                        ),
                    };
                    self.pending.push_back(StreamMessage::Error(error.to_string()));
                }
            }
            Ok(Some(Err(e))) => {
                self.pending
                    .push_back(StreamMessage::Error(AppError::from(e).to_string()));
                self.schedule_reconnect(ReconnectCause::Network);
            }
            Ok(None) => {
                tracing::debug!("Stream body closed by server");
                self.schedule_reconnect(ReconnectCause::Network);
            }
            Err(_) => self.report_stall("stream body", stall_timeout),
        }
    }
}

#[async_trait]
impl PostStream for TwitterStream {
    async fn next_message(&mut self) -> Option<StreamMessage> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Some(message);
            }

            if self.body.is_some() {
                self.read_chunk().await;
            } else {
                self.connect().await;
            }
        }
    }
}
