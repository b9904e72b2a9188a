//! Client side of the v1.1 `statuses/filter` streaming endpoint.

pub mod oauth;
pub mod parser;
pub mod stream;

pub use stream::{BackoffPolicy, StreamConfig, TwitterStream};
