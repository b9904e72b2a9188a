pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{MemorySeenStore, RedisSeenStore, TwitterStream};
pub use config::{CliConfig, Settings};
pub use core::{
    listener::{Listener, ListenerStats},
    tracker::{Handled, SeenTracker},
};
pub use domain::model::{Author, Credentials, Membership, Post, StreamMessage};
pub use utils::error::{AppError, Result};
