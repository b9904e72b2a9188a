pub mod listener;
pub mod tracker;

pub use crate::domain::model::{Membership, Post, StreamMessage};
pub use crate::domain::ports::{ConfigProvider, PostStream, SeenStore};
pub use crate::utils::error::Result;
