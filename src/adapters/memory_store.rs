use crate::domain::ports::SeenStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-process seen-set with the same contract as the Redis one.
/// Nothing survives a restart; meant for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySeenStore {
    members: Arc<Mutex<HashSet<String>>>,
}

impl MemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, member: &str) -> bool {
        self.members.lock().await.contains(member)
    }

    pub async fn len(&self) -> usize {
        self.members.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.lock().await.is_empty()
    }
}

#[async_trait]
impl SeenStore for MemorySeenStore {
    async fn add(&self, member: &str) -> Result<bool> {
        Ok(self.members.lock().await.insert(member.to_string()))
    }
}
