//! Per-conversation async locks.

use parking_lot::Mutex;
use rapport_memory::ConversationKey;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes work on one conversation key within the process.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<ConversationKey, Arc<AsyncMutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Access ends when the guard drops.
    pub async fn lock(&self, key: &ConversationKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            // Drop entries nobody holds or waits on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of keys currently held or awaited.
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::KeyLocks;
    use rapport_memory::ConversationKey;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_waits_for_release() {
        let locks = Arc::new(KeyLocks::new());
        let key = ConversationKey::new("s1", "p1");
        let guard = locks.lock(&key).await;

        let contender = {
            let locks = locks.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&key).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("released")
            .expect("join");
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyLocks::new();
        let _a = locks.lock(&ConversationKey::new("s1", "p1")).await;
        let _b = tokio::time::timeout(
            Duration::from_secs(1),
            locks.lock(&ConversationKey::new("s1", "p2")),
        )
        .await
        .expect("independent key");
        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn released_keys_are_pruned() {
        let locks = KeyLocks::new();
        drop(locks.lock(&ConversationKey::new("s1", "p1")).await);
        let _held = locks.lock(&ConversationKey::new("s2", "p1")).await;
        assert_eq!(locks.active(), 1);
        assert_eq!(locks.locks.lock().len(), 1);
    }
}
