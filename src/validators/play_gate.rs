use std::{sync::Arc, time::Duration};

use moka::future::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};

const IDLE_LOCK_TTL: Duration = Duration::from_secs(300);

/// Per `(user, song)` advisory locks serialising the dedup check and the write
/// that follows it within this process.
#[derive(Clone)]
pub struct PlayGate {
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl PlayGate {
    pub fn new(capacity: u64) -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(IDLE_LOCK_TTL)
                .build(),
        }
    }

    /// Waits for and holds the lock of one pair until the guard drops.
    pub async fn acquire(&self, user_id: &str, song_id: &str) -> OwnedMutexGuard<()> {
        let key = format!("{user_id}:{song_id}");
        let lock = self
            .locks
            .get_with(key, async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }
}
