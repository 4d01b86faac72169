use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Mutual exclusion keyed by document name. Every read-modify-write sequence
/// against one document runs under its named lock; waiters queue on a real
/// mutex, so acquisition blocks instead of polling and nobody is starved.
///
/// The grain is the whole document: two writes touching different posts still
/// serialize if they live in the same file. Nothing in this crate holds two
/// named locks at once, so lock ordering is never an issue.
#[derive(Debug, Default)]
pub struct LockManager {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `action` while holding the named lock. The guard releases on
    /// drop, so failures inside `action` still unlock.
    pub async fn with_lock<F, T>(&self, name: &str, action: F) -> T
    where
        F: Future<Output = T>,
    {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(name.to_owned()).or_default().clone()
        };

        let _guard = lock.lock().await;
        action.await
    }
}
