//! Per-target run locks.
//!
//! Runs against the same database serialize on one `tokio::sync::Mutex`;
//! runs against different databases proceed concurrently. Locks are keyed by
//! a hash of the target identity and live for the rest of the process.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::OwnedMutexGuard;

type LockPool = Mutex<HashMap<u64, Arc<tokio::sync::Mutex<()>>>>;

static POOL: OnceLock<LockPool> = OnceLock::new();

fn target_key(identity: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    identity.hash(&mut hasher);
    hasher.finish()
}

/// The mutex guarding `identity`, created on first use
fn lock_for(identity: &str) -> Arc<tokio::sync::Mutex<()>> {
    let pool = POOL.get_or_init(Default::default);
    // Every critical section is a single lookup or insert
    let mut locks = pool.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    locks.entry(target_key(identity)).or_default().clone()
}

/// Wait until no other run holds the target, then hold it until the guard drops
pub async fn acquire(identity: &str) -> OwnedMutexGuard<()> {
    let lock = lock_for(identity);
    if lock.try_lock().is_err() {
        log::info!("Waiting for another migration run against {}", identity);
    }
    lock.lock_owned().await
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod tests;
