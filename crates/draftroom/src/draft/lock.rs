// Per-league draft lock.
//
// Every mutating draft operation for a league runs while holding that
// league's lock, so a manual pick and a clock-driven auto-pick can never both
// compute "next overall pick" from the same state. Leagues never contend with
// each other. Waiters are served in FIFO order (tokio's Mutex is fair).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use super::league::LeagueId;

/// Holding this guard means no other draft operation for `league_id` runs.
pub struct LeagueGuard {
    league_id: LeagueId,
    _guard: OwnedMutexGuard<()>,
}

impl LeagueGuard {
    pub fn league_id(&self) -> LeagueId {
        self.league_id
    }
}

impl std::fmt::Debug for LeagueGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeagueGuard")
            .field("league_id", &self.league_id)
            .finish()
    }
}

/// Registry of per-league locks.
///
/// Entries are held weakly: once no task holds or waits on a league's lock,
/// its entry is dead and gets pruned on the next acquire.
#[derive(Debug, Default)]
pub struct DraftLocks {
    locks: Mutex<HashMap<LeagueId, Weak<AsyncMutex<()>>>>,
}

impl DraftLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until every earlier operation on `league_id` has finished, then
    /// hold the league until the returned guard is dropped.
    pub async fn acquire(&self, league_id: LeagueId) -> LeagueGuard {
        let lock = self.lock_for(league_id);
        let guard = lock.lock_owned().await;
        LeagueGuard {
            league_id,
            _guard: guard,
        }
    }

    /// Like [`DraftLocks::acquire`] but gives up instead of waiting.
    pub fn try_acquire(&self, league_id: LeagueId) -> Option<LeagueGuard> {
        let lock = self.lock_for(league_id);
        lock.try_lock_owned().ok().map(|guard| LeagueGuard {
            league_id,
            _guard: guard,
        })
    }

    /// Number of leagues with an operation running or queued.
    pub fn active_count(&self) -> usize {
        let mut locks = self.registry();
        locks.retain(|_, weak| weak.strong_count() > 0);
        locks.len()
    }

    fn lock_for(&self, league_id: LeagueId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.registry();
        if let Some(lock) = locks.get(&league_id).and_then(Weak::upgrade) {
            return lock;
        }

        let before = locks.len();
        locks.retain(|_, weak| weak.strong_count() > 0);
        if locks.len() < before {
            debug!("pruned {} idle draft locks", before - locks.len());
        }

        let lock = Arc::new(AsyncMutex::new(()));
        locks.insert(league_id, Arc::downgrade(&lock));
        lock
    }

    /// Acquire the registry map.
    ///
    /// Panics if the mutex is poisoned. The map is only held for a lookup or
    /// an insert, never across an await.
    fn registry(&self) -> std::sync::MutexGuard<'_, HashMap<LeagueId, Weak<AsyncMutex<()>>>> {
        self.locks.lock().expect("draft lock registry poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_league_operations_are_serialized() {
        let locks = Arc::new(DraftLocks::new());
        let running = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let running = Arc::clone(&running);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(1).await;
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_leagues_do_not_block() {
        let locks = DraftLocks::new();
        let _held = locks.acquire(1).await;

        let other = tokio::time::timeout(Duration::from_millis(50), locks.acquire(2)).await;
        assert!(other.is_ok(), "league 2 should not wait on league 1");
        assert!(locks.try_acquire(1).is_none());
    }

    #[tokio::test]
    async fn waiters_run_in_arrival_order() {
        let locks = Arc::new(DraftLocks::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = locks.acquire(7).await;
        let mut handles = Vec::new();
        for i in 0..4 {
            let locks = Arc::clone(&locks);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(7).await;
                order.lock().unwrap().push(i);
            }));
            // Let the task reach the lock queue before spawning the next.
            tokio::task::yield_now().await;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        drop(first);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn idle_entries_are_cleaned_up() {
        let locks = DraftLocks::new();
        {
            let _a = locks.acquire(1).await;
            let _b = locks.acquire(2).await;
            assert_eq!(locks.active_count(), 2);
        }
        assert_eq!(locks.active_count(), 0);

        let guard = locks.acquire(3).await;
        assert_eq!(guard.league_id(), 3);
        assert_eq!(locks.active_count(), 1);
    }

    #[tokio::test]
    async fn lock_is_reusable_after_release() {
        let locks = DraftLocks::new();
        drop(locks.acquire(5).await);
        assert!(locks.try_acquire(5).is_some());
    }
}
