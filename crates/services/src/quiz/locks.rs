use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use quiz_core::model::UserId;
use tokio::sync::OwnedMutexGuard;

type Slot = Arc<tokio::sync::Mutex<()>>;

/// One async mutex per user, created on demand.
///
/// Holding a [`UserGuard`] serializes every read-modify-write of that user's
/// cursors. Different users never contend. A slot is dropped from the map once
/// its last holder or waiter is gone.
#[derive(Debug, Default)]
pub struct UserLocks {
    slots: Mutex<HashMap<UserId, Slot>>,
}

/// Exclusive access to one user's quiz state.
#[derive(Debug)]
pub struct UserGuard<'a> {
    locks: &'a UserLocks,
    user: UserId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl UserLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other task holds `user`.
    pub async fn acquire(&self, user: UserId) -> UserGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(user).or_default())
        };
        let guard = slot.lock_owned().await;
        UserGuard {
            locks: self,
            user,
            guard: Some(guard),
        }
    }

    /// Users with a live slot.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for UserGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self
            .locks
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Only the map's own reference left: nobody holds or awaits it.
        let idle = slots
            .get(&self.user)
            .is_some_and(|slot| Arc::strong_count(slot) == 1);
        if idle {
            slots.remove(&self.user);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_is_serialized() {
        let locks = Arc::new(UserLocks::new());
        let inside = Arc::new(AtomicU32::new(0));
        let mut tasks = Vec::new();

        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            tasks.push(tokio::spawn(async move {
                let _guard = locks.acquire(UserId::new(1)).await;
                assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn different_users_do_not_block() {
        let locks = UserLocks::new();
        let _a = locks.acquire(UserId::new(1)).await;
        let _b = locks.acquire(UserId::new(2)).await;
        assert_eq!(locks.tracked(), 2);
    }
}
