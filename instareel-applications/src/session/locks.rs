//! Per-account mutual exclusion

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Hands out one async mutex per account id.
#[derive(Clone, Default)]
pub struct AccountLocks {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `account_id`.
    ///
    /// The entry is forgotten again when the last guard for the account drops, so ids
    /// that were never valid do not accumulate.
    pub async fn acquire(&self, account_id: &str) -> AccountGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(account_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        AccountGuard {
            guard: Some(lock.lock_owned().await),
            account_id: account_id.to_string(),
            locks: self.clone(),
        }
    }

    /// Forget the lock for `account_id` if nobody holds or awaits it
    pub fn prune(&self, account_id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(account_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(account_id);
        }
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one account; releases and prunes on drop
pub struct AccountGuard {
    guard: Option<OwnedMutexGuard<()>>,
    account_id: String,
    locks: AccountLocks,
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        // the mutex must be released before the strong count is checked
        self.guard.take();
        self.locks.prune(&self.account_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_account_is_serialized() {
        let locks = AccountLocks::new();
        let guard = locks.acquire("alice").await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.acquire("alice")).await;
        assert!(blocked.is_err());

        drop(guard);
        let reacquired =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire("alice")).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn test_different_accounts_do_not_block() {
        let locks = AccountLocks::new();
        let _alice = locks.acquire("alice").await;
        let bob = tokio::time::timeout(Duration::from_millis(50), locks.acquire("bob")).await;
        assert!(bob.is_ok());
    }

    #[tokio::test]
    async fn test_prune_keeps_held_locks() {
        let locks = AccountLocks::new();
        let guard = locks.acquire("alice").await;
        locks.prune("alice");
        assert_eq!(locks.len(), 1);

        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_entry_survives_while_another_task_waits() {
        let locks = AccountLocks::new();
        let guard = locks.acquire("alice").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("alice").await;
                locks.len()
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        // the waiter still saw the shared entry while it held the lock
        assert_eq!(waiter.await.unwrap(), 1);
        assert!(locks.is_empty());
    }
}
