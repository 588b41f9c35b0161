//! Per-author critical sections for ledger mutations.
//!
//! Every balance-dependent read-compute-write sequence (request creation,
//! settlement) must be linearised per author; without it, two concurrent
//! requests can both observe the same available balance and jointly
//! overdraw it. Locks are keyed by author so operations on different
//! authors never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry of per-author async mutexes.
///
/// Lock entries are created on first use and kept for the process lifetime;
/// the author population is bounded by the publishing house's roster, so the
/// map never needs eviction.
#[derive(Debug, Default)]
pub struct AuthorLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl AuthorLocks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the critical section for one author, waiting if another
    /// operation on the same author holds it.
    ///
    /// The guard must not be held across external I/O such as notifier
    /// delivery; release it as soon as the store write commits.
    pub async fn lock(&self, author_id: Uuid) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(author_id).or_default())
        };
        entry.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for lock keying.

    use std::time::Duration;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn same_author_serialises() {
        let locks = Arc::new(AuthorLocks::new());
        let author = Uuid::new_v4();

        let guard = locks.lock(author).await;
        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(author).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.expect("contender completes");
    }

    #[rstest]
    #[tokio::test]
    async fn different_authors_do_not_contend() {
        let locks = AuthorLocks::new();
        let _first = locks.lock(Uuid::new_v4()).await;
        let second = tokio::time::timeout(
            Duration::from_millis(50),
            locks.lock(Uuid::new_v4()),
        )
        .await;
        assert!(second.is_ok(), "unrelated author acquired immediately");
    }
}
