//! Per-user message quota gate.
//!
//! Consulted before the QA pipeline is invoked at all. Consumption is a
//! single atomic decrement-if-positive: either one message is consumed and
//! the caller proceeds, or nothing is consumed and the caller is told the
//! allowance is exhausted. There is no separate read-then-decrement — two
//! concurrent requests from the same user can never both pass on the last
//! remaining message.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Outcome of one quota consultation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    /// One message was consumed. `remaining` is `None` for unlimited users.
    Admitted { remaining: Option<u32> },
    /// No messages left; nothing was consumed.
    Exhausted,
}

/// External collaborator holding per-user remaining-message counters.
#[async_trait]
pub trait QuotaGate: Send + Sync {
    /// Atomically consume one message from `user`'s allowance.
    async fn try_consume(&self, user: &str) -> QuotaDecision;
}

/// In-memory quota store. Users with no recorded allowance are unlimited
/// (the paid tier); limited users are admitted until their counter reaches
/// zero.
#[derive(Debug, Default)]
pub struct InMemoryQuotaStore {
    allowances: Mutex<HashMap<String, u32>>,
}

impl InMemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or reset) a user's remaining-message allowance.
    pub async fn set_allowance(&self, user: &str, messages: u32) {
        self.allowances
            .lock()
            .await
            .insert(user.to_string(), messages);
    }

    /// The user's remaining allowance, `None` if unlimited.
    pub async fn remaining(&self, user: &str) -> Option<u32> {
        self.allowances.lock().await.get(user).copied()
    }
}

#[async_trait]
impl QuotaGate for InMemoryQuotaStore {
    async fn try_consume(&self, user: &str) -> QuotaDecision {
        let mut allowances = self.allowances.lock().await;
        match allowances.get_mut(user) {
            None => QuotaDecision::Admitted { remaining: None },
            Some(0) => QuotaDecision::Exhausted,
            Some(left) => {
                *left -= 1;
                QuotaDecision::Admitted {
                    remaining: Some(*left),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn unlimited_user_is_always_admitted() {
        let store = InMemoryQuotaStore::new();
        for _ in 0..100 {
            assert_eq!(
                store.try_consume("paid@example.edu").await,
                QuotaDecision::Admitted { remaining: None }
            );
        }
    }

    #[tokio::test]
    async fn limited_user_counts_down_to_exhausted() {
        let store = InMemoryQuotaStore::new();
        store.set_allowance("student@example.edu", 2).await;

        assert_eq!(
            store.try_consume("student@example.edu").await,
            QuotaDecision::Admitted { remaining: Some(1) }
        );
        assert_eq!(
            store.try_consume("student@example.edu").await,
            QuotaDecision::Admitted { remaining: Some(0) }
        );
        assert_eq!(
            store.try_consume("student@example.edu").await,
            QuotaDecision::Exhausted
        );
        // Exhaustion consumes nothing
        assert_eq!(store.remaining("student@example.edu").await, Some(0));
    }

    #[tokio::test]
    async fn concurrent_consumption_never_over_admits() {
        let store = Arc::new(InMemoryQuotaStore::new());
        store.set_allowance("student@example.edu", 5).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.try_consume("student@example.edu").await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), QuotaDecision::Admitted { .. }) {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 5);
        assert_eq!(store.remaining("student@example.edu").await, Some(0));
    }
}
