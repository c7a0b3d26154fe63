//! In-memory dedup ledger.
//!
//! Holds every event key admitted during the process lifetime. The set
//! only grows.

use dashmap::DashSet;

/// Set of already admitted event keys.
#[derive(Debug, Default)]
pub struct DedupLedger {
    keys: DashSet<String>,
}

impl DedupLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-seeded with known keys.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Admit a key.
    ///
    /// Returns `true` exactly once per key, also under concurrent callers.
    pub fn admit(&self, key: &str) -> bool {
        if self.keys.contains(key) {
            return false;
        }
        self.keys.insert(key.to_string())
    }

    /// Check if a key was already admitted.
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Number of admitted keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if no key was admitted yet.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_admit_once() {
        let ledger = DedupLedger::new();
        assert!(ledger.admit("sig1"));
        assert!(!ledger.admit("sig1"));
        assert!(ledger.admit("sig2"));
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("sig1"));
    }

    #[test]
    fn test_with_keys() {
        let ledger = DedupLedger::with_keys(["sig1", "sig2"]);
        assert!(!ledger.admit("sig2"));
        assert!(ledger.admit("sig3"));
        assert!(!ledger.is_empty());
    }

    #[test]
    fn test_concurrent_admit_single_winner() {
        let ledger = Arc::new(DedupLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|i| ledger.admit(&format!("key-{i}")))
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 100);
        assert_eq!(ledger.len(), 100);
    }

    #[tokio::test]
    async fn test_concurrent_admit_across_tasks() {
        let ledger = Arc::new(DedupLedger::new());
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move { ledger.admit("same-key") })
            })
            .collect();

        let mut wins = 0;
        for task in tasks {
            if task.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }
}
