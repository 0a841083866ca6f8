use std::collections::HashMap;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Expense, FlagMap};

/// Order-independent key for a set of expenses: SHA-256 over the sorted,
/// length-prefixed ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(expenses: &[Expense]) -> Self {
        let mut ids: Vec<&str> = expenses.iter().map(|e| e.id.as_str()).collect();
        ids.sort_unstable();

        // Length-prefixed so ids containing separators cannot run together.
        let mut hasher = Sha256::new();
        for id in ids {
            hasher.update((id.len() as u64).to_le_bytes());
            hasher.update(id.as_bytes());
        }
        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    /// Leading characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Entry {
    stored_at: Instant,
    flags: FlagMap,
}

/// Process-wide result cache with time-based expiry.
///
/// Entries expire `ttl` after they were written. Expired entries are dropped
/// when looked up and swept on every insert.
pub struct FlagCache {
    ttl: Duration,
    entries: RwLock<HashMap<Fingerprint, Entry>>,
}

impl FlagCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &Fingerprint) -> Option<FlagMap> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if self.is_live(entry) => return Some(entry.flags.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        debug!(fingerprint = key.short(), "evicting expired flag cache entry");
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| !self.is_live(e)) {
            entries.remove(key);
        }
        None
    }

    pub async fn insert(&self, key: Fingerprint, flags: FlagMap) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| self.is_live(e));
        entries.insert(
            key,
            Entry {
                stored_at: Instant::now(),
                flags,
            },
        );
    }

    /// Number of live entries.
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|e| self.is_live(e)).count()
    }

    fn is_live(&self, entry: &Entry) -> bool {
        entry.stored_at.elapsed() < self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Flag, FlagResult, UNCATEGORIZED};
    use chrono::NaiveDate;

    fn expense(id: &str) -> Expense {
        Expense {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            merchant: "Acme".to_string(),
            category: UNCATEGORIZED.to_string(),
            amount: 1.0,
            description: None,
        }
    }

    fn flags(id: &str) -> FlagMap {
        let mut map = FlagMap::new();
        map.insert(id.to_string(), FlagResult::new(Flag::Normal, "fine"));
        map
    }

    #[test]
    fn test_fingerprint_ignores_order() {
        let abc = Fingerprint::of(&[expense("a"), expense("b"), expense("c")]);
        let cab = Fingerprint::of(&[expense("c"), expense("a"), expense("b")]);
        assert_eq!(abc, cab);
    }

    #[test]
    fn test_fingerprint_tracks_membership() {
        let ab = Fingerprint::of(&[expense("a"), expense("b")]);
        let abc = Fingerprint::of(&[expense("a"), expense("b"), expense("c")]);
        assert_ne!(ab, abc);
        assert_eq!(ab.to_string().len(), 64);
        assert_eq!(ab.short().len(), 12);
    }

    #[test]
    fn test_fingerprint_ids_do_not_run_together() {
        let split = Fingerprint::of(&[expense("x"), expense("y")]);
        let joined = Fingerprint::of(&[expense("x,y")]);
        assert_ne!(split, joined);

        let shifted = Fingerprint::of(&[expense("ab"), expense("c")]);
        let other = Fingerprint::of(&[expense("a"), expense("bc")]);
        assert_ne!(shifted, other);
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = FlagCache::new(Duration::from_secs(3600));
        let key = Fingerprint::of(&[expense("a")]);
        cache.insert(key.clone(), flags("a")).await;

        assert_eq!(cache.get(&key).await, Some(flags("a")));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_entries_are_evicted() {
        let cache = FlagCache::new(Duration::ZERO);
        let key = Fingerprint::of(&[expense("a")]);
        cache.insert(key.clone(), flags("a")).await;

        assert_eq!(cache.get(&key).await, None);
        assert_eq!(cache.len().await, 0);
        assert!(cache.entries.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_insert_sweeps_expired() {
        let cache = FlagCache::new(Duration::ZERO);
        cache.insert(Fingerprint::of(&[expense("a")]), flags("a")).await;
        cache.insert(Fingerprint::of(&[expense("b")]), flags("b")).await;
        assert_eq!(cache.entries.read().await.len(), 1);
    }
}
