//! Bounded process-wide extraction cache (spec §4.3.9, §9 "Bounded cache
//! ... a process-wide LRU behind an interface, not a free-standing
//! global"). Keyed by the lowercased canonical-of-request URL, with
//! additional write-through entries under the extracted canonical URL and
//! any redirected URL so a later candidate pointing at either form still
//! hits. Entries are cloned in and out so a caller mutating its copy can
//! never corrupt the cache.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use retrieval_common::NormalizedArticle;

const SWEEP_EVERY: u64 = 50;

#[derive(Debug, Clone)]
pub struct CachedExtraction {
    pub article: Option<NormalizedArticle>,
    pub error: Option<String>,
}

struct Entry {
    value: CachedExtraction,
    inserted_at: DateTime<Utc>,
}

pub struct ExtractionCache {
    max_entries: usize,
    ttl_ms: u64,
    entries: Mutex<HashMap<String, Entry>>,
    /// Insertion order for oldest-first eviction once `max_entries` is hit.
    order: Mutex<VecDeque<String>>,
    calls: AtomicU64,
}

impl ExtractionCache {
    pub fn new(max_entries: usize, ttl_ms: u64) -> Self {
        Self {
            max_entries,
            ttl_ms,
            entries: Mutex::new(HashMap::new()),
            order: Mutex::new(VecDeque::new()),
            calls: AtomicU64::new(0),
        }
    }

    fn key(url: &str) -> String {
        url.to_lowercase()
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        let age_ms = (Utc::now() - entry.inserted_at).num_milliseconds();
        age_ms < 0 || age_ms as u64 > self.ttl_ms
    }

    /// Look up a cached extraction by request URL, returning a clone.
    pub fn get(&self, request_url: &str) -> Option<CachedExtraction> {
        let key = Self::key(request_url);
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&key) {
            Some(entry) if !self.is_expired(entry) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Insert (or overwrite) an entry under `request_url`, and additionally
    /// under `canonical_url` / `redirected_url` when present and distinct,
    /// so either form hits on a later lookup.
    pub fn put(&self, request_url: &str, canonical_url: Option<&str>, redirected_url: Option<&str>, value: CachedExtraction) {
        let mut keys = vec![Self::key(request_url)];
        if let Some(c) = canonical_url {
            let k = Self::key(c);
            if !keys.contains(&k) {
                keys.push(k);
            }
        }
        if let Some(r) = redirected_url {
            let k = Self::key(r);
            if !keys.contains(&k) {
                keys.push(k);
            }
        }

        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap();
        let mut order = self.order.lock().unwrap();
        for key in keys {
            if !entries.contains_key(&key) {
                order.push_back(key.clone());
            }
            entries.insert(key, Entry { value: value.clone(), inserted_at: now });
        }

        while entries.len() > self.max_entries {
            if let Some(oldest) = order.pop_front() {
                entries.remove(&oldest);
            } else {
                break;
            }
        }

        drop(entries);
        drop(order);

        let calls = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if calls % SWEEP_EVERY == 0 {
            self.sweep();
        }
    }

    /// Drop every expired entry. Run every `SWEEP_EVERY`th call to `put`.
    fn sweep(&self) {
        let mut entries = self.entries.lock().unwrap();
        let mut order = self.order.lock().unwrap();
        let expired: Vec<String> = entries.iter().filter(|(_, e)| self.is_expired(e)).map(|(k, _)| k.clone()).collect();
        for key in expired {
            entries.remove(&key);
            order.retain(|k| k != &key);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
