//! Time-aware metric store.
//!
//! Holds the currently published generation. Two eviction paths share one
//! expiry predicate:
//! - lazy: `collect` drops entries it finds expired,
//! - eager: `replace` drops every entry missing from the new generation.
//!
//! The mutex is held only for the map walk or swap. Callers get owned
//! snapshots, so streaming a scrape response never blocks a scan.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use crate::key::canonical_key;
use crate::model::Sample;

/// A sample plus its insertion and expiration times.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    sample: Sample,
    inserted_at: SystemTime,
    expires_at: SystemTime,
}

impl StoredEntry {
    pub fn sample(&self) -> &Sample {
        &self.sample
    }
    pub fn inserted_at(&self) -> SystemTime {
        self.inserted_at
    }
    pub fn expires_at(&self) -> SystemTime {
        self.expires_at
    }

    /// Shared by lazy and eager eviction.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now > self.expires_at
    }
}

/// Identifying metadata of a stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub name: String,
    pub help: String,
    pub label_names: Vec<String>,
}

/// Longest lifetime an entry can get; larger durations are clamped so
/// `inserted_at + expire` always fits in a `SystemTime`.
pub const MAX_EXPIRE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Effective expire duration: zero falls back to the default, and the result
/// is clamped to [`MAX_EXPIRE`].
fn effective_expire(expire: Option<Duration>, default_expire: Duration) -> Duration {
    let expire = match expire {
        Some(d) if !d.is_zero() => d,
        _ => default_expire,
    };
    expire.min(MAX_EXPIRE)
}

/// `now + expire`, or a far-future instant shortened until it fits when the
/// clock cannot hold the sum.
fn deadline(now: SystemTime, mut expire: Duration) -> SystemTime {
    loop {
        if let Some(t) = now.checked_add(expire) {
            return t;
        }
        if expire.is_zero() {
            return now;
        }
        expire /= 2;
    }
}

/// A generation under construction: invisible to readers until installed
/// with [`MetricStore::replace`].
#[derive(Debug, Clone)]
pub struct Generation {
    entries: HashMap<String, StoredEntry>,
    default_expire: Duration,
}

impl Generation {
    pub fn new(default_expire: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            default_expire,
        }
    }

    /// Insert a sample observed now. See [`Generation::insert_at`].
    pub fn insert(&mut self, sample: Sample, expire: Option<Duration>) -> String {
        self.insert_at(sample, expire, SystemTime::now())
    }

    /// Store `sample` as inserted at `now` under its canonical key. A
    /// colliding key is overwritten (last write wins). Returns the key.
    pub fn insert_at(&mut self, sample: Sample, expire: Option<Duration>, now: SystemTime) -> String {
        let key = canonical_key(&sample.name, &sample.labels);
        let expire = effective_expire(expire, self.default_expire);

        let entry = StoredEntry {
            sample,
            inserted_at: now,
            expires_at: deadline(now, expire),
        };
        self.entries.insert(key.clone(), entry);
        key
    }

    pub fn get(&self, key: &str) -> Option<&StoredEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Concurrency-safe container for the published generation.
pub struct MetricStore {
    entries: Mutex<HashMap<String, StoredEntry>>,
    default_expire: Duration,
}

impl MetricStore {
    pub fn new(default_expire: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_expire,
        }
    }

    pub fn default_expire(&self) -> Duration {
        self.default_expire
    }

    /// Empty generation using this store's default expiration.
    pub fn new_generation(&self) -> Generation {
        Generation::new(self.default_expire)
    }

    // A panic while holding the lock cannot leave the map half-written
    // (every mutation is a single insert/remove/swap), so recover the guard.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enumerate for publishing at the current wall-clock time.
    pub fn collect(&self) -> Vec<Sample> {
        self.collect_at(SystemTime::now())
    }

    /// Return every entry still valid at `now`, evicting the expired ones.
    ///
    /// The returned snapshot is sorted by key and owned by the caller; the
    /// lock is already released when it is returned.
    pub fn collect_at(&self, now: SystemTime) -> Vec<Sample> {
        let mut valid: Vec<(String, Sample)> = Vec::new();
        let mut expired: Vec<String> = Vec::new();

        {
            let mut entries = self.lock();
            for (key, entry) in entries.iter() {
                if entry.is_expired(now) {
                    expired.push(key.clone());
                } else {
                    valid.push((key.clone(), entry.sample.clone()));
                }
            }
            for key in &expired {
                entries.remove(key);
            }
        }

        if !expired.is_empty() {
            tracing::debug!(evicted = expired.len(), "expired metrics evicted");
        }

        valid.sort_by(|a, b| a.0.cmp(&b.0));
        valid.into_iter().map(|(_, s)| s).collect()
    }

    /// Install `generation` as the current one, discarding the previous
    /// generation entirely. Returns how many old keys vanished.
    pub fn replace(&self, generation: Generation) -> usize {
        let (previous, dropped) = {
            let mut entries = self.lock();
            let previous = std::mem::replace(&mut *entries, generation.entries);
            let dropped = previous.keys().filter(|k| !entries.contains_key(*k)).count();
            (previous, dropped)
        };
        // Old entries are freed outside the lock.
        drop(previous);
        dropped
    }

    /// Descriptors of every stored entry, taken in one locked pass.
    ///
    /// Scrapes do not need it: the text encoder takes help and label names
    /// from the collected samples. The scanner logs it in debug cycles.
    pub fn describe(&self) -> Vec<Descriptor> {
        let entries = self.lock();
        entries
            .values()
            .map(|e| Descriptor {
                name: e.sample.name.clone(),
                help: e.sample.help.clone(),
                label_names: e.sample.label_names(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
