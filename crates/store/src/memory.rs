//! Embedded store with the same semantics as the Redis commands we use.
//!
//! Expiry is evaluated lazily against the injected clock, so tests can move
//! time forward without sleeping.

use crate::store::{ttl_secs, Store, StoreInfo};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use presence_core::{Clock, Error, Result, StoreErrorCode, SystemClock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Value {
    String(String),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
    SortedSet(HashMap<String, f64>),
}

impl Value {
    fn approx_size(&self) -> usize {
        match self {
            Self::String(s) => s.len(),
            Self::Hash(h) => h.iter().map(|(k, v)| k.len() + v.len()).sum(),
            Self::List(l) => l.iter().map(String::len).sum(),
            Self::SortedSet(z) => z.keys().map(|m| m.len() + 8).sum(),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

fn wrong_type() -> Error {
    Error::store(
        StoreErrorCode::Protocol,
        "WRONGTYPE Operation against a key holding the wrong kind of value",
    )
}

/// Resolves a Redis-style inclusive index range against a length.
fn normalize_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}

/// Glob match supporting `*` only.
fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }

    let mut rest = key;
    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !rest.starts_with(first) {
        return false;
    }
    rest = &rest[first.len()..];

    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }

    rest.len() >= last.len() && rest.ends_with(last)
}

fn format_memory(bytes: usize) -> String {
    const K: f64 = 1024.0;
    let b = bytes as f64;
    if b >= K * K * K {
        format!("{:.2}G", b / (K * K * K))
    } else if b >= K * K {
        format!("{:.2}M", b / (K * K))
    } else if b >= K {
        format!("{:.2}K", b / K)
    } else {
        format!("{}B", bytes)
    }
}

/// In-process store.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Remaining time to live of a key, if it exists and has one.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        let entries = self.entries.lock();
        let entry = entries.get(key).filter(|e| !e.is_expired(now))?;
        entry
            .expires_at
            .and_then(|at| (at - now).to_std().ok())
    }

    /// Whether the key currently exists.
    pub fn exists(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .lock()
            .get(key)
            .is_some_and(|e| !e.is_expired(now))
    }

    /// Overwrites a list element in place; used to plant corrupt payloads in tests.
    pub fn lset(&self, key: &str, index: usize, value: String) -> Result<()> {
        let mut entries = self.entries.lock();
        match entries.get_mut(key).map(|e| &mut e.value) {
            Some(Value::List(list)) => match list.get_mut(index) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(Error::store(StoreErrorCode::Protocol, "ERR index out of range")),
            },
            Some(_) => Err(wrong_type()),
            None => Err(Error::store(StoreErrorCode::Protocol, "ERR no such key")),
        }
    }

    /// Runs `f` against the live entry map, dropping `key` first if it has expired.
    fn with_entries<T>(&self, key: &str, f: impl FnOnce(&mut HashMap<String, Entry>) -> T) -> T {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        f(&mut entries)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        self.with_entries(key, |entries| {
            let entry = entries
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(Value::SortedSet(HashMap::new())));
            match &mut entry.value {
                Value::SortedSet(set) => {
                    set.insert(member.to_string(), score);
                    Ok(())
                }
                _ => Err(wrong_type()),
            }
        })
    }

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        self.with_entries(key, |entries| {
            let removed = match entries.get_mut(key).map(|e| &mut e.value) {
                Some(Value::SortedSet(set)) => {
                    let before = set.len();
                    set.retain(|_, score| *score < min || *score > max);
                    (before - set.len()) as u64
                }
                Some(_) => return Err(wrong_type()),
                None => return Ok(0),
            };
            if matches!(entries.get(key).map(|e| &e.value), Some(Value::SortedSet(s)) if s.is_empty())
            {
                entries.remove(key);
            }
            Ok(removed)
        })
    }

    async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        self.with_entries(key, |entries| match entries.get(key).map(|e| &e.value) {
            Some(Value::SortedSet(set)) => {
                let mut members: Vec<(&String, f64)> = set.iter().map(|(m, s)| (m, *s)).collect();
                // Redis orders equal scores lexicographically, reversed here
                members.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(a.0)));
                Ok(match normalize_range(members.len(), start, stop) {
                    Some((from, to)) => members[from..=to].iter().map(|(m, _)| (*m).clone()).collect(),
                    None => Vec::new(),
                })
            }
            Some(_) => Err(wrong_type()),
            None => Ok(Vec::new()),
        })
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        self.with_entries(key, |entries| match entries.get(key).map(|e| &e.value) {
            Some(Value::SortedSet(set)) => Ok(set.get(member).copied()),
            Some(_) => Err(wrong_type()),
            None => Ok(None),
        })
    }

    async fn hset_multiple(&self, key: &str, fields: &[(&str, String)]) -> Result<()> {
        self.with_entries(key, |entries| {
            let entry = entries
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(Value::Hash(HashMap::new())));
            match &mut entry.value {
                Value::Hash(hash) => {
                    for (field, value) in fields {
                        hash.insert(field.to_string(), value.clone());
                    }
                    Ok(())
                }
                _ => Err(wrong_type()),
            }
        })
    }

    async fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>> {
        self.with_entries(key, |entries| match entries.get(key).map(|e| &e.value) {
            Some(Value::Hash(hash)) => Ok(fields.iter().map(|f| hash.get(*f).cloned()).collect()),
            Some(_) => Err(wrong_type()),
            None => Ok(vec![None; fields.len()]),
        })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let expires_at = self.clock.now() + ChronoDuration::seconds(ttl_secs(ttl) as i64);
        self.with_entries(key, |entries| match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(expires_at);
                Ok(true)
            }
            None => Ok(false),
        })
    }

    async fn lpush(&self, key: &str, value: String) -> Result<u64> {
        self.with_entries(key, |entries| {
            let entry = entries
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(Value::List(VecDeque::new())));
            match &mut entry.value {
                Value::List(list) => {
                    list.push_front(value);
                    Ok(list.len() as u64)
                }
                _ => Err(wrong_type()),
            }
        })
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<()> {
        self.with_entries(key, |entries| {
            let keep = match entries.get_mut(key).map(|e| &mut e.value) {
                Some(Value::List(list)) => match normalize_range(list.len(), start, stop) {
                    Some((from, to)) => {
                        list.truncate(to + 1);
                        list.drain(..from);
                        true
                    }
                    None => false,
                },
                Some(_) => return Err(wrong_type()),
                None => return Ok(()),
            };
            if !keep {
                entries.remove(key);
            }
            Ok(())
        })
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        self.with_entries(key, |entries| match entries.get(key).map(|e| &e.value) {
            Some(Value::List(list)) => Ok(match normalize_range(list.len(), start, stop) {
                Some((from, to)) => list.range(from..=to).cloned().collect(),
                None => Vec::new(),
            }),
            Some(_) => Err(wrong_type()),
            None => Ok(Vec::new()),
        })
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        self.with_entries(key, |entries| match entries.get(key).map(|e| &e.value) {
            Some(Value::List(list)) => Ok(list.len() as u64),
            Some(_) => Err(wrong_type()),
            None => Ok(0),
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let found = self.with_entries(key, |entries| match entries.get(key).map(|e| &e.value) {
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(wrong_type()),
            None => Ok(None),
        })?;
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        Ok(found)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let expires_at = self.clock.now() + ChronoDuration::seconds(ttl_secs(ttl) as i64);
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value: Value::String(value),
                expires_at: Some(expires_at),
            },
        );
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let removed = keys
            .iter()
            .filter_map(|k| entries.remove(k))
            .filter(|e| !e.is_expired(now))
            .count();
        Ok(removed as u64)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        entries.retain(|_, e| !e.is_expired(now));
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn info(&self) -> Result<StoreInfo> {
        let used: usize = self
            .entries
            .lock()
            .iter()
            .map(|(k, e)| k.len() + e.value.approx_size())
            .sum();
        Ok(StoreInfo {
            used_memory_human: Some(format_memory(used)),
            keyspace_hits: Some(self.hits.load(Ordering::Relaxed)),
            keyspace_misses: Some(self.misses.load(Ordering::Relaxed)),
        })
    }
}
