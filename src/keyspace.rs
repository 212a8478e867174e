// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The keyed store: scalars, lists, sets, and priority queues behind a single
//! coarse lock, with lazy and periodic TTL eviction.
//!
//! A per-key `RwLock` sharded map (the teacher's usual `DashMap` idiom, see
//! `client/pool_sessions.rs`) does not give `DEL a b c`, `SINTER`, or
//! `CLEANUP` the atomicity spec.md requires across more than one key at a
//! time. So this module holds the whole map behind one
//! `tokio::sync::Mutex`, traded deliberately for simplicity and correctness
//! over per-key parallelism; see `SPEC_FULL.md` §5 for the reasoning.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use glob::Pattern;
use tokio::sync::Mutex;

use crate::{
    containers::{List, PriorityQueue, Set},
    error::EngineError,
};

/// The typed payload stored under a key.
#[derive(Debug)]
pub enum Value {
    Scalar(String),
    Queue(PriorityQueue),
    List(List),
    Set(Set),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Queue(_) => "queue",
            Value::List(_) => "list",
            Value::Set(_) => "set",
        }
    }
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Default)]
struct KeyspaceInner {
    entries: HashMap<String, Entry>,
}

impl KeyspaceInner {
    /// Remove `key` if present and expired. Returns whether it's gone
    /// (either because it was never there, or because it just was).
    fn evict_if_expired(&mut self, key: &str, now: Instant) {
        if self.entries.get(key).is_some_and(|e| e.is_expired(now)) {
            self.entries.remove(key);
        }
    }

    fn get_live(&mut self, key: &str) -> Option<&Entry> {
        let now = Instant::now();
        self.evict_if_expired(key, now);
        self.entries.get(key)
    }

    fn get_live_mut(&mut self, key: &str) -> Option<&mut Entry> {
        let now = Instant::now();
        self.evict_if_expired(key, now);
        self.entries.get_mut(key)
    }
}

/// Shared handle to the keyspace. Cheap to clone; every clone sees the same
/// data.
#[derive(Clone, Default)]
pub struct Keyspace {
    inner: Arc<Mutex<KeyspaceInner>>,
}

fn wrong_type(expected: &Value, got: &Entry) -> EngineError {
    let _ = expected;
    let _ = got;
    EngineError::WrongType
}

impl Keyspace {
    pub fn new() -> Self {
        Self::default()
    }

    // -- generic --------------------------------------------------------

    pub async fn dbsize(&self) -> i64 {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let keys: Vec<String> = inner.entries.keys().cloned().collect();
        for key in keys {
            inner.evict_if_expired(&key, now);
        }
        inner.entries.len() as i64
    }

    pub async fn flushall(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
    }

    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, EngineError> {
        let Ok(glob) = Pattern::new(pattern) else {
            // Malformed pattern: stop enumeration, no error surfaced.
            return Ok(Vec::new());
        };
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let all_keys: Vec<String> = inner.entries.keys().cloned().collect();
        for key in &all_keys {
            inner.evict_if_expired(key, now);
        }
        Ok(inner.entries.keys().filter(|k| glob.matches(k)).cloned().collect())
    }

    /// Drop up to `limit` expired keys (0 means unbounded). Returns the
    /// number removed.
    pub async fn cleanup(&self, limit: i64) -> i64 {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .take(if limit > 0 { limit as usize } else { usize::MAX })
            .collect();
        let removed = expired.len() as i64;
        for key in expired {
            inner.entries.remove(&key);
        }
        removed
    }

    /// `EXPIRE key seconds`: `seconds <= 0` deletes the key immediately and
    /// returns `true`; a positive value schedules a future deadline.
    /// Returns `false` if the key was absent.
    pub async fn expire(&self, key: &str, seconds: i64) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.get_live_mut(key).is_none() {
            return false;
        }
        if seconds <= 0 {
            inner.entries.remove(key);
            return true;
        }
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.expires_at = Some(Instant::now() + Duration::from_secs(seconds as u64));
        }
        true
    }

    /// `DEL a b c`: removes every named key that's live, atomically. Returns
    /// the count actually removed.
    pub async fn del(&self, keys: &[String]) -> i64 {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let mut removed = 0;
        for key in keys {
            inner.evict_if_expired(key, now);
            if inner.entries.remove(key).is_some() {
                removed += 1;
            }
        }
        removed
    }

    // -- scalar -----------------------------------------------------------

    pub async fn set(&self, key: &str, value: &str, expire_seconds: i64) {
        let mut inner = self.inner.lock().await;
        let expires_at = (expire_seconds > 0)
            .then(|| Instant::now() + Duration::from_secs(expire_seconds as u64));
        inner
            .entries
            .insert(key.to_string(), Entry { value: Value::Scalar(value.to_string()), expires_at });
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        let mut inner = self.inner.lock().await;
        match inner.get_live(key) {
            None => Ok(None),
            Some(entry) => match &entry.value {
                Value::Scalar(s) => Ok(Some(s.clone())),
                other => Err(wrong_type(other, entry)),
            },
        }
    }

    // -- priority queue ---------------------------------------------------

    pub async fn qadd(&self, key: &str, values: &[String], priority: i64) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().await;
        match inner.get_live_mut(key) {
            Some(entry) => match &mut entry.value {
                Value::Queue(q) => {
                    for v in values {
                        q.enqueue(v.clone(), priority);
                    }
                    Ok(())
                },
                _ => Err(EngineError::WrongType),
            },
            None => {
                let mut q = PriorityQueue::new();
                for v in values {
                    q.enqueue(v.clone(), priority);
                }
                inner.entries.insert(
                    key.to_string(),
                    Entry { value: Value::Queue(q), expires_at: None },
                );
                Ok(())
            },
        }
    }

    pub async fn qpop(&self, key: &str) -> Result<String, EngineError> {
        let mut inner = self.inner.lock().await;
        let Some(entry) = inner.get_live_mut(key) else {
            return Ok(String::new());
        };
        let Value::Queue(q) = &mut entry.value else {
            return Err(EngineError::WrongType);
        };
        let popped = q.dequeue();
        if q.is_empty() {
            inner.entries.remove(key);
        }
        Ok(popped)
    }

    /// `None` when the key is absent: a drained queue is removed from the
    /// keyspace (invariant 6), so absence and "empty" are the same state,
    /// and QLEN reports it as nil rather than `0` (spec.md §8 scenario 2).
    pub async fn qlen(&self, key: &str) -> Result<Option<i64>, EngineError> {
        let mut inner = self.inner.lock().await;
        match inner.get_live(key) {
            None => Ok(None),
            Some(entry) => match &entry.value {
                Value::Queue(q) => Ok(Some(q.len() as i64)),
                other => Err(wrong_type(other, entry)),
            },
        }
    }

    // -- list --------------------------------------------------------------

    async fn list_push(&self, key: &str, values: &[String], front: bool) -> Result<i64, EngineError> {
        let mut inner = self.inner.lock().await;
        match inner.get_live_mut(key) {
            Some(entry) => match &mut entry.value {
                Value::List(list) => {
                    for v in values {
                        if front {
                            list.prepend(v.clone());
                        } else {
                            list.append(v.clone());
                        }
                    }
                    Ok(list.len() as i64)
                },
                _ => Err(EngineError::WrongType),
            },
            None => {
                let mut list = List::new();
                for v in values {
                    if front {
                        list.prepend(v.clone());
                    } else {
                        list.append(v.clone());
                    }
                }
                let len = list.len() as i64;
                inner.entries.insert(
                    key.to_string(),
                    Entry { value: Value::List(list), expires_at: None },
                );
                Ok(len)
            },
        }
    }

    pub async fn lpush(&self, key: &str, values: &[String]) -> Result<i64, EngineError> {
        self.list_push(key, values, true).await
    }

    pub async fn rpush(&self, key: &str, values: &[String]) -> Result<i64, EngineError> {
        self.list_push(key, values, false).await
    }

    async fn list_pop(&self, key: &str, front: bool) -> Result<String, EngineError> {
        let mut inner = self.inner.lock().await;
        let Some(entry) = inner.get_live_mut(key) else {
            return Ok(String::new());
        };
        let Value::List(list) = &mut entry.value else {
            return Err(EngineError::WrongType);
        };
        let popped = if front { list.pop_head() } else { list.pop_tail() };
        if list.is_empty() {
            inner.entries.remove(key);
        }
        Ok(popped)
    }

    pub async fn lpop(&self, key: &str) -> Result<String, EngineError> {
        self.list_pop(key, true).await
    }

    pub async fn rpop(&self, key: &str) -> Result<String, EngineError> {
        self.list_pop(key, false).await
    }

    /// `None` when the key is absent; see [`Keyspace::qlen`] for why this
    /// is nil rather than `0`.
    pub async fn llen(&self, key: &str) -> Result<Option<i64>, EngineError> {
        let mut inner = self.inner.lock().await;
        match inner.get_live(key) {
            None => Ok(None),
            Some(entry) => match &entry.value {
                Value::List(l) => Ok(Some(l.len() as i64)),
                other => Err(wrong_type(other, entry)),
            },
        }
    }

    // -- set -----------------------------------------------------------

    /// Returns the number of arguments processed (spec.md §4.3: SADD's
    /// integer reply is the argument count, not the number of new members).
    pub async fn sadd(&self, key: &str, values: &[String]) -> Result<i64, EngineError> {
        let mut inner = self.inner.lock().await;
        match inner.get_live_mut(key) {
            Some(entry) => match &mut entry.value {
                Value::Set(set) => {
                    for v in values {
                        set.add(v.clone());
                    }
                    Ok(values.len() as i64)
                },
                _ => Err(EngineError::WrongType),
            },
            None => {
                let mut set = Set::new();
                for v in values {
                    set.add(v.clone());
                }
                inner
                    .entries
                    .insert(key.to_string(), Entry { value: Value::Set(set), expires_at: None });
                Ok(values.len() as i64)
            },
        }
    }

    /// Unlike [`Keyspace::qpop`]/[`Keyspace::lpop`], an emptied set is kept
    /// in the keyspace: invariant 6 names only List and PriorityQueue for
    /// pop-to-empty removal.
    pub async fn srem(&self, key: &str, values: &[String]) -> Result<i64, EngineError> {
        let mut inner = self.inner.lock().await;
        let Some(entry) = inner.get_live_mut(key) else {
            return Ok(0);
        };
        let Value::Set(set) = &mut entry.value else {
            return Err(EngineError::WrongType);
        };
        let mut removed = 0;
        for v in values {
            if set.delete(v) {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub async fn smembers(&self, key: &str) -> Result<Vec<String>, EngineError> {
        let mut inner = self.inner.lock().await;
        match inner.get_live(key) {
            None => Ok(Vec::new()),
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.items()),
                other => Err(wrong_type(other, entry)),
            },
        }
    }

    pub async fn sismember(&self, key: &str, value: &str) -> Result<bool, EngineError> {
        let mut inner = self.inner.lock().await;
        match inner.get_live(key) {
            None => Ok(false),
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.has(value)),
                other => Err(wrong_type(other, entry)),
            },
        }
    }

    pub async fn scard(&self, key: &str) -> Result<i64, EngineError> {
        let mut inner = self.inner.lock().await;
        match inner.get_live(key) {
            None => Ok(0),
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.len() as i64),
                other => Err(wrong_type(other, entry)),
            },
        }
    }

    /// Empty whenever either operand is missing or not a set (spec.md §4.3).
    /// Parsing guarantees exactly two keys.
    pub async fn sinter(&self, keys: &[String]) -> Result<Vec<String>, EngineError> {
        let mut inner = self.inner.lock().await;
        let mut sets: Vec<Set> = Vec::with_capacity(keys.len());
        for key in keys {
            match inner.get_live(key) {
                None => return Ok(Vec::new()),
                Some(entry) => match &entry.value {
                    Value::Set(set) => sets.push(set.clone()),
                    _ => return Ok(Vec::new()),
                },
            }
        }
        let Some((first, rest)) = sets.split_first() else {
            return Ok(Vec::new());
        };
        let mut acc = first.clone();
        for other in rest {
            acc = acc.intersect(other).into_iter().collect();
        }
        Ok(acc.items())
    }

    /// Name of the type stored at `key`, if any (for diagnostics and tests).
    pub async fn type_name_of(&self, key: &str) -> Option<&'static str> {
        let mut inner = self.inner.lock().await;
        inner.get_live(key).map(|e| e.value.type_name())
    }

    /// Backdate a key's expiry into the past without evicting it, so tests
    /// can exercise lazy/periodic reclamation without sleeping past a whole
    /// second of TTL granularity.
    #[cfg(test)]
    async fn force_expired(&self, key: &str) {
        let mut inner = self.inner.lock().await;
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.expires_at = Some(Instant::now() - Duration::from_secs(1));
        }
    }
}
