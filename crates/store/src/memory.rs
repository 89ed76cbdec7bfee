//! In-memory reference store
//!
//! `MemoryStore` implements the [`Store`] contract with plain in-process
//! maps behind a single `parking_lot::RwLock`. Batches take the write
//! lock once, which makes them trivially atomic; watch tokens compare
//! per-key version counters stamped from a store-wide write clock.
//!
//! This is the reference backend for tests and embedded use, not a
//! persistence layer.

use crate::command::{Batch, Command, Reply};
use crate::traits::{ExecOutcome, Store, WatchToken};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Bound;
use vellum_core::StoreError;

#[derive(Default)]
struct Shelves {
    records: HashMap<String, Vec<u8>>,
    sets: HashMap<String, HashSet<String>>,
    sorted: HashMap<String, HashMap<String, f64>>,
    versions: HashMap<String, u64>,
    clock: u64,
}

impl Shelves {
    fn bump(&mut self, key: &str) {
        self.clock += 1;
        self.versions.insert(key.to_string(), self.clock);
    }

    fn apply(&mut self, command: &Command) -> Reply {
        match command {
            Command::Put { key, value } => {
                self.records.insert(key.clone(), value.clone());
                self.bump(key);
                Reply::Done
            }
            Command::Delete { key } => {
                let mut removed = 0u64;
                if self.records.remove(key).is_some() {
                    removed = 1;
                }
                if self.sets.remove(key).is_some() {
                    removed = 1;
                }
                if self.sorted.remove(key).is_some() {
                    removed = 1;
                }
                if removed > 0 {
                    self.bump(key);
                }
                Reply::Count(removed)
            }
            Command::SetAdd { key, member } => {
                let added = self.sets.entry(key.clone()).or_default().insert(member.clone());
                if added {
                    self.bump(key);
                }
                Reply::Count(added as u64)
            }
            Command::SetRemove { key, member } => {
                let mut removed = false;
                if let Some(members) = self.sets.get_mut(key) {
                    removed = members.remove(member);
                    // Avoid accumulating empty sets
                    if members.is_empty() {
                        self.sets.remove(key);
                    }
                }
                if removed {
                    self.bump(key);
                }
                Reply::Count(removed as u64)
            }
            Command::SortedAdd { key, score, member } => {
                let entry = self.sorted.entry(key.clone()).or_default();
                let added = entry.insert(member.clone(), *score).is_none();
                self.bump(key);
                Reply::Count(added as u64)
            }
            Command::SortedRemove { key, member } => {
                let mut removed = false;
                if let Some(members) = self.sorted.get_mut(key) {
                    removed = members.remove(member).is_some();
                    if members.is_empty() {
                        self.sorted.remove(key);
                    }
                }
                if removed {
                    self.bump(key);
                }
                Reply::Count(removed as u64)
            }
        }
    }

    fn all_keys(&self) -> BTreeSet<&str> {
        self.records
            .keys()
            .chain(self.sets.keys())
            .chain(self.sorted.keys())
            .map(String::as_str)
            .collect()
    }
}

/// In-memory [`Store`] implementation
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Shelves>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

/// Glob match supporting `*` (any run) and `?` (one char), over bytes
fn glob_match(pattern: &str, text: &str) -> bool {
    let pat = pattern.as_bytes();
    let text = text.as_bytes();
    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while t < text.len() {
        if p < pat.len() && (pat[p] == b'?' || pat[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == b'*' {
            star = Some(p);
            mark = t;
            p += 1;
        } else if let Some(s) = star {
            p = s + 1;
            mark += 1;
            t = mark;
        } else {
            return false;
        }
    }
    while p < pat.len() && pat[p] == b'*' {
        p += 1;
    }
    p == pat.len()
}

fn score_in_bounds(score: f64, min: &Bound<f64>, max: &Bound<f64>) -> bool {
    let above = match min {
        Bound::Unbounded => true,
        Bound::Included(b) => score >= *b,
        Bound::Excluded(b) => score > *b,
    };
    let below = match max {
        Bound::Unbounded => true,
        Bound::Included(b) => score <= *b,
        Bound::Excluded(b) => score < *b,
    };
    above && below
}

fn lex_in_bounds(member: &str, min: &Bound<String>, max: &Bound<String>) -> bool {
    let above = match min {
        Bound::Unbounded => true,
        Bound::Included(b) => member >= b.as_str(),
        Bound::Excluded(b) => member > b.as_str(),
    };
    let below = match max {
        Bound::Unbounded => true,
        Bound::Included(b) => member <= b.as_str(),
        Bound::Excluded(b) => member < b.as_str(),
    };
    above && below
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner.read().records.get(key).cloned())
    }

    fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, StoreError> {
        let shelves = self.inner.read();
        Ok(keys.iter().map(|k| shelves.records.get(k).cloned()).collect())
    }

    fn scan(
        &self,
        pattern: &str,
        cursor: u64,
        count: usize,
    ) -> Result<(u64, Vec<String>), StoreError> {
        let shelves = self.inner.read();
        let matching: Vec<&str> = shelves
            .all_keys()
            .into_iter()
            .filter(|k| glob_match(pattern, k))
            .collect();

        let offset = cursor as usize;
        let page = if count == 0 { matching.len() } else { count };
        let keys: Vec<String> = matching
            .iter()
            .skip(offset)
            .take(page)
            .map(|k| k.to_string())
            .collect();

        let consumed = offset + keys.len();
        let next = if consumed < matching.len() {
            consumed as u64
        } else {
            0
        };
        Ok((next, keys))
    }

    fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let shelves = self.inner.read();
        let mut members: Vec<String> = shelves
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        Ok(members)
    }

    fn set_union(&self, keys: &[String]) -> Result<Vec<String>, StoreError> {
        let shelves = self.inner.read();
        let mut union = BTreeSet::new();
        for key in keys {
            if let Some(members) = shelves.sets.get(key) {
                union.extend(members.iter().cloned());
            }
        }
        Ok(union.into_iter().collect())
    }

    fn set_difference(&self, base: &str, subtract: &[String]) -> Result<Vec<String>, StoreError> {
        let shelves = self.inner.read();
        let Some(members) = shelves.sets.get(base) else {
            return Ok(Vec::new());
        };
        let mut result: Vec<String> = members
            .iter()
            .filter(|m| {
                !subtract
                    .iter()
                    .any(|k| shelves.sets.get(k).is_some_and(|s| s.contains(*m)))
            })
            .cloned()
            .collect();
        result.sort();
        Ok(result)
    }

    fn set_len(&self, key: &str) -> Result<u64, StoreError> {
        Ok(self.inner.read().sets.get(key).map_or(0, |s| s.len() as u64))
    }

    fn sorted_range_by_score(
        &self,
        key: &str,
        min: Bound<f64>,
        max: Bound<f64>,
    ) -> Result<Vec<String>, StoreError> {
        let shelves = self.inner.read();
        let Some(members) = shelves.sorted.get(key) else {
            return Ok(Vec::new());
        };
        let mut hits: Vec<(&f64, &String)> = members
            .iter()
            .filter(|(_, score)| score_in_bounds(**score, &min, &max))
            .map(|(member, score)| (score, member))
            .collect();
        hits.sort_by(|(sa, ma), (sb, mb)| {
            sa.partial_cmp(sb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ma.cmp(mb))
        });
        Ok(hits.into_iter().map(|(_, m)| m.clone()).collect())
    }

    fn sorted_range_by_lex(
        &self,
        key: &str,
        min: Bound<String>,
        max: Bound<String>,
    ) -> Result<Vec<String>, StoreError> {
        let shelves = self.inner.read();
        let Some(members) = shelves.sorted.get(key) else {
            return Ok(Vec::new());
        };
        let mut hits: Vec<String> = members
            .keys()
            .filter(|m| lex_in_bounds(m, &min, &max))
            .cloned()
            .collect();
        hits.sort();
        Ok(hits)
    }

    fn exec(&self, batch: Batch) -> Result<Vec<Reply>, StoreError> {
        let mut shelves = self.inner.write();
        Ok(batch.commands().iter().map(|c| shelves.apply(c)).collect())
    }

    fn watch(&self, key: &str) -> Result<WatchToken, StoreError> {
        let shelves = self.inner.read();
        Ok(WatchToken {
            key: key.to_string(),
            version: shelves.versions.get(key).copied(),
        })
    }

    fn exec_watched(&self, token: &WatchToken, batch: Batch) -> Result<ExecOutcome, StoreError> {
        let mut shelves = self.inner.write();
        if shelves.versions.get(&token.key).copied() != token.version {
            return Ok(ExecOutcome::Aborted);
        }
        let replies = batch.commands().iter().map(|c| shelves.apply(c)).collect();
        Ok(ExecOutcome::Committed(replies))
    }
}
