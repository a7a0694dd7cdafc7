//! # Per-Entity Period Cache
//!
//! In-memory store keyed by period, holding the last-fetched row list for
//! that period. The cache is purely passive: it has no network handling and
//! no failure handling of its own. The endpoint layer populates it on a
//! read miss and keeps it consistent with every successful mutation.
//!
//! Two invariants are enforced here:
//! - a bucket never holds data for the wrong period: keys are formed
//!   deterministically from (month, year), and the "all periods" sentinel is
//!   a distinct key that never overlaps a numeric one;
//! - a mutation touches every bucket that could contain the affected row,
//!   i.e. the row's own period bucket plus the `All` bucket.
//!
//! Fetches are tagged with a monotonically increasing generation per key so
//! that a late-arriving response from a superseded fetch (the user switched
//! periods faster than the round trip) is discarded instead of overwriting
//! newer data.

use std::collections::HashMap;
use std::fmt;

use shared::{Commitment, Expense, Income, Period};

/// Key of one cache bucket: a concrete period, or the sentinel holding the
/// unfiltered "whole history" list used by the year view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodKey {
    Month(Period),
    All,
}

impl From<Period> for PeriodKey {
    fn from(period: Period) -> Self {
        PeriodKey::Month(period)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Month(period) => write!(f, "{}", period),
            PeriodKey::All => write!(f, "all"),
        }
    }
}

/// What the cache needs to know about a stored entity: its server-assigned
/// identity and which period bucket owns it.
pub trait CacheRecord {
    fn row_index(&self) -> u32;

    /// The period this row belongs to, derived from the entity's relevant
    /// date field. `None` when that field does not parse; such rows only
    /// ever live in the `All` bucket.
    fn period(&self) -> Option<Period>;
}

impl CacheRecord for Expense {
    fn row_index(&self) -> u32 {
        self.row_index
    }

    fn period(&self) -> Option<Period> {
        Period::from_iso_date(&self.payment_date).ok()
    }
}

impl CacheRecord for Income {
    fn row_index(&self) -> u32 {
        self.row_index
    }

    fn period(&self) -> Option<Period> {
        Period::from_reference(&self.reference_month).ok()
    }
}

impl CacheRecord for Commitment {
    fn row_index(&self) -> u32 {
        self.row_index
    }

    fn period(&self) -> Option<Period> {
        Period::from_reference(&self.reference_month).ok()
    }
}

/// Proof that a fetch was started for a key; redeemed with
/// [`PeriodCache::set_latest`] when the response arrives.
#[derive(Debug)]
pub struct FetchToken {
    key: PeriodKey,
    generation: u64,
}

impl FetchToken {
    pub fn key(&self) -> PeriodKey {
        self.key
    }
}

/// In-memory period cache for one entity type.
#[derive(Debug)]
pub struct PeriodCache<T> {
    buckets: HashMap<PeriodKey, Vec<T>>,
    generations: HashMap<PeriodKey, u64>,
}

impl<T> Default for PeriodCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PeriodCache<T> {
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
            generations: HashMap::new(),
        }
    }

    /// Returns the bucket for `key`, or `None` when that period was never
    /// fetched (or was invalidated). The caller must then fetch from the
    /// network and populate the bucket.
    pub fn get(&self, key: PeriodKey) -> Option<&[T]> {
        self.buckets.get(&key).map(Vec::as_slice)
    }

    /// The sentinel bucket with the unfiltered list.
    pub fn get_all(&self) -> Option<&[T]> {
        self.get(PeriodKey::All)
    }

    /// Overwrite/create the bucket unconditionally. Also supersedes any
    /// fetch still in flight for this key.
    pub fn set(&mut self, key: PeriodKey, list: Vec<T>) {
        *self.generations.entry(key).or_insert(0) += 1;
        self.buckets.insert(key, list);
    }

    /// Record that a fetch for `key` is starting, superseding any earlier
    /// in-flight fetch for the same key.
    pub fn begin_fetch(&mut self, key: PeriodKey) -> FetchToken {
        let generation = self.generations.entry(key).or_insert(0);
        *generation += 1;
        FetchToken {
            key,
            generation: *generation,
        }
    }

    /// Store a fetched list if the token is still the newest for its key.
    /// Returns whether the list was applied; a stale response is dropped.
    pub fn set_latest(&mut self, token: FetchToken, list: Vec<T>) -> bool {
        let current = self.generations.get(&token.key).copied().unwrap_or(0);
        if token.generation != current {
            return false;
        }
        self.buckets.insert(token.key, list);
        true
    }

    /// Drop the bucket for `key`; the next read will fetch from network.
    pub fn invalidate(&mut self, key: PeriodKey) {
        *self.generations.entry(key).or_insert(0) += 1;
        self.buckets.remove(&key);
    }

    /// Drop every bucket.
    pub fn clear(&mut self) {
        for generation in self.generations.values_mut() {
            *generation += 1;
        }
        self.buckets.clear();
    }
}

impl<T: CacheRecord + Clone> PeriodCache<T> {
    /// Insert a newly created row into the bucket of its own period, if that
    /// bucket was already fetched; a missing bucket makes this a no-op (the
    /// next fetch picks the row up from the network). The `All` bucket is
    /// kept in sync when present.
    pub fn add(&mut self, entity: T) {
        if let Some(period) = entity.period() {
            if let Some(bucket) = self.buckets.get_mut(&PeriodKey::Month(period)) {
                bucket.push(entity.clone());
            }
        }
        if let Some(bucket) = self.buckets.get_mut(&PeriodKey::All) {
            bucket.push(entity);
        }
    }

    /// Find the row by identity within the bucket and merge fields via the
    /// caller's patch; no-op when the bucket or row is absent. The patch is
    /// mirrored into every other bucket that holds the same row.
    pub fn update(&mut self, key: PeriodKey, row_index: u32, apply: impl Fn(&mut T)) {
        let patched_period = self.patch_in(key, row_index, &apply);
        match key {
            PeriodKey::Month(_) => {
                self.patch_in(PeriodKey::All, row_index, &apply);
            }
            PeriodKey::All => {
                if let Some(Some(period)) = patched_period {
                    self.patch_in(PeriodKey::Month(period), row_index, &apply);
                }
            }
        }
    }

    /// Delete the matching row by identity; no-op when absent. Mirrored into
    /// every other bucket that holds the same row.
    pub fn remove(&mut self, key: PeriodKey, row_index: u32) {
        let removed = self.remove_in(key, row_index);
        match key {
            PeriodKey::Month(_) => {
                self.remove_in(PeriodKey::All, row_index);
            }
            PeriodKey::All => {
                if let Some(period) = removed.and_then(|row| row.period()) {
                    self.remove_in(PeriodKey::Month(period), row_index);
                }
            }
        }
    }

    fn patch_in(
        &mut self,
        key: PeriodKey,
        row_index: u32,
        apply: &impl Fn(&mut T),
    ) -> Option<Option<Period>> {
        let bucket = self.buckets.get_mut(&key)?;
        let row = bucket.iter_mut().find(|row| row.row_index() == row_index)?;
        apply(row);
        Some(row.period())
    }

    fn remove_in(&mut self, key: PeriodKey, row_index: u32) -> Option<T> {
        let bucket = self.buckets.get_mut(&key)?;
        let position = bucket.iter().position(|row| row.row_index() == row_index)?;
        Some(bucket.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(row_index: u32, payment_date: &str, amount: f64) -> Expense {
        Expense {
            row_index,
            description: format!("Despesa {}", row_index),
            category: "Geral".to_string(),
            amount,
            payment_date: payment_date.to_string(),
        }
    }

    fn jan() -> PeriodKey {
        PeriodKey::Month(Period::new(1, 2026))
    }

    #[test]
    fn test_get_misses_for_never_fetched_period() {
        let cache: PeriodCache<Expense> = PeriodCache::new();
        assert!(cache.get(jan()).is_none());
        assert!(cache.get_all().is_none());
    }

    #[test]
    fn test_set_then_get_round_trips() {
        let mut cache = PeriodCache::new();
        let rows = vec![expense(1, "2026-01-05", 100.0)];
        cache.set(jan(), rows.clone());
        assert_eq!(cache.get(jan()).unwrap(), rows.as_slice());
    }

    #[test]
    fn test_all_sentinel_is_distinct_from_month_keys() {
        let mut cache = PeriodCache::new();
        cache.set(PeriodKey::All, vec![expense(1, "2026-01-05", 10.0)]);
        assert!(cache.get(jan()).is_none());
        assert_eq!(cache.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_add_inserts_into_existing_period_bucket() {
        let mut cache = PeriodCache::new();
        cache.set(jan(), vec![expense(1, "2026-01-05", 10.0)]);

        cache.add(expense(2, "2026-01-12", 20.0));

        let bucket = cache.get(jan()).unwrap();
        assert_eq!(bucket.len(), 2);
        assert!(bucket.iter().any(|row| row.row_index == 2));
    }

    #[test]
    fn test_add_is_noop_without_matching_bucket() {
        let mut cache = PeriodCache::new();
        cache.set(jan(), vec![expense(1, "2026-01-05", 10.0)]);

        // February was never fetched; the row waits for the next fetch.
        cache.add(expense(9, "2026-02-01", 50.0));

        assert_eq!(cache.get(jan()).unwrap().len(), 1);
        assert!(cache.get(PeriodKey::Month(Period::new(2, 2026))).is_none());
    }

    #[test]
    fn test_add_keeps_all_bucket_in_sync() {
        let mut cache = PeriodCache::new();
        cache.set(jan(), vec![]);
        cache.set(PeriodKey::All, vec![]);

        cache.add(expense(3, "2026-01-20", 30.0));

        assert_eq!(cache.get(jan()).unwrap().len(), 1);
        assert_eq!(cache.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_update_merges_fields_and_mirrors_into_all() {
        let mut cache = PeriodCache::new();
        cache.set(jan(), vec![expense(1, "2026-01-05", 10.0)]);
        cache.set(PeriodKey::All, vec![expense(1, "2026-01-05", 10.0)]);

        cache.update(jan(), 1, |row| row.amount = 99.0);

        assert_eq!(cache.get(jan()).unwrap()[0].amount, 99.0);
        assert_eq!(cache.get_all().unwrap()[0].amount, 99.0);
    }

    #[test]
    fn test_update_is_noop_for_missing_bucket_or_row() {
        let mut cache = PeriodCache::new();
        cache.set(jan(), vec![expense(1, "2026-01-05", 10.0)]);

        cache.update(jan(), 42, |row| row.amount = 0.0);
        cache.update(PeriodKey::Month(Period::new(2, 2026)), 1, |row| {
            row.amount = 0.0
        });

        assert_eq!(cache.get(jan()).unwrap()[0].amount, 10.0);
    }

    #[test]
    fn test_update_through_all_reaches_month_bucket() {
        let mut cache = PeriodCache::new();
        cache.set(jan(), vec![expense(1, "2026-01-05", 10.0)]);
        cache.set(PeriodKey::All, vec![expense(1, "2026-01-05", 10.0)]);

        cache.update(PeriodKey::All, 1, |row| row.amount = 55.0);

        assert_eq!(cache.get(jan()).unwrap()[0].amount, 55.0);
    }

    #[test]
    fn test_remove_deletes_by_identity() {
        let mut cache = PeriodCache::new();
        cache.set(
            jan(),
            vec![expense(1, "2026-01-05", 10.0), expense(2, "2026-01-06", 20.0)],
        );
        cache.set(PeriodKey::All, vec![expense(1, "2026-01-05", 10.0)]);

        cache.remove(jan(), 1);

        assert!(cache.get(jan()).unwrap().iter().all(|row| row.row_index != 1));
        assert!(cache.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_remove_of_absent_row_leaves_bucket_unchanged() {
        let mut cache = PeriodCache::new();
        cache.set(jan(), vec![expense(1, "2026-01-05", 10.0)]);

        cache.remove(jan(), 999);

        assert_eq!(cache.get(jan()).unwrap().len(), 1);
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut cache = PeriodCache::new();

        let first = cache.begin_fetch(jan());
        let second = cache.begin_fetch(jan());

        // The newer fetch resolves first.
        assert!(cache.set_latest(second, vec![expense(2, "2026-01-10", 20.0)]));
        // The older response arrives late and must not overwrite.
        assert!(!cache.set_latest(first, vec![expense(1, "2026-01-05", 10.0)]));

        let bucket = cache.get(jan()).unwrap();
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].row_index, 2);
    }

    #[test]
    fn test_set_supersedes_in_flight_fetch() {
        let mut cache = PeriodCache::new();
        let token = cache.begin_fetch(jan());
        cache.set(jan(), vec![expense(7, "2026-01-01", 70.0)]);

        assert!(!cache.set_latest(token, vec![]));
        assert_eq!(cache.get(jan()).unwrap()[0].row_index, 7);
    }

    #[test]
    fn test_invalidate_forces_next_read_to_miss() {
        let mut cache = PeriodCache::new();
        cache.set(jan(), vec![expense(1, "2026-01-05", 10.0)]);
        cache.invalidate(jan());
        assert!(cache.get(jan()).is_none());
    }
}
