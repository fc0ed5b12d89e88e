//! Result table for matched objects
//!
//! The [`Collector`] is append-only. Capacity doubles until it reaches a
//! threshold and then grows in fixed steps, so very large result sets do not
//! overshoot by a whole doubling. A failed reservation aborts the run.

pub mod error;

pub use error::CollectError;

use std::path::PathBuf;

use crate::time::TimeValue;

/// Capacity reserved before the first append
pub const INITIAL_CAPACITY: usize = 4096;

/// Capacity after which growth switches from doubling to fixed steps
pub const DOUBLING_THRESHOLD: usize = 1 << 20;

/// Fixed growth step past the threshold
pub const GROWTH_INCREMENT: usize = 1 << 18;

/// A selected object, immutable once recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    pub path: PathBuf,
    /// Access or modification time, whichever the selection used
    pub time: TimeValue,
    pub size: u64,
}

impl ObjectRecord {
    #[must_use]
    pub const fn new(path: PathBuf, time: TimeValue, size: u64) -> Self {
        Self { path, time, size }
    }
}

/// Growth policy for the result table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPolicy {
    pub initial: usize,
    pub threshold: usize,
    pub increment: usize,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self {
            initial: INITIAL_CAPACITY,
            threshold: DOUBLING_THRESHOLD,
            increment: GROWTH_INCREMENT,
        }
    }
}

impl GrowthPolicy {
    /// Capacity to grow to from `current`
    #[must_use]
    pub fn next_capacity(&self, current: usize) -> usize {
        if current == 0 {
            self.initial.max(1)
        } else if current < self.threshold {
            current.saturating_mul(2).min(self.threshold.max(current + 1))
        } else {
            current.saturating_add(self.increment.max(1))
        }
    }
}

/// Append-only sequence of [`ObjectRecord`]s
#[derive(Debug, Default)]
pub struct Collector {
    records: Vec<ObjectRecord>,
    policy: GrowthPolicy,
}

impl Collector {
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(GrowthPolicy::default())
    }

    #[must_use]
    pub const fn with_policy(policy: GrowthPolicy) -> Self {
        Self {
            records: Vec::new(),
            policy,
        }
    }

    /// Append a record, growing the table when full.
    ///
    /// # Errors
    /// Returns `CollectError::OutOfMemory` if the table cannot grow.
    pub fn append(&mut self, record: ObjectRecord) -> Result<(), CollectError> {
        if self.records.len() == self.records.capacity() {
            let target = self.policy.next_capacity(self.records.capacity());
            let additional = target - self.records.len();
            self.records
                .try_reserve_exact(additional)
                .map_err(|e| CollectError::OutOfMemory {
                    requested: target,
                    reason: e.to_string(),
                })?;
        }
        self.records.push(record);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    #[must_use]
    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }

    /// Hand the records over for sorting and printing
    #[must_use]
    pub fn into_records(self) -> Vec<ObjectRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, secs: i64) -> ObjectRecord {
        ObjectRecord::new(PathBuf::from(name), TimeValue::from_secs(secs), 1)
    }

    #[test]
    fn test_growth_doubles_then_steps() {
        let policy = GrowthPolicy { initial: 4, threshold: 16, increment: 5 };
        assert_eq!(policy.next_capacity(0), 4);
        assert_eq!(policy.next_capacity(4), 8);
        assert_eq!(policy.next_capacity(8), 16);
        assert_eq!(policy.next_capacity(12), 16);
        assert_eq!(policy.next_capacity(16), 21);
        assert_eq!(policy.next_capacity(21), 26);
    }

    #[test]
    fn test_append_preserves_earlier_records_across_growth() {
        let mut collector = Collector::with_policy(GrowthPolicy { initial: 2, threshold: 4, increment: 3 });
        for i in 0..10 {
            collector.append(record(&format!("f{i}"), i)).unwrap();
        }
        assert_eq!(collector.len(), 10);
        assert!(collector.capacity() >= 10);
        for (i, r) in collector.records().iter().enumerate() {
            assert_eq!(r.path, PathBuf::from(format!("f{i}")));
        }
    }

    #[test]
    fn test_initial_reservation() {
        let mut collector = Collector::new();
        assert!(collector.is_empty());
        collector.append(record("a", 0)).unwrap();
        assert!(collector.capacity() >= INITIAL_CAPACITY);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut collector = Collector::new();
        collector.append(record("same", 1)).unwrap();
        collector.append(record("same", 1)).unwrap();
        assert_eq!(collector.into_records().len(), 2);
    }
}
