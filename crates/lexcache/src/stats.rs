//! Outcome counters for the expiring cache

use std::sync::atomic::{AtomicU64, Ordering};

/// How a single cache read ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Fresh entry returned
    Hit,
    /// Nothing stored under the key
    Absent,
    /// Entry older than the expiration window, deleted on read
    Expired,
    /// Stored value could not be decoded
    Malformed,
    /// The medium failed the read
    StorageError,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Fresh reads
    pub hits: u64,
    /// Reads of keys never written or already removed
    pub absent: u64,
    /// Stale entries dropped on read
    pub expired: u64,
    /// Undecodable entries
    pub malformed: u64,
    /// Reads the medium failed
    pub read_errors: u64,
    /// Entries written
    pub writes: u64,
    /// Writes the medium (or the encoder) rejected
    pub write_errors: u64,
}

impl CacheStatsSnapshot {
    /// Every read that did not return a payload
    pub fn misses(&self) -> u64 {
        self.absent + self.expired + self.malformed + self.read_errors
    }
}

/// Counters kept by an [`crate::ExpiringCache`]
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    absent: AtomicU64,
    expired: AtomicU64,
    malformed: AtomicU64,
    read_errors: AtomicU64,
    writes: AtomicU64,
    write_errors: AtomicU64,
}

impl CacheStats {
    pub(crate) fn record_read(&self, outcome: ReadOutcome) {
        let counter = match outcome {
            ReadOutcome::Hit => &self.hits,
            ReadOutcome::Absent => &self.absent,
            ReadOutcome::Expired => &self.expired,
            ReadOutcome::Malformed => &self.malformed,
            ReadOutcome::StorageError => &self.read_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self, stored: bool) {
        let counter = if stored { &self.writes } else { &self.write_errors };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            absent: self.absent.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_misses_sum_every_failed_read() {
        let stats = CacheStats::default();

        stats.record_read(ReadOutcome::Hit);
        stats.record_read(ReadOutcome::Absent);
        stats.record_read(ReadOutcome::Expired);
        stats.record_read(ReadOutcome::Malformed);
        stats.record_read(ReadOutcome::StorageError);
        stats.record_write(false);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses(), 4);
        assert_eq!(snapshot.writes, 0);
        assert_eq!(snapshot.write_errors, 1);
    }
}
