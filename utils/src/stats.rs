//! Lock-free-append, periodically-reduced running averages.
//!
//! Modelled on the reader/writer split described for cross-worker statistics aggregation:
//! readers increment a partial sum under a shared ("reader") lock, permitting concurrent
//! increments; when the partial sum approaches overflow a single reducer takes the exclusive
//! ("writer") lock and folds the partial sum into the running average.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Above this partial sum, the next `record` triggers a reduction before returning.
const OVERFLOW_THRESHOLD: u64 = u64::MAX / 2;

/// A running average of `u64`-valued samples, safe to update from many worker threads.
#[derive(Debug)]
pub struct RunningAverage {
    partial_sum: AtomicU64,
    partial_count: AtomicU64,
    average: RwLock<f64>,
}

impl Default for RunningAverage {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningAverage {
    pub fn new() -> Self {
        Self {
            partial_sum: AtomicU64::new(0),
            partial_count: AtomicU64::new(0),
            average: RwLock::new(0.0),
        }
    }

    /// Record one sample. Many threads may call this concurrently without blocking each other;
    /// only the (rare) reduction step takes an exclusive lock.
    pub fn record(&self, value: u64) {
        let guard = self.average.read().expect("stats lock poisoned");
        let prev_sum = self.partial_sum.fetch_add(value, Ordering::Relaxed);
        self.partial_count.fetch_add(1, Ordering::Relaxed);
        let should_reduce = prev_sum > OVERFLOW_THRESHOLD;
        drop(guard);
        if should_reduce {
            self.reduce();
        }
    }

    /// Fold the current partial sum into the running average. Called automatically from
    /// `record` when the partial sum nears overflow; callers may also call this directly to
    /// force an up-to-date snapshot before reading [`Self::get`].
    pub fn reduce(&self) {
        let count = self.partial_count.swap(0, Ordering::Relaxed);
        if count == 0 {
            return;
        }
        let sum = self.partial_sum.swap(0, Ordering::Relaxed);
        let mut avg = self.average.write().expect("stats lock poisoned");
        let new_avg = sum as f64 / count as f64;
        *avg = if *avg == 0.0 {
            new_avg
        } else {
            (*avg + new_avg) / 2.0
        };
    }

    /// The running average as of the last reduction. Does not itself force a reduction, so a
    /// burst of very recent `record` calls may not yet be reflected.
    pub fn get(&self) -> f64 {
        *self.average.read().expect("stats lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn averages_simple_samples() {
        let stats = RunningAverage::new();
        stats.record(10);
        stats.record(20);
        stats.reduce();
        assert_eq!(stats.get(), 15.0);
    }

    #[test]
    fn concurrent_recorders_dont_lose_samples() {
        let stats = Arc::new(RunningAverage::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let stats = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    stats.record(2);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        stats.reduce();
        assert_eq!(stats.get(), 2.0);
    }
}
