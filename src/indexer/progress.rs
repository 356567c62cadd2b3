use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Per-run counters updated by aggregation workers. Clones share the counters.
#[derive(Clone, Default)]
pub struct AggregationProgress {
    counters: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    files_processed: AtomicUsize,
    classes_found: AtomicUsize,
    failures: AtomicUsize,
    started_at: Mutex<Option<Instant>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub files_processed: usize,
    pub classes_found: usize,
    pub failures: usize,
    pub elapsed_ms: u64,
}

impl AggregationProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes the counters and restarts the clock.
    pub fn start(&self) {
        self.counters.files_processed.store(0, Ordering::Release);
        self.counters.classes_found.store(0, Ordering::Release);
        self.counters.failures.store(0, Ordering::Release);
        if let Ok(mut started_at) = self.counters.started_at.lock() {
            *started_at = Some(Instant::now());
        }
    }

    pub fn file_done(&self, classes: usize) {
        self.counters.files_processed.fetch_add(1, Ordering::Relaxed);
        self.counters.classes_found.fetch_add(classes, Ordering::Relaxed);
    }

    /// A failed file still counts as processed.
    pub fn file_failed(&self) {
        self.counters.files_processed.fetch_add(1, Ordering::Relaxed);
        self.counters.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let elapsed_ms = self
            .counters
            .started_at
            .lock()
            .ok()
            .and_then(|started_at| *started_at)
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        ProgressSnapshot {
            files_processed: self.counters.files_processed.load(Ordering::Acquire),
            classes_found: self.counters.classes_found.load(Ordering::Acquire),
            failures: self.counters.failures.load(Ordering::Acquire),
            elapsed_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_counts_across_threads() {
        let progress = AggregationProgress::new();
        progress.start();

        (0..100).into_par_iter().for_each(|i| {
            if i % 10 == 0 {
                progress.file_failed();
            } else {
                progress.file_done(2);
            }
        });

        let snapshot = progress.snapshot();
        assert_eq!(snapshot.files_processed, 100);
        assert_eq!(snapshot.failures, 10);
        assert_eq!(snapshot.classes_found, 180);
    }

    #[test]
    fn test_start_resets_counters() {
        let progress = AggregationProgress::new();
        progress.start();
        progress.file_done(5);
        progress.file_failed();
        progress.start();

        let snapshot = progress.snapshot();
        assert_eq!(snapshot.files_processed, 0);
        assert_eq!(snapshot.classes_found, 0);
        assert_eq!(snapshot.failures, 0);
    }

    #[test]
    fn test_clock_starts_with_the_run() {
        assert_eq!(AggregationProgress::new().snapshot().elapsed_ms, 0);
    }
}
