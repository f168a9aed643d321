//! Indexing progress tracking

use std::time::Duration;
use tracing::{debug, info};

use crate::types::IndexStatus;

/// Keeps an [`IndexStatus`] consistent while a rebuild runs.
///
/// Progress never goes backwards during a rebuild and `indexed_files` is
/// derived from it, so it can never exceed `total_files`.
#[derive(Debug, Clone, Default)]
pub struct IndexProgressTracker {
    status: IndexStatus,
}

impl IndexProgressTracker {
    /// Resume from a stored snapshot
    pub fn new(status: IndexStatus) -> Self {
        Self {
            status: status.normalized(),
        }
    }

    /// Get the current snapshot
    pub fn status(&self) -> &IndexStatus {
        &self.status
    }

    /// Check if a rebuild is running
    pub fn is_indexing(&self) -> bool {
        self.status.is_indexing
    }

    /// Begin a rebuild over `total_files` files
    pub fn start(&mut self, total_files: u64, now: i64) -> &IndexStatus {
        self.status = IndexStatus {
            is_indexing: true,
            progress: 0,
            total_files,
            indexed_files: 0,
            index_size: self.status.index_size,
            last_updated: now,
        };
        info!("Index rebuild started over {} files", total_files);
        &self.status
    }

    /// Record a progress percentage.
    ///
    /// Returns `false` when the report was ignored because no rebuild is
    /// running or it would move progress backwards.
    pub fn report(&mut self, progress: u8) -> bool {
        if !self.status.is_indexing {
            debug!("Ignoring progress report {} outside a rebuild", progress);
            return false;
        }

        let progress = progress.min(100);
        if progress < self.status.progress {
            debug!(
                "Ignoring progress report {} below current {}",
                progress, self.status.progress
            );
            return false;
        }

        self.status.progress = progress;
        self.status.indexed_files = self.status.total_files * u64::from(progress) / 100;
        true
    }

    /// Complete the rebuild
    pub fn finish(&mut self, index_size: u64, now: i64) -> &IndexStatus {
        self.status.is_indexing = false;
        self.status.progress = 100;
        self.status.indexed_files = self.status.total_files;
        self.status.index_size = index_size;
        self.status.last_updated = now;
        info!(
            "Index rebuild finished: {} files, {} bytes",
            self.status.total_files, self.status.index_size
        );
        &self.status
    }
}

/// Parameters of a simulated rebuild
#[derive(Debug, Clone)]
pub struct RebuildPlan {
    /// Files reported as found
    pub total_files: u64,
    /// Percentage added per tick
    pub step: u8,
    /// Delay between ticks
    pub tick: Duration,
    /// Index size reported at the end (bytes)
    pub index_size: u64,
}

impl Default for RebuildPlan {
    fn default() -> Self {
        Self {
            total_files: 1250,
            step: 5,
            tick: Duration::from_millis(200),
            index_size: 156 * 1024 * 1024,
        }
    }
}

/// Drive a tracker through a full rebuild, calling `on_progress` with every
/// snapshot (including the first and the last). Returns the final status.
pub async fn simulate_rebuild<F>(plan: &RebuildPlan, mut on_progress: F) -> IndexStatus
where
    F: FnMut(&IndexStatus),
{
    let step = plan.step.max(1);
    let mut tracker = IndexProgressTracker::default();
    on_progress(tracker.start(plan.total_files, crate::now_millis()));

    let mut ticker = tokio::time::interval(plan.tick);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let next = tracker.status().progress.saturating_add(step).min(100);
        if next >= 100 {
            let status = tracker.finish(plan.index_size, crate::now_millis()).clone();
            on_progress(&status);
            return status;
        }
        tracker.report(next);
        on_progress(tracker.status());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_never_decreases() {
        let mut tracker = IndexProgressTracker::default();
        tracker.start(200, 1);

        assert!(tracker.report(40));
        assert!(!tracker.report(30));
        assert_eq!(tracker.status().progress, 40);
        assert_eq!(tracker.status().indexed_files, 80);
    }

    #[test]
    fn test_report_outside_rebuild_is_ignored() {
        let mut tracker = IndexProgressTracker::default();
        assert!(!tracker.report(50));
        assert_eq!(tracker.status().progress, 0);
    }

    #[test]
    fn test_finish_completes_counts() {
        let mut tracker = IndexProgressTracker::default();
        tracker.start(7, 1);
        tracker.report(33);
        let status = tracker.finish(1024, 2);

        assert!(!status.is_indexing);
        assert_eq!(status.progress, 100);
        assert_eq!(status.indexed_files, 7);
        assert_eq!(status.index_size, 1024);
        assert_eq!(status.last_updated, 2);
    }

    #[test]
    fn test_resume_normalizes_stored_snapshot() {
        let tracker = IndexProgressTracker::new(IndexStatus {
            total_files: 5,
            indexed_files: 9,
            progress: 250,
            ..Default::default()
        });
        assert_eq!(tracker.status().indexed_files, 5);
        assert_eq!(tracker.status().progress, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_rebuild_sequence() {
        let mut seen = Vec::new();
        let plan = RebuildPlan::default();

        let last = simulate_rebuild(&plan, |status| seen.push(status.clone())).await;

        assert_eq!(seen.first().unwrap().progress, 0);
        assert!(seen.first().unwrap().is_indexing);
        assert!(seen.windows(2).all(|w| w[0].progress <= w[1].progress));
        assert!(seen.iter().all(|s| s.indexed_files <= s.total_files));

        assert_eq!(last.progress, 100);
        assert_eq!(last.indexed_files, last.total_files);
        assert!(!last.is_indexing);
        assert_eq!(seen.last(), Some(&last));
        // 0, 5, ..., 95, then the final 100
        assert_eq!(seen.len(), 21);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uneven_step_still_ends_at_100() {
        let plan = RebuildPlan {
            total_files: 33,
            step: 30,
            ..Default::default()
        };
        let mut progress = Vec::new();
        let last = simulate_rebuild(&plan, |s| progress.push(s.progress)).await;

        assert_eq!(progress, vec![0, 30, 60, 90, 100]);
        assert_eq!(last.indexed_files, 33);
    }
}
