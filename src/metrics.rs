//! Job-level metrics collection for partition/transform pipelines.
//!
//! Feature-gated and runtime-toggled to ensure zero overhead when disabled.
//!
//! # Usage
//!
//! ```ignore
//! use bricktile::metrics::{JobMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! metrics.record_brick_emitted(brick.physical_box.volume() as u64);
//! metrics.record_fetch_timing(elapsed_us);
//! ```

use std::collections::VecDeque;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

/// Runtime toggle for metrics collection.
/// Set to false to disable metrics gathering at runtime.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
    #[cfg(feature = "metrics")]
    {
        COLLECT_METRICS.load(Ordering::Relaxed)
    }
    #[cfg(not(feature = "metrics"))]
    {
        false
    }
}

/// Rolling window for storing recent values (e.g., timing history).
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    /// Create a new rolling window with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new value, evicting the oldest if at capacity.
    pub fn push(&mut self, value: T) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    /// Get the number of values in the window.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the window is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear all values.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Iterate over values (oldest to newest).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    /// Get the most recent value.
    pub fn last(&self) -> Option<&T> {
        self.buffer.back()
    }
}

impl<T: Copy + Default + std::ops::Add<Output = T>> RollingWindow<T> {
    /// Compute the sum of all values.
    pub fn sum(&self) -> T {
        self.buffer.iter().copied().fold(T::default(), |acc, x| acc + x)
    }
}

impl RollingWindow<u64> {
    /// Compute the average of all values.
    pub fn average(&self) -> f64 {
        if self.buffer.is_empty() {
            0.0
        } else {
            self.sum() as f64 / self.buffer.len() as f64
        }
    }

    /// Get min and max values.
    pub fn min_max(&self) -> Option<(u64, u64)> {
        if self.buffer.is_empty() {
            None
        } else {
            let min = *self.buffer.iter().min().unwrap();
            let max = *self.buffer.iter().max().unwrap();
            Some((min, max))
        }
    }
}

impl Default for RollingWindow<u64> {
    fn default() -> Self {
        Self::new(128)
    }
}

/// Job-level statistics updated as partitions execute.
#[derive(Debug, Clone)]
pub struct JobMetrics {
    /// Bricks successfully produced by a pipeline stage.
    pub bricks_emitted: u64,
    /// Bricks dropped as `Skippable` (empty or fully-masked).
    pub bricks_skipped: u64,
    /// Voxels read from a `VoxelService` across the whole job.
    pub voxels_fetched: u64,
    /// Voxels written to a sink across the whole job.
    pub voxels_written: u64,
    /// Count of `Transient` failures that were retried (not necessarily exhausted).
    pub transient_retries: u64,
    /// Count of worker tasks that exhausted their retry budget.
    pub transient_failures: u64,
    /// Candidate stitch merges emitted before union-find collapse.
    pub stitch_candidate_merges: u64,

    /// Rolling window of per-brick fetch timings, in microseconds.
    pub fetch_timings: RollingWindow<u64>,
    /// Rolling window of per-brick pad timings, in microseconds.
    pub pad_timings: RollingWindow<u64>,
    /// Rolling window of per-brick remap timings, in microseconds.
    pub remap_timings: RollingWindow<u64>,
    /// Rolling window of per-brick downsample timings, in microseconds.
    pub downsample_timings: RollingWindow<u64>,
    /// Rolling window of per-brick write timings, in microseconds.
    pub write_timings: RollingWindow<u64>,
}

impl Default for JobMetrics {
    fn default() -> Self {
        Self {
            bricks_emitted: 0,
            bricks_skipped: 0,
            voxels_fetched: 0,
            voxels_written: 0,
            transient_retries: 0,
            transient_failures: 0,
            stitch_candidate_merges: 0,
            fetch_timings: RollingWindow::new(128),
            pad_timings: RollingWindow::new(128),
            remap_timings: RollingWindow::new(128),
            downsample_timings: RollingWindow::new(128),
            write_timings: RollingWindow::new(128),
        }
    }
}

impl JobMetrics {
    /// Create new metrics with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the per-slab counters. `transient_failures` is left alone — it is a
    /// job-lifetime total, not a per-slab gauge.
    pub fn reset_slab_counters(&mut self) {
        self.bricks_emitted = 0;
        self.bricks_skipped = 0;
        self.voxels_fetched = 0;
        self.voxels_written = 0;
        self.fetch_timings.clear();
        self.pad_timings.clear();
        self.remap_timings.clear();
        self.downsample_timings.clear();
        self.write_timings.clear();
    }

    pub fn record_brick_emitted(&mut self, voxel_count: u64) {
        if !is_enabled() {
            return;
        }
        self.bricks_emitted += 1;
        self.voxels_fetched += voxel_count;
    }

    pub fn record_brick_skipped(&mut self) {
        if is_enabled() {
            self.bricks_skipped += 1;
        }
    }

    pub fn record_voxels_written(&mut self, voxel_count: u64) {
        if is_enabled() {
            self.voxels_written += voxel_count;
        }
    }

    pub fn record_retry(&mut self) {
        if is_enabled() {
            self.transient_retries += 1;
        }
    }

    pub fn record_transient_failure(&mut self) {
        if is_enabled() {
            self.transient_failures += 1;
        }
    }

    pub fn record_stitch_candidates(&mut self, count: u64) {
        if is_enabled() {
            self.stitch_candidate_merges += count;
        }
    }

    pub fn record_fetch_timing(&mut self, timing_us: u64) {
        if is_enabled() {
            self.fetch_timings.push(timing_us);
        }
    }

    pub fn record_pad_timing(&mut self, timing_us: u64) {
        if is_enabled() {
            self.pad_timings.push(timing_us);
        }
    }

    pub fn record_remap_timing(&mut self, timing_us: u64) {
        if is_enabled() {
            self.remap_timings.push(timing_us);
        }
    }

    pub fn record_downsample_timing(&mut self, timing_us: u64) {
        if is_enabled() {
            self.downsample_timings.push(timing_us);
        }
    }

    pub fn record_write_timing(&mut self, timing_us: u64) {
        if is_enabled() {
            self.write_timings.push(timing_us);
        }
    }
}
