//! Slab-by-slab pipeline execution, bounding working-set memory, with resumability.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::config::SlabAxis;
use crate::error::CoreResult;
use crate::geometry::{slabs_from_box, Box3};

/// The last fully-completed `(scale, slab_index)` unit, compared lexicographically with
/// `scale` major and `slab_index` minor — scales are iterated outermost, slabs innermost,
/// both ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint {
    pub scale: u8,
    pub slab_index: usize,
}

/// Runs a pipeline over every `(scale, slab)` unit of a bounding box, skipping units
/// strictly before a resume checkpoint and supporting cooperative cancellation at slab
/// barriers. The checkpointed unit itself is reprocessed on resume, since a checkpoint only
/// records that a unit was *started*, not that its write was acknowledged by the sink.
pub struct SlabRunner {
    bounding_box: Box3,
    slab_depth: u32,
    axis: SlabAxis,
    scales: Vec<u8>,
    checkpoint: Option<Checkpoint>,
    cancel: Arc<AtomicBool>,
}

impl SlabRunner {
    pub fn new(bounding_box: Box3, slab_depth: u32, axis: SlabAxis, scales: Vec<u8>) -> Self {
        let mut scales = scales;
        scales.sort_unstable();
        Self {
            bounding_box,
            slab_depth,
            axis,
            scales,
            checkpoint: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn resume_from(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    /// A handle that, when set, cancels the run at the next slab barrier.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Every `(scale, slab_index, slab_box)` unit in execution order, already filtered down
    /// to units at or after the resume checkpoint (the checkpointed unit is reprocessed,
    /// not skipped).
    pub fn units(&self) -> Vec<(u8, usize, Box3)> {
        let slabs = slabs_from_box(&self.bounding_box, self.slab_depth, self.axis);
        let mut out = Vec::new();
        for &scale in &self.scales {
            for (slab_index, slab_box) in slabs.iter().enumerate() {
                let unit = Checkpoint { scale, slab_index };
                if let Some(cp) = self.checkpoint {
                    if unit < cp {
                        continue;
                    }
                }
                out.push((scale, slab_index, *slab_box));
            }
        }
        out
    }

    /// Executes `process` for every unit in order, stopping (without error) as soon as
    /// cancellation is requested. Returns the last unit actually completed, if any.
    pub fn run(
        &self,
        mut process: impl FnMut(u8, usize, &Box3) -> CoreResult<()>,
    ) -> CoreResult<Option<Checkpoint>> {
        let mut last = self.checkpoint;
        for (scale, slab_index, slab_box) in self.units() {
            if self.cancel.load(Ordering::Relaxed) {
                info!(scale, slab_index, "slab run cancelled");
                break;
            }
            process(scale, slab_index, &slab_box)?;
            last = Some(Checkpoint { scale, slab_index });
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::I64Vec3;

    fn bbox() -> Box3 {
        Box3::new(I64Vec3::ZERO, I64Vec3::new(64, 64, 256))
    }

    #[test]
    fn units_ordered_scale_outer_slab_inner() {
        let runner = SlabRunner::new(bbox(), 64, SlabAxis::Z, vec![1, 0]);
        let units = runner.units();
        // 4 slabs per scale, 2 scales, scale ascending.
        assert_eq!(units.len(), 8);
        assert_eq!(units[0].0, 0);
        assert_eq!(units[3].0, 0);
        assert_eq!(units[4].0, 1);
    }

    #[test]
    fn resume_reprocesses_checkpoint_slab_but_skips_earlier_ones() {
        let runner = SlabRunner::new(bbox(), 64, SlabAxis::Z, vec![0, 1])
            .resume_from(Checkpoint { scale: 0, slab_index: 3 });
        let units = runner.units();
        // Scale 0: slabs 0..2 skipped, slab 3 (the checkpoint itself) reprocessed.
        let scale0: Vec<_> = units.iter().filter(|(scale, _, _)| *scale == 0).collect();
        assert_eq!(scale0.len(), 1);
        assert_eq!(scale0[0].1, 3);
        // Scale 1 runs in full.
        assert_eq!(units.iter().filter(|(scale, _, _)| *scale == 1).count(), 4);
        assert_eq!(units.len(), 5);
    }

    #[test]
    fn run_invokes_process_for_every_unit_and_tracks_checkpoint() {
        let runner = SlabRunner::new(bbox(), 64, SlabAxis::Z, vec![0]);
        let mut seen = Vec::new();
        let last = runner
            .run(|scale, slab_index, _box| {
                seen.push((scale, slab_index));
                Ok(())
            })
            .unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(last, Some(Checkpoint { scale: 0, slab_index: 3 }));
    }

    #[test]
    fn cancellation_stops_before_remaining_units() {
        let runner = SlabRunner::new(bbox(), 64, SlabAxis::Z, vec![0]);
        let cancel = runner.cancel_handle();
        let mut seen = 0;
        runner
            .run(|_scale, slab_index, _box| {
                seen += 1;
                if slab_index == 1 {
                    cancel.store(true, Ordering::Relaxed);
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, 2);
    }
}
