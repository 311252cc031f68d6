//! `BrickWall`: a distributed-in-spirit collection of bricks over a common grid, with a
//! lazy/persisted materialization lifecycle (the in-process analogue of an RDD).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rayon::prelude::*;
use tracing::info_span;

use std::collections::HashMap;

use crate::brick::{Brick, VoxelBuffer};
use crate::downsample::{downsample_block, DownsampleMethod};
use crate::error::CoreResult;
use crate::geometry::{Box3, Grid};
use crate::halo::pad_brick;
use crate::partition::assemble_brick_fragments;
use crate::retry::{RealSleeper, RetryPolicy};
use crate::voxel_service::{VoxelSample, VoxelService, VoxelSink};

struct WallInner<S: VoxelSample> {
    generator: Box<dyn Fn() -> CoreResult<Vec<Brick<S>>> + Send + Sync>,
    persisted: AtomicBool,
    cache: Mutex<Option<Arc<Vec<Brick<S>>>>>,
}

/// A collection of bricks covering `bounding_box` on `grid`. Cheap to clone: clones share
/// the same underlying generator and persisted cache.
#[derive(Clone)]
pub struct BrickWall<S: VoxelSample> {
    pub bounding_box: Box3,
    pub grid: Grid,
    inner: Arc<WallInner<S>>,
}

impl<S: VoxelSample> BrickWall<S> {
    pub(crate) fn from_generator(
        bounding_box: Box3,
        grid: Grid,
        generator: impl Fn() -> CoreResult<Vec<Brick<S>>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            bounding_box,
            grid,
            inner: Arc::new(WallInner {
                generator: Box::new(generator),
                persisted: AtomicBool::new(false),
                cache: Mutex::new(None),
            }),
        }
    }

    /// Splits `box_` by a grid derived from the service's preferred message shape and
    /// fetches each block lazily via `svc.get_subvolume`.
    pub fn from_volume_service(
        svc: Arc<dyn VoxelService<S>>,
        scale: u8,
        box_: Box3,
    ) -> Self {
        let grid = Grid::with_zero_offset(svc.preferred_message_shape());
        let bounding_box = box_;
        let sleeper = RealSleeper;
        let policy = RetryPolicy::default();
        Self::from_generator(bounding_box, grid, move || {
            grid.clipped_boxes_from_grid(&box_)
                .into_par_iter()
                .map(|logical| {
                    let physical = logical.intersect(&box_);
                    let volume = policy.run_core(&sleeper, || svc.get_subvolume(&physical, scale))?;
                    Brick::new(logical, physical, volume)
                })
                .collect()
        })
    }

    /// Forces computation and writes every brick to `sink` at its physical origin, retrying
    /// `write_subvolume` on `CoreError::Transient` the same way `from_volume_service` retries
    /// reads. Returns once every brick has been written (or the first non-transient /
    /// retry-exhausted error is hit).
    pub fn write_to_sink(&self, sink: &dyn VoxelSink<S>, scale: u8) -> CoreResult<()>
    where
        S: Sync,
    {
        let policy = RetryPolicy::default();
        let sleeper = RealSleeper;
        self.bricks()?.par_iter().try_for_each(|brick| {
            policy.run_core(&sleeper, || {
                sink.write_subvolume(&brick.volume, brick.physical_box.start, scale)
            })
        })
    }

    /// Forces computation, returning the (possibly cached) brick list.
    pub fn bricks(&self) -> CoreResult<Arc<Vec<Brick<S>>>> {
        if let Some(cached) = self.inner.cache.lock().unwrap().as_ref() {
            return Ok(cached.clone());
        }
        let computed = Arc::new((self.inner.generator)()?);
        if self.inner.persisted.load(Ordering::Relaxed) {
            *self.inner.cache.lock().unwrap() = Some(computed.clone());
        }
        Ok(computed)
    }

    /// Forces computation and caches the result so later calls to `bricks()` are free.
    /// Idempotent: a second call on an already-persisted wall is a no-op.
    pub fn persist_and_execute(&self, name: &str) -> CoreResult<()> {
        let _span = info_span!("persist_and_execute", name).entered();
        if self.inner.persisted.swap(true, Ordering::Relaxed) {
            return Ok(());
        }
        let computed = (self.inner.generator)()?;
        *self.inner.cache.lock().unwrap() = Some(Arc::new(computed));
        Ok(())
    }

    /// Releases any cached bricks; the wall reverts to lazy (recomputed on next access).
    pub fn unpersist(&self) {
        self.inner.persisted.store(false, Ordering::Relaxed);
        *self.inner.cache.lock().unwrap() = None;
    }

    /// Applies `f` to every brick, preserving the grid. Returns a new lazy wall.
    pub fn map(
        &self,
        f: impl Fn(Brick<S>) -> CoreResult<Brick<S>> + Send + Sync + 'static,
    ) -> BrickWall<S> {
        let prev = self.clone();
        BrickWall::from_generator(self.bounding_box, self.grid, move || {
            prev.bricks()?
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(&f)
                .collect()
        })
    }

    /// Applies `f` to every brick, where `f` may emit zero or more `(new_logical_box,
    /// fragment)` pairs keyed against `new_grid`. Fragments sharing a key are grouped and
    /// assembled exactly as in the re-grid shuffle (§4.P): this is the general shuffle
    /// primitive `realign_to_new_grid` is built from.
    pub fn flat_map(
        &self,
        new_grid: Grid,
        f: impl Fn(&Brick<S>) -> CoreResult<Vec<(Box3, Brick<S>)>> + Send + Sync + 'static,
    ) -> BrickWall<S> {
        let prev = self.clone();
        let bounding_box = self.bounding_box;
        BrickWall::from_generator(bounding_box, new_grid, move || {
            let fragments: Vec<(Box3, Brick<S>)> = prev
                .bricks()?
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(|b| f(&b))
                .collect::<CoreResult<Vec<_>>>()?
                .into_iter()
                .flatten()
                .collect();

            let mut groups: HashMap<Box3, Vec<Brick<S>>> = HashMap::new();
            for (key, fragment) in fragments {
                groups.entry(key).or_default().push(fragment);
            }

            groups
                .into_par_iter()
                .map(|(logical_box, frags)| assemble_brick_fragments(logical_box, &frags))
                .collect()
        })
    }

    /// Redistributes this wall's bricks onto `new_grid` via split / shuffle-by-key /
    /// assemble (§4.P).
    pub fn realign_to_new_grid(&self, new_grid: Grid) -> BrickWall<S> {
        crate::partition::realign_to_new_grid(self, new_grid)
    }

    /// Aligns every brick's physical box outward to `padding_grid`, fetching any missing
    /// halo voxels through `accessor` (§4.H). Bricks already aligned pass through unchanged.
    pub fn fill_missing(
        &self,
        padding_grid: Grid,
        accessor: impl Fn(&Box3) -> CoreResult<VoxelBuffer<S>> + Send + Sync + 'static,
    ) -> BrickWall<S> {
        let accessor = std::sync::Arc::new(accessor);
        self.map(move |b| pad_brick(&b, &padding_grid, |box_| accessor(box_)))
    }

    /// Box/mode/label downsample by `factor`, halving (or dividing by `factor`) the grid's
    /// block shape and bounding box along the way.
    pub fn downsample(&self, factor: glam::UVec3, method: DownsampleMethod) -> BrickWall<S>
    where
        S: crate::downsample::DownsampleSample,
    {
        let new_bounding_box = Box3::new(
            self.bounding_box.start / factor.as_i64vec3(),
            self.bounding_box.stop / factor.as_i64vec3(),
        );
        let new_grid = Grid::new(self.grid.block_shape / factor, self.grid.offset / factor.as_i64vec3());
        let prev = self.clone();
        BrickWall::from_generator(new_bounding_box, new_grid, move || {
            prev.bricks()?
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(|b| downsample_block(&b, factor, method))
                .collect()
        })
    }
}
