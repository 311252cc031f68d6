//! Assembling grouped fragments into new bricks, and the full re-grid shuffle.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::brick::{Brick, VoxelBuffer};
use crate::error::{CoreError, CoreResult};
use crate::geometry::{Box3, Grid};
use crate::partition::split::split_brick;
use crate::voxel_service::VoxelSample;
use crate::wall::BrickWall;

/// Merges all fragments sharing one logical box into a single brick. Every fragment must
/// agree on `logical_box`; fragment physical boxes must be pairwise disjoint — if they
/// overlap the result is unspecified (last writer wins), matching the split stage's
/// disjointness guarantee rather than re-checking it here.
pub fn assemble_brick_fragments<S: VoxelSample>(
    logical_box: Box3,
    fragments: &[Brick<S>],
) -> CoreResult<Brick<S>> {
    if fragments.is_empty() {
        return Err(CoreError::AssemblyMismatch(
            "no fragments to assemble".to_string(),
        ));
    }
    for f in fragments {
        if f.logical_box != logical_box {
            return Err(CoreError::AssemblyMismatch(format!(
                "fragment logical_box {:?} does not match group key {:?}",
                f.logical_box, logical_box
            )));
        }
    }

    let mut final_start = fragments[0].physical_box.start;
    let mut final_stop = fragments[0].physical_box.stop;
    for f in &fragments[1..] {
        final_start = final_start.min(f.physical_box.start);
        final_stop = final_stop.max(f.physical_box.stop);
    }
    let final_physical_box = Box3::new(final_start, final_stop);

    if !logical_box.contains_box(&final_physical_box) {
        return Err(CoreError::AssemblyMismatch(format!(
            "assembled physical_box {final_physical_box:?} exceeds logical_box {logical_box:?}"
        )));
    }

    let mut buffer = VoxelBuffer::zeros(final_physical_box.shape());
    for f in fragments {
        let rel = f.physical_box.relative_to(&final_physical_box);
        buffer.blit(&rel, &f.volume);
    }
    Brick::new(logical_box, final_physical_box, buffer)
}

/// Realigns a `BrickWall` onto `new_grid` via split / shuffle-by-key / assemble. The shuffle
/// is realized as an in-process `HashMap` grouping, playing the role of a distributed
/// hash-partitioned shuffle over a single node.
pub fn realign_to_new_grid<S: VoxelSample>(wall: &BrickWall<S>, new_grid: Grid) -> BrickWall<S> {
    let prev = wall.clone();
    let new_bounding_box = wall.bounding_box;
    BrickWall::from_generator(new_bounding_box, new_grid, move || {
        let _span = tracing::info_span!("realign_to_new_grid", block_shape = ?new_grid.block_shape).entered();
        let source_bricks = prev.bricks()?;

        let fragments: Vec<(Box3, Brick<S>)> = source_bricks
            .par_iter()
            .map(|b| split_brick(b, &new_grid))
            .collect::<CoreResult<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();
        tracing::debug!(
            source_bricks = source_bricks.len(),
            fragments = fragments.len(),
            "split stage complete"
        );

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
