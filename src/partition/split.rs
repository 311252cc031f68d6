//! Splitting a brick against a new grid (the first stage of a re-grid shuffle).

use crate::brick::Brick;
use crate::error::CoreResult;
use crate::geometry::{Box3, Grid};
use crate::voxel_service::VoxelSample;

/// Fragments `brick` against `new_grid`: for every new-grid logical box that overlaps
/// `brick.physical_box`, emits a `(new_logical_box, fragment)` pair whose fragment's
/// physical box is the intersection of the two, with its own copy of the overlapping data.
///
/// Fragments emitted for a single brick are pairwise disjoint by construction, since they
/// partition `brick.physical_box` along `new_grid`'s block boundaries.
pub fn split_brick<S: VoxelSample>(
    brick: &Brick<S>,
    new_grid: &Grid,
) -> CoreResult<Vec<(Box3, Brick<S>)>> {
    if brick.physical_box.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for new_logical in new_grid.boxes_from_grid(&brick.physical_box) {
        let split_box = new_logical.intersect(&brick.physical_box);
        if split_box.is_empty() {
            continue;
        }
        let rel = split_box.relative_to(&brick.physical_box);
        let fragment_volume = brick.volume.extract(&rel);
        let fragment = Brick::new(new_logical, split_box, fragment_volume)?;
        out.push((new_logical, fragment));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brick::VoxelBuffer;
    use glam::{I64Vec3, UVec3};

    #[test]
    fn single_fragment_when_fully_inside_one_new_block() {
        let logical = Box3::from_arrays([0, 0, 0], [32, 32, 32]);
        let physical = logical;
        let volume = VoxelBuffer::<u8>::zeros(physical.shape());
        let brick = Brick::new(logical, physical, volume).unwrap();
        let new_grid = Grid::with_zero_offset(UVec3::splat(64));
        let fragments = split_brick(&brick, &new_grid).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].1.physical_box, physical);
    }

    #[test]
    fn multiple_fragments_when_spanning_new_blocks() {
        let logical = Box3::from_arrays([0, 0, 0], [64, 64, 64]);
        let physical = logical;
        let mut volume = VoxelBuffer::<u32>::zeros(physical.shape());
        for (i, v) in volume.as_mut_slice().iter_mut().enumerate() {
            *v = i as u32;
        }
        let brick = Brick::new(logical, physical, volume).unwrap();
        let new_grid = Grid::with_zero_offset(UVec3::splat(32));
        let fragments = split_brick(&brick, &new_grid).unwrap();
        assert_eq!(fragments.len(), 8);

        let total: i64 = fragments.iter().map(|(_, f)| f.physical_box.volume()).sum();
        assert_eq!(total, brick.physical_box.volume());

        for i in 0..fragments.len() {
            for j in (i + 1)..fragments.len() {
                assert!(fragments[i]
                    .1
                    .physical_box
                    .intersect(&fragments[j].1.physical_box)
                    .is_empty());
            }
        }
    }

    #[test]
    fn empty_physical_box_emits_nothing() {
        let logical = Box3::from_arrays([0, 0, 0], [32, 32, 32]);
        let physical = Box3::from_arrays([10, 10, 10], [10, 10, 10]);
        let volume = VoxelBuffer::<u8>::zeros(I64Vec3::ZERO);
        let brick = Brick::new(logical, physical, volume).unwrap();
        let new_grid = Grid::with_zero_offset(UVec3::splat(16));
        assert!(split_brick(&brick, &new_grid).unwrap().is_empty());
    }
}
