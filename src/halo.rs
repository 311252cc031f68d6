//! Halo padding: aligning a brick's physical box outward to a padding grid by fetching the
//! missing border voxels through an accessor callback.

use glam::I64Vec3;

use crate::brick::{Brick, VoxelBuffer};
use crate::error::{CoreError, CoreResult};
use crate::geometry::{Box3, Grid};
use crate::voxel_service::VoxelSample;

/// Aligns `brick.physical_box` outward to `padding_grid`'s block boundaries, fetching any
/// missing border voxels via `accessor`. If the brick is already aligned, returns it
/// unchanged (no copy). Fails with `PaddingExceedsLogicalBox` if the padded box would
/// extend past the brick's logical box.
pub fn pad_brick<S: VoxelSample>(
    brick: &Brick<S>,
    padding_grid: &Grid,
    accessor: impl Fn(&Box3) -> CoreResult<VoxelBuffer<S>>,
) -> CoreResult<Brick<S>> {
    let offset = padding_grid.offset;
    let offset_physical_box = brick.physical_box.translated(-offset);
    let offset_padded_box = offset_physical_box.round_out(padding_grid.block_shape.as_i64vec3());
    let padded_box = offset_padded_box.translated(offset);

    if padded_box == brick.physical_box {
        return Ok(brick.clone());
    }

    if !brick.logical_box.contains_box(&padded_box) {
        tracing::warn!(?padded_box, logical_box = ?brick.logical_box, "padding exceeds logical box");
        return Err(CoreError::PaddingExceedsLogicalBox(format!(
            "padded_box {:?} exceeds logical_box {:?}",
            padded_box, brick.logical_box
        )));
    }

    let mut buffer = VoxelBuffer::zeros(padded_box.shape());
    let orig_rel = brick.physical_box.relative_to(&padded_box);
    buffer.blit(&orig_rel, &brick.volume);

    for axis in 0..3 {
        for side in [Side::Low, Side::High] {
            let orig = brick.physical_box;
            let padded = padded_box;
            let orig_arr_lo = orig.start.to_array();
            let orig_arr_hi = orig.stop.to_array();
            let padded_arr_lo = padded.start.to_array();
            let padded_arr_hi = padded.stop.to_array();

            let needs_fetch = match side {
                Side::Low => padded_arr_lo[axis] != orig_arr_lo[axis],
                Side::High => padded_arr_hi[axis] != orig_arr_hi[axis],
            };
            if !needs_fetch {
                continue;
            }

            let mut halo_start = padded.start.to_array();
            let mut halo_stop = padded.stop.to_array();
            match side {
                Side::Low => {
                    halo_stop[axis] = orig_arr_lo[axis];
                }
                Side::High => {
                    halo_start[axis] = orig_arr_hi[axis];
                }
            }
            let halo_box = Box3::from_arrays(halo_start, halo_stop);
            if halo_box.is_empty() {
                continue;
            }
            let halo_data = accessor(&halo_box)?;
            let rel = halo_box.relative_to(&padded_box);
            buffer.blit(&rel, &halo_data);
        }
    }

    Brick::new(brick.logical_box, padded_box, buffer)
}

#[derive(Clone, Copy)]
enum Side {
    Low,
    High,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;

    fn brick_with(logical: Box3, physical: Box3, fill: u8) -> Brick<u8> {
        let mut buf = VoxelBuffer::zeros(physical.shape());
        for v in buf.as_mut_slice() {
            *v = fill;
        }
        Brick::new(logical, physical, buf).unwrap()
    }

    #[test]
    fn aligned_brick_is_unchanged() {
        let logical = Box3::from_arrays([0, 0, 0], [64, 64, 64]);
        let physical = logical;
        let brick = brick_with(logical, physical, 1);
        let grid = Grid::with_zero_offset(UVec3::splat(32));
        let padded = pad_brick(&brick, &grid, |_| panic!("should not fetch")).unwrap();
        assert_eq!(padded.physical_box, physical);
    }

    #[test]
    fn pads_with_fetched_halo_data() {
        let logical = Box3::from_arrays([0, 0, 0], [64, 64, 64]);
        let physical = Box3::from_arrays([10, 0, 0], [54, 64, 64]);
        let brick = brick_with(logical, physical, 5);
        let grid = Grid::with_zero_offset(UVec3::splat(32));

        let padded = pad_brick(&brick, &grid, |halo_box| {
            Ok(VoxelBuffer::from_vec(
                halo_box.shape(),
                vec![9u8; halo_box.volume() as usize],
            ))
        })
        .unwrap();

        // Rounds [10,54) out to [0,64) on X.
        assert_eq!(padded.physical_box, Box3::from_arrays([0, 0, 0], [64, 64, 64]));
        assert_eq!(*padded.volume.get(0, 0, 0), 9);
        assert_eq!(*padded.volume.get(20, 0, 0), 5);
    }

    #[test]
    fn padding_is_idempotent() {
        // P3: pad(pad(B, G), G) == pad(B, G).
        let logical = Box3::from_arrays([0, 0, 0], [64, 64, 64]);
        let physical = Box3::from_arrays([10, 0, 0], [54, 64, 64]);
        let brick = brick_with(logical, physical, 5);
        let grid = Grid::with_zero_offset(UVec3::splat(32));
        let accessor = |halo_box: &Box3| {
            Ok(VoxelBuffer::from_vec(
                halo_box.shape(),
                vec![9u8; halo_box.volume() as usize],
            ))
        };

        let once = pad_brick(&brick, &grid, accessor).unwrap();
        let twice = pad_brick(&once, &grid, accessor).unwrap();
        assert_eq!(twice.physical_box, once.physical_box);
        assert_eq!(twice.volume.as_slice(), once.volume.as_slice());
    }

    #[test]
    fn rejects_padding_past_logical_box() {
        let logical = Box3::from_arrays([0, 0, 0], [32, 32, 32]);
        let physical = Box3::from_arrays([10, 0, 0], [30, 32, 32]);
        let brick = brick_with(logical, physical, 0);
        let grid = Grid::new(UVec3::splat(64), I64Vec3::ZERO);
        let result = pad_brick(&brick, &grid, |b| Ok(VoxelBuffer::zeros(b.shape())));
        assert!(matches!(result, Err(CoreError::PaddingExceedsLogicalBox(_))));
    }
}
