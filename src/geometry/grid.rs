//! Block tilings of 3-space.

use glam::{I64Vec3, UVec3};

use super::box3::Box3;
use crate::config::SlabAxis;

/// A tiling of 3-space by identically-shaped blocks at a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub block_shape: UVec3,
    pub offset: I64Vec3,
}

impl Grid {
    pub fn new(block_shape: UVec3, offset: I64Vec3) -> Self {
        Self { block_shape, offset }
    }

    pub fn with_zero_offset(block_shape: UVec3) -> Self {
        Self {
            block_shape,
            offset: I64Vec3::ZERO,
        }
    }

    fn block_shape_i64(&self) -> I64Vec3 {
        self.block_shape.as_i64vec3()
    }

    /// `offset mod block_shape`, componentwise, always in `[0, block_shape)`.
    pub fn modulus_offset(&self) -> I64Vec3 {
        let bs = self.block_shape_i64();
        I64Vec3::new(
            self.offset.x.rem_euclid(bs.x),
            self.offset.y.rem_euclid(bs.y),
            self.offset.z.rem_euclid(bs.z),
        )
    }

    /// Two grids tile space identically iff their block shapes and modulus offsets match.
    pub fn equivalent_to(&self, other: &Grid) -> bool {
        self.block_shape == other.block_shape && self.modulus_offset() == other.modulus_offset()
    }

    /// The logical box of the grid block that contains `point`.
    pub fn block_containing(&self, point: I64Vec3) -> Box3 {
        let bs = self.block_shape_i64();
        let rel = point - self.offset;
        let block_index = I64Vec3::new(
            rel.x.div_euclid(bs.x),
            rel.y.div_euclid(bs.y),
            rel.z.div_euclid(bs.z),
        );
        let start = self.offset + block_index * bs;
        Box3::new(start, start + bs)
    }

    /// Every grid-block box whose box intersects `bounding_box`, in lexicographic
    /// `(z, y, x)` order. Returned boxes are always full block size and may extend past
    /// `bounding_box`.
    pub fn boxes_from_grid(&self, bounding_box: &Box3) -> Vec<Box3> {
        if bounding_box.is_empty() {
            return Vec::new();
        }
        let bs = self.block_shape_i64();
        let first = self.block_containing(bounding_box.start).start;
        let last_point = bounding_box.stop - I64Vec3::ONE;
        let last = self.block_containing(last_point).start;

        let mut out = Vec::new();
        let mut z = first.z;
        while z <= last.z {
            let mut y = first.y;
            while y <= last.y {
                let mut x = first.x;
                while x <= last.x {
                    let start = I64Vec3::new(x, y, z);
                    out.push(Box3::new(start, start + bs));
                    x += bs.x;
                }
                y += bs.y;
            }
            z += bs.z;
        }
        out
    }

    /// Same as `boxes_from_grid`, but each box is clipped to `bounding_box`.
    pub fn clipped_boxes_from_grid(&self, bounding_box: &Box3) -> Vec<Box3> {
        self.boxes_from_grid(bounding_box)
            .into_iter()
            .map(|b| b.intersect(bounding_box))
            .filter(|b| !b.is_empty())
            .collect()
    }
}

/// Partition `box_` into contiguous slabs of `slab_depth` voxels along `axis`, aligned so
/// each slab boundary falls on a multiple of `slab_depth` measured from `box_.start` on
/// that axis.
pub fn slabs_from_box(box_: &Box3, slab_depth: u32, axis: SlabAxis) -> Vec<Box3> {
    if box_.is_empty() || slab_depth == 0 {
        return Vec::new();
    }
    let idx = axis.index();
    let start = box_.start.to_array()[idx];
    let stop = box_.stop.to_array()[idx];
    let depth = slab_depth as i64;

    let mut out = Vec::new();
    let mut cur = start;
    while cur < stop {
        let next = (cur + depth).min(stop);
        let mut s = box_.start.to_array();
        let mut e = box_.stop.to_array();
        s[idx] = cur;
        e[idx] = next;
        out.push(Box3::from_arrays(s, e));
        cur = next;
    }
    out
}

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;
