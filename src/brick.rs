//! Bricks: the unit of data this crate moves around.

use glam::I64Vec3;

use crate::error::{CoreError, CoreResult};
use crate::geometry::Box3;

/// A dense row-major (Z innermost) buffer of voxel samples, sized to a `Box3`'s shape.
#[derive(Debug, Clone)]
pub struct VoxelBuffer<T> {
    shape: [usize; 3], // x, y, z
    data: Vec<T>,
}

impl<T: Clone + Default> VoxelBuffer<T> {
    pub fn zeros(shape: I64Vec3) -> Self {
        let shape = [shape.x as usize, shape.y as usize, shape.z as usize];
        let len = shape[0] * shape[1] * shape[2];
        Self {
            shape,
            data: vec![T::default(); len],
        }
    }
}

impl<T: Clone> VoxelBuffer<T> {
    pub fn from_vec(shape: I64Vec3, data: Vec<T>) -> Self {
        let shape = [shape.x as usize, shape.y as usize, shape.z as usize];
        assert_eq!(
            shape[0] * shape[1] * shape[2],
            data.len(),
            "VoxelBuffer::from_vec: data length does not match shape"
        );
        Self { shape, data }
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.shape[1] + y) * self.shape[2] + z
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> &T {
        &self.data[self.index(x, y, z)]
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) {
        let i = self.index(x, y, z);
        self.data[i] = value;
    }

    /// Copies the sub-region `rel_box` (relative to this buffer's own origin) out as a new,
    /// independently-owned buffer.
    pub fn extract(&self, rel_box: &Box3) -> VoxelBuffer<T> {
        let shape = rel_box.shape();
        let mut out = Vec::with_capacity(rel_box.volume() as usize);
        for x in rel_box.start.x..rel_box.stop.x {
            for y in rel_box.start.y..rel_box.stop.y {
                for z in rel_box.start.z..rel_box.stop.z {
                    out.push(self.get(x as usize, y as usize, z as usize).clone());
                }
            }
        }
        VoxelBuffer::from_vec(shape, out)
    }

    /// Writes `src` into this buffer at the relative offset `rel_box.start`; `rel_box`'s
    /// shape must equal `src`'s shape.
    pub fn blit(&mut self, rel_box: &Box3, src: &VoxelBuffer<T>) {
        debug_assert_eq!(
            rel_box.shape().to_array().map(|v| v as usize),
            src.shape(),
            "blit: destination region shape does not match source buffer shape"
        );
        let mut i = 0usize;
        for x in rel_box.start.x..rel_box.stop.x {
            for y in rel_box.start.y..rel_box.stop.y {
                for z in rel_box.start.z..rel_box.stop.z {
                    let v = src.data[i].clone();
                    self.set(x as usize, y as usize, z as usize, v);
                    i += 1;
                }
            }
        }
    }
}

/// A unit of data pinned to one block of a `Grid`: a grid-aligned `logical_box`, the
/// `physical_box` actually backed by data (a subset of the logical box), and the buffer
/// itself.
#[derive(Debug, Clone)]
pub struct Brick<T> {
    pub logical_box: Box3,
    pub physical_box: Box3,
    pub volume: VoxelBuffer<T>,
}

impl<T: Clone> Brick<T> {
    /// Constructs a brick, checking the invariants from the data model: the physical box
    /// must lie within the logical box and the volume's shape must match the physical box.
    pub fn new(logical_box: Box3, physical_box: Box3, volume: VoxelBuffer<T>) -> CoreResult<Self> {
        if !logical_box.contains_box(&physical_box) {
            return Err(CoreError::Geometry(format!(
                "physical_box {physical_box:?} is not contained in logical_box {logical_box:?}"
            )));
        }
        let expect_shape = physical_box.shape().to_array().map(|v| v as usize);
        if volume.shape() != expect_shape {
            return Err(CoreError::Geometry(format!(
                "volume shape {:?} does not match physical_box shape {:?}",
                volume.shape(),
                expect_shape
            )));
        }
        Ok(Self {
            logical_box,
            physical_box,
            volume,
        })
    }
}
