//! The capability this crate consumes to read or write voxel data, implemented by
//! concrete backends (DVID, N5, Zarr, HDF5, BrainMaps, ...) outside this crate.

use glam::UVec3;

use crate::brick::VoxelBuffer;
use crate::error::CoreResult;
use crate::geometry::Box3;

/// Marker bound for the element types this crate moves through bricks.
pub trait VoxelSample: Clone + Default + Send + Sync + 'static {}

impl<T: Clone + Default + Send + Sync + 'static> VoxelSample for T {}

/// Abstract read access to a volume, at a chosen pyramid scale.
pub trait VoxelService<S: VoxelSample>: Send + Sync {
    fn bounding_box(&self) -> Box3;

    /// Suggested brick shape; not necessarily equal to the block shape used for storage.
    fn preferred_message_shape(&self) -> UVec3;

    fn block_width(&self) -> u32;

    fn available_scales(&self) -> Vec<u8>;

    /// Reads a rectangular region. Implementations should return `CoreError::Transient`
    /// for retryable backend failures so the retry wrapper in `retry.rs` can act on them.
    fn get_subvolume(&self, box_: &Box3, scale: u8) -> CoreResult<VoxelBuffer<S>>;
}

/// Write access, extending `VoxelService` with the capabilities a sink additionally needs.
pub trait VoxelSink<S: VoxelSample>: VoxelService<S> {
    /// Writes `buf` at `origin`. Implementations backed by block-addressed stores must
    /// make this idempotent at block granularity.
    fn write_subvolume(&self, buf: &VoxelBuffer<S>, origin: glam::I64Vec3, scale: u8) -> CoreResult<()>;

    /// Creates backing storage for `scale` if it does not already exist.
    fn create_if_necessary(&self, scale: u8) -> CoreResult<()>;

    /// Informs the sink that its addressable bounding box has grown to `new_box`.
    fn update_extents(&self, new_box: &Box3) -> CoreResult<()>;
}
