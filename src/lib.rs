//! bricktile - bricked volume partitioning engine for distributed connectomics-scale
//! image processing.
//!
//! This crate provides the core, backend-agnostic machinery for tiling an extremely
//! large 3D labeled or grayscale volume into "bricks" aligned to a `Grid`, moving those
//! bricks through a transform pipeline (padding, label remapping, downsampling), and
//! shuffling them onto a new grid via split/group/assemble. A separate stitching engine
//! reconciles segmentation label identities across independently-processed subvolume
//! boundaries into one global label merge.
//!
//! Concrete voxel backends (DVID, N5, Zarr, HDF5, BrainMaps, ...) are external
//! collaborators that implement the [`voxel_service::VoxelService`] / `VoxelSink`
//! capability; this crate never talks to a specific storage system directly.
//!
//! # Example
//!
//! ```ignore
//! use bricktile::geometry::{Box3, Grid};
//! use bricktile::wall::BrickWall;
//! use bricktile::downsample::DownsampleMethod;
//! use glam::{I64Vec3, UVec3};
//!
//! let bbox = Box3::new(I64Vec3::ZERO, I64Vec3::splat(256));
//! let wall: BrickWall<u8> = BrickWall::from_volume_service(source_service, 0, bbox);
//! let scale1 = wall.downsample(UVec3::splat(2), DownsampleMethod::Grayscale);
//! scale1.persist_and_execute("scale-1")?;
//! ```

pub mod brick;
pub mod config;
pub mod downsample;
pub mod error;
pub mod geometry;
pub mod halo;
pub mod labelmap;
pub mod metrics;
pub mod partition;
pub mod retry;
pub mod slab;
pub mod stats;
pub mod stitch;
pub mod timeout;
pub mod voxel_service;
pub mod wall;


pub use brick::{Brick, VoxelBuffer};
pub use config::Config;
pub use downsample::DownsampleMethod;
pub use error::{CoreError, CoreResult};
pub use geometry::{Box3, Grid};
pub use labelmap::{LabelMap, LabelMapper};
pub use slab::{Checkpoint, SlabRunner};
pub use voxel_service::{VoxelService, VoxelSink};
pub use wall::BrickWall;
