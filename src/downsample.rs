//! Box/mode/label-aware downsampling.

use std::collections::HashMap;

use glam::UVec3;

use crate::brick::{Brick, VoxelBuffer};
use crate::error::{CoreError, CoreResult};
use crate::voxel_service::VoxelSample;

/// Which reduction a `factor`-sized neighborhood undergoes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownsampleMethod {
    /// Strided pick of the neighborhood's first voxel.
    Subsample,
    /// Anti-aliased floating-point box-filter average, rounded back to the sample type.
    Grayscale,
    /// Most frequent value in the neighborhood; ties broken toward the numerically
    /// smallest value.
    Mode,
    /// Same tie-break rule as `Mode`; kept as a distinct variant because label downsampling
    /// is a conceptually separate operation even though the implementation coincides.
    Labels,
}

/// Sample types this crate knows how to downsample: orderable (for mode/label tie-breaks)
/// and convertible to/from `f64` (for the grayscale box filter).
pub trait DownsampleSample: VoxelSample + Ord + std::hash::Hash {
    fn to_f64(self) -> f64;
    fn from_f64(v: f64) -> Self;
}

macro_rules! impl_downsample_sample {
    ($t:ty) => {
        impl DownsampleSample for $t {
            fn to_f64(self) -> f64 {
                self as f64
            }
            fn from_f64(v: f64) -> Self {
                v.round() as $t
            }
        }
    };
}

impl_downsample_sample!(u8);
impl_downsample_sample!(u16);
impl_downsample_sample!(u32);
impl_downsample_sample!(u64);

/// Downsamples one brick by `factor`, reducing both its logical and physical boxes.
/// Fails with `UnalignedDownsample` if the physical box's shape is not evenly divisible by
/// `factor` on every axis.
pub fn downsample_block<S: DownsampleSample>(
    brick: &Brick<S>,
    factor: UVec3,
    method: DownsampleMethod,
) -> CoreResult<Brick<S>> {
    let shape = brick.physical_box.shape();
    let shape_u32 = [shape.x as u32, shape.y as u32, shape.z as u32];
    if shape_u32[0] % factor.x != 0 || shape_u32[1] % factor.y != 0 || shape_u32[2] % factor.z != 0
    {
        return Err(CoreError::UnalignedDownsample {
            factor: factor.to_array(),
            shape: shape_u32,
        });
    }

    let out_shape = [
        shape.x / factor.x as i64,
        shape.y / factor.y as i64,
        shape.z / factor.z as i64,
    ];
    let mut out = VoxelBuffer::<S>::zeros(glam::I64Vec3::from_array(out_shape));

    for ox in 0..out_shape[0] {
        for oy in 0..out_shape[1] {
            for oz in 0..out_shape[2] {
                let base = (
                    ox as usize * factor.x as usize,
                    oy as usize * factor.y as usize,
                    oz as usize * factor.z as usize,
                );
                let value = reduce_block(brick, base, factor, method);
                out.set(ox as usize, oy as usize, oz as usize, value);
            }
        }
    }

    let new_logical = scale_box_down(&brick.logical_box, factor);
    let new_physical = scale_box_down(&brick.physical_box, factor);
    Brick::new(new_logical, new_physical, out)
}

fn scale_box_down(box_: &crate::geometry::Box3, factor: UVec3) -> crate::geometry::Box3 {
    let f = factor.as_i64vec3();
    crate::geometry::Box3::new(box_.start / f, box_.stop / f)
}

fn reduce_block<S: DownsampleSample>(
    brick: &Brick<S>,
    base: (usize, usize, usize),
    factor: UVec3,
    method: DownsampleMethod,
) -> S {
    match method {
        DownsampleMethod::Subsample => brick.volume.get(base.0, base.1, base.2).clone(),
        DownsampleMethod::Grayscale => {
            let mut sum = 0.0f64;
            let mut count = 0.0f64;
            for dx in 0..factor.x as usize {
                for dy in 0..factor.y as usize {
                    for dz in 0..factor.z as usize {
                        let v = brick.volume.get(base.0 + dx, base.1 + dy, base.2 + dz).clone();
                        sum += v.to_f64();
                        count += 1.0;
                    }
                }
            }
            S::from_f64(sum / count)
        }
        DownsampleMethod::Mode | DownsampleMethod::Labels => {
            let mut counts: HashMap<S, u32> = HashMap::new();
            for dx in 0..factor.x as usize {
                for dy in 0..factor.y as usize {
                    for dz in 0..factor.z as usize {
                        let v = brick.volume.get(base.0 + dx, base.1 + dy, base.2 + dz).clone();
                        *counts.entry(v).or_insert(0) += 1;
                    }
                }
            }
            // Deterministic tie-break: among tied max counts, keep the numerically
            // smallest value (P5).
            counts
                .into_iter()
                .fold(None::<(S, u32)>, |best, (val, cnt)| match best {
                    None => Some((val, cnt)),
                    Some((bval, bcnt)) => {
                        if cnt > bcnt || (cnt == bcnt && val < bval) {
                            Some((val, cnt))
                        } else {
                            Some((bval, bcnt))
                        }
                    }
                })
                .map(|(v, _)| v)
                .expect("reduce_block: neighborhood must be non-empty")
        }
    }
}
