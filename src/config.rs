//! Validated job configuration.
//!
//! Mirrors the option surface enumerated in the specification's external interfaces
//! section. Field names are `kebab-case` so a `Config` can be deserialized directly
//! from the option spellings a driver would parse out of a workflow file.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Where pyramid scales above 0 come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PyramidSource {
    /// Read each scale directly from the source service.
    Copy,
    /// Compute each scale by grayscale-downsampling the previous one.
    Compute,
    /// Compute each scale by label-downsampling the previous one.
    ComputeAsLabels,
}

/// Which per-slice contrast correction to apply, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContrastAdjustment {
    None,
    Clahe,
    HotknifeDestripe,
}

/// Axis along which slabs are cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlabAxis {
    X,
    Y,
    Z,
}

impl SlabAxis {
    pub fn index(self) -> usize {
        match self {
            SlabAxis::X => 0,
            SlabAxis::Y => 1,
            SlabAxis::Z => 2,
        }
    }
}

/// Segmentation-stitching aggressiveness, see the stitching engine design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StitchMode {
    None,
    Conservative,
    Medium,
    Aggressive,
}

impl StitchMode {
    /// Integer code matching the original workflow's `stitch_mode` values.
    pub fn code(self) -> u8 {
        match self {
            StitchMode::None => 0,
            StitchMode::Conservative => 1,
            StitchMode::Medium => 2,
            StitchMode::Aggressive => 3,
        }
    }
}

/// Resume cursor for the slab iterator, seeded from a prior job's checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ResumeSpec {
    pub scale: u8,
    pub batch_index: usize,
}

/// The full set of options this core recognizes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub min_pyramid_scale: u8,
    pub max_pyramid_scale: u8,
    pub pyramid_source: PyramidSource,
    pub slab_depth: u32,
    pub slab_axis: SlabAxis,
    pub starting_slice: u32,
    pub contrast_adjustment: ContrastAdjustment,
    #[serde(default)]
    pub hotknife_seams: Vec<i64>,
    pub stitch_algorithm: StitchMode,
    #[serde(default)]
    pub resume: Option<ResumeSpec>,
}

impl Config {
    /// Checks every constraint enumerated in the external-interfaces section, in the order
    /// listed there, returning the first violation found.
    pub fn validate(&self, output_brick_width: u32) -> CoreResult<()> {
        if self.min_pyramid_scale > 10 {
            return Err(CoreError::Validation(format!(
                "min-pyramid-scale {} out of range [0, 10]",
                self.min_pyramid_scale
            )));
        }
        if self.max_pyramid_scale > 10 {
            return Err(CoreError::Validation(format!(
                "max-pyramid-scale {} out of range [0, 10]",
                self.max_pyramid_scale
            )));
        }
        if self.min_pyramid_scale > self.max_pyramid_scale {
            return Err(CoreError::Validation(format!(
                "min-pyramid-scale {} exceeds max-pyramid-scale {}",
                self.min_pyramid_scale, self.max_pyramid_scale
            )));
        }
        if self.slab_depth == 0 || self.slab_depth % output_brick_width != 0 {
            return Err(CoreError::Validation(format!(
                "slab-depth {} must be a positive multiple of the output brick width {}",
                self.slab_depth, output_brick_width
            )));
        }
        if self.starting_slice % self.slab_depth != 0 {
            return Err(CoreError::Validation(format!(
                "starting-slice {} must be a multiple of slab-depth {}",
                self.starting_slice, self.slab_depth
            )));
        }
        if let Some(first) = self.hotknife_seams.first() {
            if *first != -1 {
                return Err(CoreError::Validation(
                    "hotknife-seams must begin with -1".to_string(),
                ));
            }
        }
        Ok(())
    }
}
