//! Subvolume regions and boundary-slab extraction.

use smallvec::SmallVec;

use crate::brick::VoxelBuffer;
use crate::geometry::Box3;

/// Inline capacity for a region's neighbor list: six faces, matching the halo engine's
/// up-to-six axial slabs (§4.H) — corner/edge adjacency is not tracked (see the stitching
/// engine's Open Question resolution), so face neighbors are the only entries that occur.
pub type NeighborList = SmallVec<[(u32, Box3); 6]>;

/// An independently-segmented region with a stable id, used only for stitching.
///
/// `neighbors` is the side-table replacing a pointer web between subvolumes (see the
/// stitching engine's design notes): each entry names a neighboring region's id and its
/// box, so boundary extraction never has to discover adjacency by scanning every other
/// region in the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubvolumeRegion {
    pub roi_id: u32,
    pub box_: Box3,
    pub border: u32,
    pub max_id: u64,
    pub neighbors: NeighborList,
}

/// A region paired with its materialized label volume.
pub struct RegionVolume {
    pub region: SubvolumeRegion,
    pub volume: VoxelBuffer<u64>,
}

impl RegionVolume {
    pub fn new(region: SubvolumeRegion, volume: VoxelBuffer<u64>) -> Self {
        Self { region, volume }
    }

    /// Extracts the sub-region `overlap` (in absolute coordinates) out of this region's
    /// volume.
    pub fn boundary_slab(&self, overlap: &Box3) -> VoxelBuffer<u64> {
        let rel = overlap.relative_to(&self.region.box_);
        self.volume.extract(&rel)
    }
}

/// Determines whether two region boxes share a full face: their extents match exactly on
/// two axes and overlap (possibly zero-thickness, abutting) on the third. Returns the
/// shared axis index (0=x, 1=y, 2=z order is irrelevant here — see `Box3`'s own ZYX
/// convention, axis index matches `to_array()` order) if so.
///
/// Boxes differing on more than one axis meet only at an edge or corner and are not
/// considered adjacent for stitching purposes (see the stitching engine's Open Question
/// resolution).
pub fn shared_axis(a: &Box3, b: &Box3) -> Option<usize> {
    let overlap = a.intersect(b);
    if overlap.is_empty() {
        return None;
    }
    let a_s = a.start.to_array();
    let a_e = a.stop.to_array();
    let b_s = b.start.to_array();
    let b_e = b.stop.to_array();

    let mut diff_axis = None;
    for axis in 0..3 {
        if a_s[axis] == b_s[axis] && a_e[axis] == b_e[axis] {
            continue;
        }
        if diff_axis.is_some() {
            return None;
        }
        diff_axis = Some(axis);
    }
    diff_axis
}
