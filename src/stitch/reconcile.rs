//! Global label reconciliation: offsetting, boundary voting, and union-find merge.

use std::collections::HashMap;

use crate::config::StitchMode;
use crate::error::{CoreError, CoreResult};
use crate::stitch::region::{shared_axis, RegionVolume};
use crate::stitch::unionfind::UnionFind;

/// Minimum absolute vote count for a candidate merge under `conservative`/`aggressive`.
const AGGRESSIVE_MIN_VOTES: u64 = 1000;
const CONSERVATIVE_RATIO: f64 = 0.90;
const AGGRESSIVE_RATIO: f64 = 0.90;
/// Co-occurrence votes must strictly exceed this before two labels are even considered a
/// candidate pairing; a count of exactly 50 is pruned, matching the original's
/// `val > max_val` comparison against a `max_val` initialized to the hard threshold.
const MIN_CANDIDATE_VOTES: u64 = 50;

/// Computes each region's global label offset via a prefix sum over `max_id`, in `roi_id`
/// order — every region's local labels become globally unique once offset.
pub fn global_offsets(regions: &[RegionVolume]) -> HashMap<u32, u64> {
    let mut ordered: Vec<&RegionVolume> = regions.iter().collect();
    ordered.sort_by_key(|r| r.region.roi_id);
    let mut offsets = HashMap::new();
    let mut running = 0u64;
    for r in ordered {
        offsets.insert(r.region.roi_id, running);
        running += r.region.max_id;
    }
    offsets
}

/// Counts, for the 1-voxel-thick interface plane at the midpoint of `overlap` along
/// `axis`, how often each `(label_in_a, label_in_b)` pair co-occurs.
fn plane_votes(
    a: &RegionVolume,
    b: &RegionVolume,
    overlap: &crate::geometry::Box3,
    axis: usize,
) -> HashMap<(u64, u64), u64> {
    let slab_a = a.boundary_slab(overlap);
    let slab_b = b.boundary_slab(overlap);
    let shape = slab_a.shape();
    let mid = shape[axis] / 2;

    let mut votes = HashMap::new();
    let (nx, ny, nz) = (shape[0], shape[1], shape[2]);
    for x in 0..nx {
        for y in 0..ny {
            for z in 0..nz {
                let coord = [x, y, z];
                if coord[axis] != mid {
                    continue;
                }
                let la = *slab_a.get(x, y, z);
                let lb = *slab_b.get(x, y, z);
                *votes.entry((la, lb)).or_insert(0) += 1;
            }
        }
    }
    votes
}

struct LabelTotals {
    best_b_for_a: HashMap<u64, (u64, u64)>, // a_label -> (best b_label, votes)
    best_a_for_b: HashMap<u64, (u64, u64)>, // b_label -> (best a_label, votes)
    total_for_a: HashMap<u64, u64>,
}

fn summarize(votes: &HashMap<(u64, u64), u64>) -> LabelTotals {
    let mut best_b_for_a: HashMap<u64, (u64, u64)> = HashMap::new();
    let mut best_a_for_b: HashMap<u64, (u64, u64)> = HashMap::new();
    let mut total_for_a: HashMap<u64, u64> = HashMap::new();

    for (&(la, lb), &count) in votes {
        *total_for_a.entry(la).or_insert(0) += count;

        best_b_for_a
            .entry(la)
            .and_modify(|(cur_b, cur_count)| {
                if count > *cur_count || (count == *cur_count && lb < *cur_b) {
                    *cur_b = lb;
                    *cur_count = count;
                }
            })
            .or_insert((lb, count));

        best_a_for_b
            .entry(lb)
            .and_modify(|(cur_a, cur_count)| {
                if count > *cur_count || (count == *cur_count && la < *cur_a) {
                    *cur_a = la;
                    *cur_count = count;
                }
            })
            .or_insert((la, count));
    }

    LabelTotals {
        best_b_for_a,
        best_a_for_b,
        total_for_a,
    }
}

/// Candidate global-label merges for one neighbor pair, under `mode`. Labels are returned
/// already offset into global space.
pub fn candidate_merges_for_pair(
    a: &RegionVolume,
    b: &RegionVolume,
    offset_a: u64,
    offset_b: u64,
    mode: StitchMode,
) -> Vec<(u64, u64)> {
    if mode == StitchMode::None {
        return Vec::new();
    }
    let Some(axis) = shared_axis(&a.region.box_, &b.region.box_) else {
        return Vec::new();
    };
    let overlap = a.region.box_.intersect(&b.region.box_);
    let votes = plane_votes(a, b, &overlap, axis);
    let totals = summarize(&votes);

    let mut merges = Vec::new();
    for (&la, &(lb, count)) in &totals.best_b_for_a {
        if count <= MIN_CANDIDATE_VOTES {
            continue;
        }
        let total = totals.total_for_a.get(&la).copied().unwrap_or(count);
        let ratio = count as f64 / total as f64;
        let mutual = totals
            .best_a_for_b
            .get(&lb)
            .map(|&(back_a, _)| back_a == la)
            .unwrap_or(false);

        let accept = match mode {
            StitchMode::None => false,
            StitchMode::Conservative => ratio >= CONSERVATIVE_RATIO,
            StitchMode::Medium => mutual,
            StitchMode::Aggressive => ratio > AGGRESSIVE_RATIO && count > AGGRESSIVE_MIN_VOTES,
        };
        if accept {
            let ga = la + offset_a;
            let gb = lb + offset_b;
            merges.push(if ga <= gb { (ga, gb) } else { (gb, ga) });
        }
    }
    merges
}

/// Groups each region's declared `neighbors` entries into unordered pairs keyed by
/// `(min(roi_id), max(roi_id))` (§4.S step 2-3). A well-formed job has every neighbor
/// relationship declared from both sides, so each key group has exactly two members; any
/// other count is a `BoundaryPairingMismatch`.
pub fn boundary_pairs(regions: &[RegionVolume]) -> CoreResult<Vec<(u32, u32)>> {
    let mut groups: HashMap<(u32, u32), Vec<u32>> = HashMap::new();
    for r in regions {
        for &(neighbor_id, _neighbor_box) in &r.region.neighbors {
            let key = if r.region.roi_id <= neighbor_id {
                (r.region.roi_id, neighbor_id)
            } else {
                (neighbor_id, r.region.roi_id)
            };
            groups.entry(key).or_default().push(r.region.roi_id);
        }
    }

    let mut pairs = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        if members.len() != 2 {
            return Err(CoreError::BoundaryPairingMismatch { found: members.len() });
        }
        pairs.push(key);
    }
    pairs.sort_unstable();
    Ok(pairs)
}

/// Runs the full stitching pipeline: global offsetting, boundary reconciliation across
/// every neighbor-declared pair, and a union-find merge. Returns the final global label
/// remap (every label observed in a merge mapped to the smallest label in its component).
pub fn stitch(regions: &[RegionVolume], mode: StitchMode) -> CoreResult<HashMap<u64, u64>> {
    let _span = tracing::info_span!("stitch", regions = regions.len(), ?mode).entered();
    let offsets = global_offsets(regions);
    let by_id: HashMap<u32, &RegionVolume> =
        regions.iter().map(|r| (r.region.roi_id, r)).collect();
    let mut uf = UnionFind::new();
    let mut candidate_count = 0u64;

    for (a_id, b_id) in boundary_pairs(regions)? {
        let a = by_id
            .get(&a_id)
            .ok_or_else(|| CoreError::Geometry(format!("unknown neighbor roi_id {a_id}")))?;
        let b = by_id
            .get(&b_id)
            .ok_or_else(|| CoreError::Geometry(format!("unknown neighbor roi_id {b_id}")))?;
        let offset_a = *offsets
            .get(&a_id)
            .ok_or_else(|| CoreError::Geometry("missing offset for region".to_string()))?;
        let offset_b = *offsets
            .get(&b_id)
            .ok_or_else(|| CoreError::Geometry("missing offset for region".to_string()))?;
        let merges = candidate_merges_for_pair(a, b, offset_a, offset_b, mode);
        tracing::debug!(a_id, b_id, candidates = merges.len(), "boundary pair reconciled");
        candidate_count += merges.len() as u64;
        for (ga, gb) in merges {
            uf.union(ga, gb);
        }
    }

    let remap = uf.into_label_map();
    tracing::info!(candidate_count, components = remap.len(), "stitch complete");
    Ok(remap)
}
