//! Label remapping: applying a domain→codomain map over 64-bit label IDs to bricks.

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;

use crate::brick::Brick;
use crate::error::{CoreError, CoreResult};
use crate::wall::BrickWall;

/// A domain→codomain map over label IDs. Construction fails if the domain contains
/// duplicates, since the map would then be ambiguous.
#[derive(Debug, Clone)]
pub struct LabelMap {
    table: HashMap<u64, u64>,
}

impl LabelMap {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u64, u64)>) -> CoreResult<Self> {
        let mut table = HashMap::new();
        for (domain, codomain) in pairs {
            if table.insert(domain, codomain).is_some() {
                return Err(CoreError::AmbiguousLabelMap(domain));
            }
        }
        Ok(Self { table })
    }

    /// Parses a two-column CSV (`domain,codomain` per line, optional header skipped if it
    /// doesn't parse as integers), mirroring how label maps are loaded from a side-file in
    /// the original workflow tooling.
    pub fn from_csv(text: &str) -> CoreResult<Self> {
        let mut pairs = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split(',');
            let (Some(a), Some(b)) = (parts.next(), parts.next()) else {
                continue;
            };
            let (Ok(domain), Ok(codomain)) = (a.trim().parse::<u64>(), b.trim().parse::<u64>()) else {
                continue; // header row or malformed line
            };
            pairs.push((domain, codomain));
        }
        Self::from_pairs(pairs)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Looks up `label`, returning the label unchanged if `allow_unmapped` and it is not in
    /// the domain.
    pub fn apply(&self, label: u64, allow_unmapped: bool) -> CoreResult<u64> {
        match self.table.get(&label) {
            Some(&mapped) => Ok(mapped),
            None if allow_unmapped => Ok(label),
            None => Err(CoreError::Validation(format!(
                "label {label} has no entry in the label map and allow_unmapped is false"
            ))),
        }
    }

    /// Composes `self` then `other`: `other.apply(self.apply(label))`.
    pub fn compose(&self, other: &LabelMap) -> CoreResult<LabelMap> {
        let mut pairs = Vec::with_capacity(self.table.len());
        for (&domain, &mid) in &self.table {
            let codomain = other.apply(mid, true)?;
            pairs.push((domain, codomain));
        }
        LabelMap::from_pairs(pairs)
    }
}

/// Built once and shared read-only across every brick task, per the broadcast-state policy:
/// the label mapper is constructed on the driver, never rebuilt per partition.
#[derive(Clone)]
pub struct LabelMapper {
    map: Arc<LabelMap>,
    allow_unmapped: bool,
}

impl LabelMapper {
    pub fn new(map: LabelMap, allow_unmapped: bool) -> Self {
        Self {
            map: Arc::new(map),
            allow_unmapped,
        }
    }

    fn remap_brick(&self, mut brick: Brick<u64>) -> CoreResult<Brick<u64>> {
        for v in brick.volume.as_mut_slice() {
            *v = self.map.apply(*v, self.allow_unmapped)?;
        }
        Ok(brick)
    }

    /// Applies the map to every brick in `wall`, returning a new lazy wall. The output is a
    /// distinct `BrickWall`, so unpersisting it does not affect the input.
    pub fn apply_to_wall(&self, wall: &BrickWall<u64>) -> BrickWall<u64> {
        let mapper = self.clone();
        wall.map(move |b| mapper.remap_brick(b))
    }

    /// Applies the map to a brick slice directly (for callers outside the `BrickWall`
    /// abstraction, e.g. within the stitching pipeline).
    pub fn apply_to_bricks(&self, bricks: &[Brick<u64>]) -> CoreResult<Vec<Brick<u64>>> {
        bricks
            .par_iter()
            .cloned()
            .map(|b| self.remap_brick(b))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brick::VoxelBuffer;
    use crate::geometry::Box3;
    use glam::I64Vec3;

    #[test]
    fn rejects_duplicate_domain_entries() {
        let result = LabelMap::from_pairs([(1, 10), (2, 20), (1, 30)]);
        assert!(matches!(result, Err(CoreError::AmbiguousLabelMap(1))));
    }

    #[test]
    fn apply_maps_known_and_passes_through_unmapped() {
        let map = LabelMap::from_pairs([(1, 100), (2, 200)]).unwrap();
        assert_eq!(map.apply(1, false).unwrap(), 100);
        assert_eq!(map.apply(5, true).unwrap(), 5);
        assert!(map.apply(5, false).is_err());
    }

    #[test]
    fn from_csv_skips_header_and_blank_lines() {
        let csv = "domain,codomain\n1,10\n\n2,20\n";
        let map = LabelMap::from_csv(csv).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.apply(2, false).unwrap(), 20);
    }

    #[test]
    fn compose_chains_two_maps() {
        let m1 = LabelMap::from_pairs([(1, 2)]).unwrap();
        let m2 = LabelMap::from_pairs([(2, 3)]).unwrap();
        let composed = m1.compose(&m2).unwrap();
        assert_eq!(composed.apply(1, false).unwrap(), 3);
    }

    #[test]
    fn mapper_remaps_brick_in_place() {
        let map = LabelMap::from_pairs([(7, 70)]).unwrap();
        let mapper = LabelMapper::new(map, true);
        let logical = Box3::from_arrays([0, 0, 0], [2, 2, 2]);
        let mut buf = VoxelBuffer::<u64>::zeros(I64Vec3::splat(2));
        buf.set(0, 0, 0, 7);
        buf.set(1, 1, 1, 9);
        let brick = Brick::new(logical, logical, buf).unwrap();
        let remapped = mapper.apply_to_bricks(&[brick]).unwrap();
        assert_eq!(*remapped[0].volume.get(0, 0, 0), 70);
        assert_eq!(*remapped[0].volume.get(1, 1, 1), 9);
    }
}
