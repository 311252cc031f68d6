use super::*;

fn ibox(start: [i64; 3], stop: [i64; 3]) -> Box3 {
    Box3::from_arrays(start, stop)
}

#[test]
fn boxes_from_grid_covers_and_overhangs() {
    let grid = Grid::with_zero_offset(UVec3::splat(32));
    let bbox = ibox([0, 0, 0], [40, 40, 40]);
    let boxes = grid.boxes_from_grid(&bbox);
    // 2 blocks per axis (0..32, 32..64), 8 total.
    assert_eq!(boxes.len(), 8);
    assert!(boxes.iter().any(|b| b.stop.x == 64));
}

#[test]
fn clipped_boxes_tile_bounding_box_without_overlap() {
    // P1: clipped boxes are pairwise disjoint and their union equals the bounding box.
    let grid = Grid::new(UVec3::new(16, 32, 8), I64Vec3::new(3, -5, 0));
    let bbox = ibox([1, 2, 3], [70, 61, 29]);
    let boxes = grid.clipped_boxes_from_grid(&bbox);

    let total: i64 = boxes.iter().map(|b| b.volume()).sum();
    assert_eq!(total, bbox.volume());

    for i in 0..boxes.len() {
        for j in (i + 1)..boxes.len() {
            assert!(
                boxes[i].intersect(&boxes[j]).is_empty(),
                "boxes {:?} and {:?} overlap",
                boxes[i],
                boxes[j]
            );
        }
    }
    for b in &boxes {
        assert!(bbox.contains_box(b));
    }
}

#[test]
fn modulus_offset_wraps_into_range() {
    let grid = Grid::new(UVec3::splat(10), I64Vec3::splat(-3));
    let m = grid.modulus_offset();
    assert_eq!(m, I64Vec3::splat(7));
}

#[test]
fn equivalent_to_ignores_offset_multiples() {
    let a = Grid::new(UVec3::splat(10), I64Vec3::splat(0));
    let b = Grid::new(UVec3::splat(10), I64Vec3::splat(20));
    assert!(a.equivalent_to(&b));
    let c = Grid::new(UVec3::splat(10), I64Vec3::splat(3));
    assert!(!a.equivalent_to(&c));
}

#[test]
fn slabs_from_box_partitions_along_axis() {
    let bbox = ibox([0, 0, 0], [50, 50, 100]);
    let slabs = slabs_from_box(&bbox, 32, SlabAxis::Z);
    assert_eq!(slabs.len(), 4);
    assert_eq!(slabs[0].start.z, 0);
    assert_eq!(slabs[0].stop.z, 32);
    assert_eq!(slabs.last().unwrap().stop.z, 100);
    let total: i64 = slabs.iter().map(|s| s.volume()).sum();
    assert_eq!(total, bbox.volume());
}

#[test]
fn block_containing_negative_offset() {
    let grid = Grid::new(UVec3::splat(16), I64Vec3::splat(-8));
    let block = grid.block_containing(I64Vec3::splat(0));
    assert_eq!(block.start, I64Vec3::splat(-8));
    assert_eq!(block.stop, I64Vec3::splat(8));
}
