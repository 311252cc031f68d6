//! Half-open axis-aligned integer boxes in ZYX order.

use glam::I64Vec3;

/// A half-open 3D integer interval `[start, stop)`, ZYX order.
///
/// `stop >= start` componentwise is maintained as an invariant by every constructor and
/// mutating method in this module; a box with `start == stop` on some axis is a legal
/// "empty" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Box3 {
    pub start: I64Vec3,
    pub stop: I64Vec3,
}

impl Box3 {
    pub fn new(start: I64Vec3, stop: I64Vec3) -> Self {
        debug_assert!(
            stop.x >= start.x && stop.y >= start.y && stop.z >= start.z,
            "Box3::new: stop {stop:?} must be >= start {start:?}"
        );
        Self { start, stop }
    }

    pub fn from_arrays(start: [i64; 3], stop: [i64; 3]) -> Self {
        Self::new(I64Vec3::from_array(start), I64Vec3::from_array(stop))
    }

    pub fn empty() -> Self {
        Self {
            start: I64Vec3::ZERO,
            stop: I64Vec3::ZERO,
        }
    }

    pub fn shape(&self) -> I64Vec3 {
        self.stop - self.start
    }

    pub fn volume(&self) -> i64 {
        let s = self.shape();
        s.x.max(0) * s.y.max(0) * s.z.max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.stop.x <= self.start.x || self.stop.y <= self.start.y || self.stop.z <= self.start.z
    }

    /// Componentwise intersection. Returns an empty box (not necessarily `Box3::empty()`,
    /// but satisfying `is_empty()`) if the boxes do not overlap.
    pub fn intersect(&self, other: &Box3) -> Box3 {
        let start = self.start.max(other.start);
        let stop = self.stop.min(other.stop);
        let stop = stop.max(start);
        Box3 { start, stop }
    }

    pub fn intersects(&self, other: &Box3) -> bool {
        !self.intersect(other).is_empty()
    }

    pub fn contains_box(&self, other: &Box3) -> bool {
        other.start.cmpge(self.start).all() && other.stop.cmple(self.stop).all()
    }

    pub fn translated(&self, by: I64Vec3) -> Box3 {
        Box3 {
            start: self.start + by,
            stop: self.stop + by,
        }
    }

    /// This box's start/stop expressed relative to `origin`'s start — used to slice a
    /// buffer sized to `origin` down to the portion covered by `self`.
    pub fn relative_to(&self, origin: &Box3) -> Box3 {
        self.translated(-origin.start)
    }

    /// Round `start`/`stop` outward to the nearest multiple of `block_shape`.
    pub fn round_out(&self, block_shape: I64Vec3) -> Box3 {
        let start = floor_div_vec(self.start, block_shape) * block_shape;
        let stop = ceil_div_vec(self.stop, block_shape) * block_shape;
        Box3 { start, stop }
    }

    /// Round `start`/`stop` inward to the nearest multiple of `block_shape`.
    pub fn round_in(&self, block_shape: I64Vec3) -> Box3 {
        let start = ceil_div_vec(self.start, block_shape) * block_shape;
        let stop = floor_div_vec(self.stop, block_shape) * block_shape;
        let stop = stop.max(start);
        Box3 { start, stop }
    }

    /// Round `start`/`stop` down to the nearest multiple of `block_shape` (both edges).
    pub fn round_down(&self, block_shape: I64Vec3) -> Box3 {
        let start = floor_div_vec(self.start, block_shape) * block_shape;
        let stop = floor_div_vec(self.stop, block_shape) * block_shape;
        Box3 { start, stop }
    }
}

fn floor_div_vec(v: I64Vec3, by: I64Vec3) -> I64Vec3 {
    I64Vec3::new(
        v.x.div_euclid(by.x),
        v.y.div_euclid(by.y),
        v.z.div_euclid(by.z),
    )
}

fn ceil_div_vec(v: I64Vec3, by: I64Vec3) -> I64Vec3 {
    I64Vec3::new(
        -(-v.x).div_euclid(by.x),
        -(-v.y).div_euclid(by.y),
        -(-v.z).div_euclid(by.z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(start: [i64; 3], stop: [i64; 3]) -> Box3 {
        Box3::from_arrays(start, stop)
    }

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = b([0, 0, 0], [10, 10, 10]);
        let c = b([20, 20, 20], [30, 30, 30]);
        assert!(a.intersect(&c).is_empty());
    }

    #[test]
    fn intersect_overlapping() {
        let a = b([0, 0, 0], [10, 10, 10]);
        let c = b([5, 5, 5], [15, 15, 15]);
        let i = a.intersect(&c);
        assert_eq!(i.start, I64Vec3::new(5, 5, 5));
        assert_eq!(i.stop, I64Vec3::new(10, 10, 10));
    }

    #[test]
    fn contains_box() {
        let outer = b([0, 0, 0], [32, 32, 32]);
        let inner = b([4, 4, 4], [20, 20, 20]);
        assert!(outer.contains_box(&inner));
        assert!(!inner.contains_box(&outer));
    }

    #[test]
    fn round_out_expands_to_block_multiples() {
        let box_ = b([5, 5, 5], [70, 70, 70]);
        let rounded = box_.round_out(I64Vec3::splat(64));
        assert_eq!(rounded.start, I64Vec3::ZERO);
        assert_eq!(rounded.stop, I64Vec3::splat(128));
    }

    #[test]
    fn round_out_is_noop_on_aligned_box() {
        let box_ = b([64, 64, 64], [128, 128, 128]);
        assert_eq!(box_.round_out(I64Vec3::splat(64)), box_);
    }

    #[test]
    fn relative_to_subtracts_origin_start() {
        let origin = b([10, 20, 30], [50, 60, 70]);
        let inner = b([15, 25, 35], [20, 30, 40]);
        let rel = inner.relative_to(&origin);
        assert_eq!(rel.start, I64Vec3::new(5, 5, 5));
        assert_eq!(rel.stop, I64Vec3::new(10, 10, 10));
    }

    #[test]
    fn negative_start_rounds_correctly() {
        let box_ = b([-5, -5, -5], [10, 10, 10]);
        let rounded = box_.round_out(I64Vec3::splat(8));
        assert_eq!(rounded.start, I64Vec3::splat(-8));
        assert_eq!(rounded.stop, I64Vec3::splat(16));
    }
}
