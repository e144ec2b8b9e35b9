// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned box, the query shape for spatial lookups.

use crate::{Line3, Vec3};

/// An axis-aligned box spanning corner `a` to corner `b`.
///
/// The constructors do not reorder corners; callers that need a normalized
/// box should build it from [`Box3::from_radius`] or sort corners with
/// [`Vec3::min`]/[`Vec3::max`] first. Spatial predicates operate on the XY
/// projection because map queries are screen areas.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Box3 {
    /// First corner.
    pub a: Vec3,
    /// Second corner.
    pub b: Vec3,
}

impl Box3 {
    /// Creates a box from two corners.
    #[must_use]
    pub const fn new(a: Vec3, b: Vec3) -> Self {
        Self { a, b }
    }

    /// Creates the box bounding a sphere of `radius` around `center`.
    #[must_use]
    pub fn from_radius(center: Vec3, radius: f64) -> Self {
        let extent = Vec3::new(radius, radius, radius);
        Self::new(center - extent, center + extent)
    }

    /// Creates a box from a corner and an offset to the opposite corner.
    #[must_use]
    pub fn from_offset(start: Vec3, offset: Vec3) -> Self {
        Self::new(start, start + offset)
    }

    /// Scales both corners by `factor`.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        self.map(|corner| corner * factor)
    }

    /// Returns the diagonal from `a` to `b` as a segment.
    #[must_use]
    pub fn line(self) -> Line3 {
        Line3::new(self.a, self.b)
    }

    /// Applies `f` to both corners.
    #[must_use]
    pub fn map<F>(self, f: F) -> Self
    where
        F: Fn(Vec3) -> Vec3,
    {
        Self::new(f(self.a), f(self.b))
    }

    /// Tests whether `point` lies within the XY projection of the box.
    ///
    /// Bounds are inclusive.
    #[must_use]
    pub fn contains_xy(self, point: Vec3) -> bool {
        let min = self.a.min(self.b);
        let max = self.a.max(self.b);
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// Tests whether a sphere of `radius` around `center` overlaps the XY
    /// projection of the box.
    ///
    /// This is the closest-point test: the sphere touches when the squared
    /// distance from its center to the clamped point is within the radius.
    #[must_use]
    pub fn touches_sphere_xy(self, center: Vec3, radius: f64) -> bool {
        let min = self.a.min(self.b);
        let max = self.a.max(self.b);

        let nearest_x = center.x.clamp(min.x, max.x);
        let nearest_y = center.y.clamp(min.y, max.y);

        let dx = center.x - nearest_x;
        let dy = center.y - nearest_y;
        dx * dx + dy * dy <= radius * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_radius_centers_the_box() {
        let b = Box3::from_radius(Vec3::new(5.0, 5.0, 0.0), 2.0);
        assert_eq!(b.a, Vec3::new(3.0, 3.0, -2.0));
        assert_eq!(b.b, Vec3::new(7.0, 7.0, 2.0));
    }

    #[test]
    fn from_offset_spans_corner_to_corner() {
        let b = Box3::from_offset(Vec3::new(1.0, 2.0, 0.0), Vec3::new(3.0, 4.0, 0.0));
        assert_eq!(b.b, Vec3::new(4.0, 6.0, 0.0));
    }

    #[test]
    fn scale_multiplies_corners() {
        let b = Box3::new(Vec3::new(1.0, 1.0, 0.0), Vec3::new(2.0, 2.0, 0.0)).scale(2.0);
        assert_eq!(b.a, Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(b.b, Vec3::new(4.0, 4.0, 0.0));
    }

    #[test]
    fn diagonal_line() {
        let b = Box3::new(Vec3::ZERO, Vec3::new(2.0, 3.0, 0.0));
        assert_eq!(b.line().vector(), Vec3::new(2.0, 3.0, 0.0));
    }

    #[test]
    fn contains_is_inclusive() {
        let b = Box3::new(Vec3::ZERO, Vec3::new(2.0, 2.0, 0.0));
        assert!(b.contains_xy(Vec3::new(2.0, 2.0, 5.0)));
        assert!(!b.contains_xy(Vec3::new(2.1, 2.0, 0.0)));
    }

    #[test]
    fn contains_handles_unordered_corners() {
        let b = Box3::new(Vec3::new(2.0, 2.0, 0.0), Vec3::ZERO);
        assert!(b.contains_xy(Vec3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn sphere_overlap() {
        let b = Box3::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 0.0));

        // Center inside.
        assert!(b.touches_sphere_xy(Vec3::new(5.0, 5.0, 0.0), 0.1));
        // Touching from outside.
        assert!(b.touches_sphere_xy(Vec3::new(12.0, 5.0, 0.0), 2.0));
        // Clear miss.
        assert!(!b.touches_sphere_xy(Vec3::new(15.0, 5.0, 0.0), 2.0));
        // Corner case: diagonal distance matters, not per-axis distance.
        assert!(!b.touches_sphere_xy(Vec3::new(12.0, 12.0, 0.0), 2.0));
    }
}
