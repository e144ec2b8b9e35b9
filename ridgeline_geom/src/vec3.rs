// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 3D vector with immutable-style, value-returning operations.

use core::ops::{Add, Div, Mul, Neg, Sub};

/// A 3D vector in world units.
///
/// X and Y are map-plane coordinates; Z is altitude, which doubles as the
/// stacking key during rasterization. All operations return new values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component (altitude).
    pub z: f64,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Creates a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the Euclidean length.
    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Returns the squared length.
    ///
    /// Cheaper than [`Vec3::length`] when only comparisons are needed.
    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Returns this vector scaled to unit length.
    ///
    /// The zero vector normalizes to itself.
    #[must_use]
    pub fn normalize(self) -> Self {
        let length = self.length();
        if length == 0.0 { self } else { self / length }
    }

    /// Component-wise minimum of `self` and `other`.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Component-wise maximum of `self` and `other`.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }

    /// Rounds each component to the nearest integer.
    ///
    /// Rounding is `floor(c + 0.5)`, so exact halves round toward positive
    /// infinity on every component.
    #[must_use]
    pub fn round(self) -> Self {
        self.map(|c| (c + 0.5).floor())
    }

    /// Applies `f` to each component.
    #[must_use]
    pub fn map<F>(self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        Self::new(f(self.x), f(self.y), f(self.z))
    }

    /// Returns this vector with Z zeroed.
    ///
    /// Used wherever plane distances must ignore altitude.
    #[must_use]
    pub fn no_z(self) -> Self {
        Self::new(self.x, self.y, 0.0)
    }

    /// Distance to `other` in the XY plane, ignoring Z.
    #[must_use]
    pub fn distance_xy(self, other: Self) -> f64 {
        (other - self).no_z().length()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(b / 2.0, Vec3::new(2.0, 2.5, 3.0));
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
    }

    #[test]
    fn length() {
        assert_eq!(Vec3::new(3.0, 4.0, 0.0).length(), 5.0);
        assert_eq!(Vec3::new(3.0, 4.0, 0.0).length_squared(), 25.0);
        assert_eq!(Vec3::ZERO.length(), 0.0);
    }

    #[test]
    fn normalize_unit() {
        let v = Vec3::new(0.0, 10.0, 0.0).normalize();
        assert_eq!(v, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn normalize_zero_stays_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn min_max() {
        let a = Vec3::new(1.0, 5.0, 3.0);
        let b = Vec3::new(4.0, 2.0, 6.0);

        assert_eq!(a.min(b), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(a.max(b), Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn round_halves_up() {
        let v = Vec3::new(0.5, -0.5, 1.4).round();
        assert_eq!(v, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn map_each_component() {
        let v = Vec3::new(1.0, 2.0, 3.0).map(|c| c * c);
        assert_eq!(v, Vec3::new(1.0, 4.0, 9.0));
    }

    #[test]
    fn no_z_drops_altitude() {
        assert_eq!(Vec3::new(1.0, 2.0, 3.0).no_z(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn distance_xy_ignores_z() {
        let a = Vec3::new(0.0, 0.0, 10.0);
        let b = Vec3::new(3.0, 4.0, -10.0);
        assert_eq!(a.distance_xy(b), 5.0);
    }
}
