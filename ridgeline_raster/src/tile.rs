// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile constants and the compass rose.

/// The rasterizer's quantum: tiles are 16×16 pixels.
pub const TILE_SIZE: u32 = 16;

/// Megatiles are 512×512 screen-aligned pixels.
pub const MEGA_TILE_SIZE: u32 = 512;

/// Upper bound on the side of a render-layer canvas.
pub const MINI_CANVAS_LIMIT: u32 = 2048;

/// Returns the tile coordinates containing an absolute pixel position.
#[must_use]
pub fn tile_of(x: f64, y: f64) -> (i64, i64) {
    let size = f64::from(TILE_SIZE);
    ((x / size).floor() as i64, (y / size).floor() as i64)
}

/// The eight compass directions used by focus-tile smoothing.
///
/// Each direction carries its integer tile offset, its unit vector (screen
/// convention, Y down, so north is negative Y), and its atan2 angle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Compass {
    /// Up.
    North,
    /// Down.
    South,
    /// Right.
    East,
    /// Left.
    West,
    /// Up-right.
    NorthEast,
    /// Up-left.
    NorthWest,
    /// Down-right.
    SouthEast,
    /// Down-left.
    SouthWest,
}

impl Compass {
    /// All eight directions, cardinals first.
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::NorthEast,
        Self::NorthWest,
        Self::SouthEast,
        Self::SouthWest,
    ];

    /// The tile-grid offset of this direction.
    #[must_use]
    pub const fn offset(self) -> (i64, i64) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
            Self::NorthEast => (1, -1),
            Self::NorthWest => (-1, -1),
            Self::SouthEast => (1, 1),
            Self::SouthWest => (-1, 1),
        }
    }

    /// The normalized direction vector.
    #[must_use]
    pub fn vector(self) -> (f64, f64) {
        const DIAGONAL: f64 = core::f64::consts::FRAC_1_SQRT_2;
        match self {
            Self::North => (0.0, -1.0),
            Self::South => (0.0, 1.0),
            Self::East => (1.0, 0.0),
            Self::West => (-1.0, 0.0),
            Self::NorthEast => (DIAGONAL, -DIAGONAL),
            Self::NorthWest => (-DIAGONAL, -DIAGONAL),
            Self::SouthEast => (DIAGONAL, DIAGONAL),
            Self::SouthWest => (-DIAGONAL, DIAGONAL),
        }
    }

    /// The atan2 angle of [`Compass::vector`], in radians.
    #[must_use]
    pub fn angle(self) -> f64 {
        let (x, y) = self.vector();
        y.atan2(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_of_floors() {
        assert_eq!(tile_of(0.0, 0.0), (0, 0));
        assert_eq!(tile_of(15.9, 15.9), (0, 0));
        assert_eq!(tile_of(16.0, 31.9), (1, 1));
        assert_eq!(tile_of(-0.1, -16.0), (-1, -1));
    }

    #[test]
    fn vectors_are_unit_length() {
        for direction in Compass::ALL {
            let (x, y) = direction.vector();
            assert!((x.hypot(y) - 1.0).abs() < 1e-12, "{direction:?}");
        }
    }

    #[test]
    fn offsets_match_vectors() {
        for direction in Compass::ALL {
            let (dx, dy) = direction.offset();
            let (vx, vy) = direction.vector();
            assert_eq!(dx.signum(), vx.signum() as i64, "{direction:?}");
            assert_eq!(dy.signum(), vy.signum() as i64, "{direction:?}");
        }
    }

    #[test]
    fn angles_follow_atan2() {
        assert_eq!(Compass::East.angle(), 0.0);
        assert!((Compass::South.angle() - core::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((Compass::North.angle() + core::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
