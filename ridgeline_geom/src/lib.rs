// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ridgeline Geom: world-space geometry primitives for the map core.
//!
//! The map world is 2.5D: X and Y position things on the plane, Z carries
//! altitude and stacking order. Kurbo covers the strictly 2D canvas side of
//! Ridgeline (points, rectangles, view transforms); this crate provides the
//! small set of 3D primitives the data model and rasterizer share:
//!
//! - [`Vec3`]: an immutable-style 3D vector with component-wise helpers.
//! - [`Line3`]: a segment between two [`Vec3`] endpoints, with a 2D
//!   segment-intersection test used by stroke self-checks.
//! - [`Box3`]: an axis-aligned box, the query shape for spatial lookups.
//! - [`Path`]: an ordered run of segments sharing an origin, produced by
//!   drag interactions and consumed by the draw-path machinery.
//!
//! All types are plain `Copy`/`Clone` data with value-returning operations;
//! nothing here touches I/O or the store.
//!
//! ## Minimal example
//!
//! ```rust
//! use ridgeline_geom::{Box3, Vec3};
//!
//! let center = Vec3::new(10.0, 20.0, 0.0);
//! let area = Box3::from_radius(center, 5.0);
//! assert!(area.touches_sphere_xy(Vec3::new(12.0, 20.0, 0.0), 1.0));
//! ```

mod box3;
mod line3;
mod path;
mod vec3;

pub use box3::Box3;
pub use line3::Line3;
pub use path::Path;
pub use vec3::Vec3;
