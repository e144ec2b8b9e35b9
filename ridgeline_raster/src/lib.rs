// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ridgeline Raster: the tile-based multi-resolution rasterizer.
//!
//! Rendering happens in two cached stages:
//!
//! 1. [`NodeRender`]: per (object node, zoom) rasterization. Each render
//!    is one or more tile-aligned layer records (canvases capped at
//!    2048², split by the children's altitude), carrying the hit-test
//!    [`Part`]s drawn into them and, for terrain, the [`FocusTile`]s on
//!    the outer arcs of the children.
//! 2. [`MegaTileCache`]: 512×512 screen-aligned composites keyed by
//!    `(zoom, x, y)`. Megatiles remember every node blitted into them
//!    (the reverse index drives invalidation), keep the ordered part list
//!    for hit testing, and cache part lookups at tile centers for the
//!    focus-tile smoothing pass.
//!
//! Fill patterns ([`FillCache`]) are keyed by `(type, background type)`
//! and live for the cache's lifetime; they are tile-resolution and shared
//! across zooms, so a zoom change only invalidates megatiles.
//!
//! The conversion between world units and screen pixels is [`Zoom`]'s
//! fixed nonlinearity; at the default zoom one pixel is one unit.

mod fill;
mod megatile;
mod render;
mod tile;
mod zoom;

pub use fill::FillCache;
pub use megatile::{MegaKey, MegaTile, MegaTileCache};
pub use render::{FocusTile, NodeRender, NodeRenderCache, Part, RenderLayer};
pub use tile::{Compass, MEGA_TILE_SIZE, MINI_CANVAS_LIMIT, TILE_SIZE, tile_of};
pub use zoom::Zoom;
