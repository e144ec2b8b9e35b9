// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View configuration.

/// Tunables of the render context.
///
/// The defaults match the editor's documented behavior; embedders mostly
/// override the loop cadences when their frame source is unusual.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewConfig {
    /// Zoom level applied at startup and on view reset.
    pub default_zoom: u32,
    /// Redraw loop target, in frames per second.
    pub redraw_hz: f64,
    /// Recalc loop target, in passes per second.
    pub recalc_hz: f64,
    /// Hover-recheck loop target, in passes per second.
    pub recheck_hz: f64,
    /// Smallest brush size.
    pub brush_size_min: u32,
    /// Largest brush size.
    pub brush_size_max: u32,
    /// Brush radius per size step, in pixels.
    pub brush_pixels_per_size: f64,
    /// Label font size cap, in pixels.
    pub label_size_cap: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_zoom: 5,
            redraw_hz: 60.0,
            recalc_hz: 10.0,
            recheck_hz: 10.0,
            brush_size_min: 1,
            brush_size_max: 20,
            brush_pixels_per_size: 15.0,
            label_size_cap: 24.0,
        }
    }
}
