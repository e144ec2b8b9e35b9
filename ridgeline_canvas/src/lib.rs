// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ridgeline Canvas: the drawing contract between the rasterizer and its
//! host.
//!
//! The rasterizer never owns pixels. It asks the host for offscreen
//! canvases, repeating patterns built from those canvases, and decoded
//! bundled images, then drives drawing through plain‑old‑data operations:
//!
//! - **Resources**: opaque handles ([`CanvasId`], [`PatternId`],
//!   [`ImageId`]) whose lifetimes the host manages through
//!   [`CanvasHost`].
//! - **Operations**: [`StateOp`] (alpha, composite mode, dash) and
//!   [`DrawOp`] (rects, arc wedges, lines, text, images), combined as
//!   [`CanvasOp`] and applied to a target canvas.
//! - **Blits**: canvas-to-canvas copies with source and destination
//!   rectangles, the primitive behind tile composition.
//!
//! A production host maps these onto a real 2D surface (web canvas, Skia,
//! a CPU rasterizer). [`RecordHost`] is the bundled reference
//! implementation: it rasterizes nothing and instead records every
//! operation with the state it ran under, which is what the test suites
//! assert against.
//!
//! Geometry at this boundary is strictly 2D and in pixels, so the types
//! are kurbo's; colors are peniko's.
//!
//! # Example
//!
//! ```rust
//! use kurbo::Rect;
//! use peniko::Color;
//! use ridgeline_canvas::{CanvasHost, DrawOp, Fill, RecordHost};
//!
//! let mut host = RecordHost::new();
//! let tile = host.create_canvas(16, 16);
//! host.draw(
//!     tile,
//!     DrawOp::FillRect {
//!         rect: Rect::new(0.0, 0.0, 16.0, 16.0),
//!         fill: Fill::Color(Color::from_rgba8(90, 181, 82, 255)),
//!     },
//! );
//! let pattern = host.create_pattern(tile);
//! assert_eq!(host.ops_for(tile).len(), 1);
//! assert_eq!(host.pattern_source(pattern), Some(tile));
//! ```

mod record;

pub use record::{Event, RecordHost, StateSnapshot};

use kurbo::{Point, Rect};
use peniko::Color;

/// Identifier for a canvas resource.
///
/// Stable for the lifetime of the canvas. The display surface is a canvas
/// like any other; the host decides which one is on screen.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CanvasId(pub u32);

/// Identifier for a repeating-pattern resource built from a canvas.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PatternId(pub u32);

/// Identifier for a decoded bundled image.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub u32);

/// Composite modes the rasterizer uses.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Composite {
    /// Normal painting.
    #[default]
    SourceOver,
    /// Paint only where the target already has content; used to darken
    /// selected tiles before composition.
    SourceAtop,
}

/// Fill source for filled shapes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Fill {
    /// A solid color.
    Color(Color),
    /// A repeating pattern anchored at the canvas origin.
    Pattern(PatternId),
}

/// Operations that mutate a canvas's drawing state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateOp {
    /// Set the global alpha applied to subsequent draws.
    SetAlpha(f64),
    /// Set the composite mode for subsequent draws.
    SetComposite(Composite),
    /// Set the line-dash pattern; an empty vector means solid.
    SetDash(Vec<f64>),
}

/// Operations that produce pixels on a canvas.
///
/// Coordinates are target-local pixels. Angles are radians in the atan2
/// convention.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Clear a rectangle to transparent; `None` clears the whole canvas.
    Clear {
        /// Rectangle to clear, or everything.
        rect: Option<Rect>,
    },
    /// Fill an axis-aligned rectangle.
    FillRect {
        /// Target rectangle.
        rect: Rect,
        /// Fill source.
        fill: Fill,
    },
    /// Stroke an axis-aligned rectangle.
    StrokeRect {
        /// Target rectangle.
        rect: Rect,
        /// Stroke color.
        color: Color,
        /// Stroke width in pixels.
        width: f64,
    },
    /// Fill a circular wedge. A sweep of a full turn fills a disk.
    FillWedge {
        /// Center of the disk.
        center: Point,
        /// Disk radius in pixels.
        radius: f64,
        /// Start angle in radians.
        start_angle: f64,
        /// End angle in radians.
        end_angle: f64,
        /// Fill source.
        fill: Fill,
    },
    /// Stroke a circular arc.
    StrokeArc {
        /// Center of the arc.
        center: Point,
        /// Arc radius in pixels.
        radius: f64,
        /// Start angle in radians.
        start_angle: f64,
        /// End angle in radians.
        end_angle: f64,
        /// Stroke color.
        color: Color,
        /// Stroke width in pixels.
        width: f64,
    },
    /// Stroke a line segment, honoring the current dash pattern.
    StrokeLine {
        /// Segment start.
        from: Point,
        /// Segment end.
        to: Point,
        /// Stroke color.
        color: Color,
        /// Stroke width in pixels.
        width: f64,
    },
    /// Draw text with its anchor at the baseline start.
    FillText {
        /// Baseline start position.
        at: Point,
        /// Font size in pixels.
        size: f64,
        /// The text to draw.
        text: String,
        /// Text color.
        color: Color,
    },
    /// Draw a bundled image into a destination rectangle, optionally
    /// sampling from a source rectangle in image pixels.
    DrawImage {
        /// Image resource.
        image: ImageId,
        /// Source rectangle in image pixels, or the full image.
        src: Option<Rect>,
        /// Destination rectangle in canvas pixels.
        dst: Rect,
    },
}

/// A state or draw operation, the unit the host consumes.
#[derive(Clone, Debug, PartialEq)]
pub enum CanvasOp {
    /// State-changing operation.
    State(StateOp),
    /// Pixel-producing operation.
    Draw(DrawOp),
}

/// The host surface contract.
///
/// One host owns all canvases, patterns, and images for a render context.
/// Drawing state (alpha, composite, dash) is tracked per canvas, the way a
/// 2D context would.
pub trait CanvasHost {
    /// Creates an offscreen canvas of the given pixel size.
    fn create_canvas(&mut self, width: u32, height: u32) -> CanvasId;

    /// Destroys a canvas. Patterns built from it keep their snapshot.
    fn destroy_canvas(&mut self, id: CanvasId);

    /// Returns the pixel size of a canvas.
    fn canvas_size(&self, id: CanvasId) -> (u32, u32);

    /// Builds a repeating pattern from the current contents of `source`.
    fn create_pattern(&mut self, source: CanvasId) -> PatternId;

    /// Looks up a bundled decoded image by key.
    fn image(&self, key: &str) -> Option<ImageId>;

    /// Returns the pixel size of an image.
    fn image_size(&self, id: ImageId) -> (u32, u32);

    /// Applies one operation to `target`.
    fn apply(&mut self, target: CanvasId, op: CanvasOp);

    /// Copies `src` from `source` into `dst` on `target`, honoring the
    /// target's alpha and composite state.
    fn blit(&mut self, target: CanvasId, source: CanvasId, src: Rect, dst: Rect);

    /// Measures the advance width of `text` at `size` pixels.
    fn measure_text(&self, text: &str, size: f64) -> f64;

    /// Applies a state operation. Equivalent to
    /// `self.apply(target, CanvasOp::State(op))`.
    fn state(&mut self, target: CanvasId, op: StateOp) {
        self.apply(target, CanvasOp::State(op));
    }

    /// Applies a draw operation. Equivalent to
    /// `self.apply(target, CanvasOp::Draw(op))`.
    fn draw(&mut self, target: CanvasId, op: DrawOp) {
        self.apply(target, CanvasOp::Draw(op));
    }

    /// Fills a full disk.
    fn fill_disk(&mut self, target: CanvasId, center: Point, radius: f64, fill: Fill) {
        self.draw(
            target,
            DrawOp::FillWedge {
                center,
                radius,
                start_angle: 0.0,
                end_angle: core::f64::consts::TAU,
                fill,
            },
        );
    }
}
