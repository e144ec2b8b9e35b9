// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer drags.
//!
//! A drag is born from a button press (usually by the active brush),
//! fed every pointer move through [`DragEvent::next`], and finished with
//! [`DragEvent::end`] or reversed with [`DragEvent::cancel`]. Drags that
//! mutate the map accumulate the inverses of the actions they performed;
//! ending pushes the combined inverse onto the undo stack, cancelling
//! replays it immediately.

use kurbo::{Point, Vec2};
use ridgeline_geom::{Path, Vec3};
use ridgeline_map::{NodeRef, Result};

use crate::action::{Action, DrawPath};
use crate::context::RenderContext;

/// What a draw drag stamps per segment.
#[derive(Clone, Debug)]
pub enum DrawKind {
    /// Add-brush stroke: draw-path placements under one parent.
    Add {
        /// The object node placements go under.
        parent: NodeRef,
        /// Node type being stamped.
        type_key: String,
        /// Layer being drawn on.
        layer: String,
        /// Draw radius in pixels.
        radius: f64,
    },
    /// Delete-brush stroke: remove drawn leaves (or whole objects when
    /// `roots` is set) under the cursor.
    Delete {
        /// Layer being erased.
        layer: String,
        /// Erase radius in pixels.
        radius: f64,
        /// Remove hovered object roots instead of leaves.
        roots: bool,
    },
}

/// An in-flight pointer drag.
#[derive(Clone, Debug)]
pub enum DragEvent {
    /// Right-drag panning; updates scroll on every move.
    Pan {
        /// Previous pointer position.
        last: Point,
    },
    /// Select-brush translation of the active selection's origins.
    Translate {
        /// The nodes being moved.
        origins: Vec<NodeRef>,
        /// Previous pointer position.
        last: Point,
        /// The stroke so far, in canvas pixels.
        path: Path,
        /// Inverses of the per-frame translate actions.
        inverses: Vec<Action>,
    },
    /// Brush stroke (add or delete).
    Draw {
        /// What each segment triggers.
        kind: DrawKind,
        /// The stroke so far, in canvas pixels.
        path: Path,
        /// Inverses of the per-segment actions.
        inverses: Vec<Action>,
    },
}

impl DragEvent {
    /// Creates a pan drag.
    #[must_use]
    pub fn pan(start: Point) -> Self {
        Self::Pan { last: start }
    }

    /// Creates a translate drag over `origins`.
    #[must_use]
    pub fn translate(origins: Vec<NodeRef>, start: Point) -> Self {
        Self::Translate {
            origins,
            last: start,
            path: Path::new(Vec3::new(start.x, start.y, 0.0)),
            inverses: Vec::new(),
        }
    }

    /// Creates a draw drag.
    #[must_use]
    pub fn draw(kind: DrawKind, start: Point) -> Self {
        Self::Draw {
            kind,
            path: Path::new(Vec3::new(start.x, start.y, 0.0)),
            inverses: Vec::new(),
        }
    }

    /// Feeds the drag a new pointer position.
    pub fn next(&mut self, ctx: &mut RenderContext, point: Point) -> Result<()> {
        match self {
            Self::Pan { last } => {
                let delta = Vec2::new(last.x - point.x, last.y - point.y);
                *last = point;
                ctx.scroll_by(delta);
                Ok(())
            }
            Self::Translate {
                origins,
                last,
                path,
                inverses,
            } => {
                let offset = Vec3::new(
                    ctx.pixels_to_units(point.x - last.x),
                    ctx.pixels_to_units(point.y - last.y),
                    0.0,
                );
                *last = point;
                path.push_vertex(Vec3::new(point.x, point.y, 0.0));
                if offset == Vec3::ZERO {
                    return Ok(());
                }
                for &origin in origins.iter() {
                    let inverse = Action::Translate {
                        node: origin,
                        offset,
                    }
                    .perform(ctx)?;
                    inverses.push(inverse);
                }
                Ok(())
            }
            Self::Draw {
                kind,
                path,
                inverses,
            } => {
                let before = path.line_count();
                path.push_vertex(Vec3::new(point.x, point.y, 0.0));
                if path.line_count() == before {
                    return Ok(());
                }
                if let Some(inverse) = trigger_segment(ctx, kind, path, false)? {
                    inverses.push(inverse);
                }
                Ok(())
            }
        }
    }

    /// Finishes the drag, pushing its combined inverse onto undo.
    pub fn end(self, ctx: &mut RenderContext, point: Point) -> Result<()> {
        match self {
            Self::Pan { .. } => Ok(()),
            Self::Translate { mut inverses, .. } => {
                inverses.reverse();
                ctx.push_undo(Action::Bulk(inverses));
                Ok(())
            }
            Self::Draw {
                kind,
                mut path,
                mut inverses,
            } => {
                let before = path.line_count();
                path.push_vertex(Vec3::new(point.x, point.y, 0.0));
                let grew = path.line_count() > before;
                if grew {
                    if let Some(inverse) = trigger_segment(ctx, &kind, &path, true)? {
                        inverses.push(inverse);
                    }
                } else if let DrawKind::Add { parent, .. } = &kind
                    && !inverses.is_empty()
                {
                    // The stroke already ended on this point; still run
                    // the completion cleanup.
                    inverses.push(Action::NodeCleanup { parent: *parent }.perform(ctx)?);
                }
                inverses.reverse();
                ctx.push_undo(Action::Bulk(inverses));
                Ok(())
            }
        }
    }

    /// Reverses everything the drag has done so far.
    pub fn cancel(&mut self, ctx: &mut RenderContext) -> Result<()> {
        match self {
            Self::Pan { .. } => Ok(()),
            Self::Translate { inverses, .. } | Self::Draw { inverses, .. } => {
                for inverse in inverses.drain(..).rev() {
                    inverse.perform(ctx)?;
                }
                Ok(())
            }
        }
    }
}

/// Runs the brush trigger for the stroke's most recent segment.
fn trigger_segment(
    ctx: &mut RenderContext,
    kind: &DrawKind,
    path: &Path,
    complete: bool,
) -> Result<Option<Action>> {
    match kind {
        DrawKind::Add {
            parent,
            type_key,
            layer,
            radius,
        } => {
            let action = Action::DrawPath(DrawPath {
                path: path.last_line_path(),
                radius: *radius,
                type_key: type_key.clone(),
                parent: *parent,
                layer: layer.clone(),
                complete,
            });
            if action.empty() {
                return Ok(None);
            }
            Ok(Some(action.perform(ctx)?))
        }
        DrawKind::Delete {
            layer,
            radius,
            roots,
        } => {
            let point = path.last_vertex();
            let canvas = Point::new(point.x, point.y);
            let targets = if *roots {
                match ctx.drawn_part_at_canvas_point(canvas, layer) {
                    Some(part) => vec![ctx.object_root(part.node)?],
                    None => Vec::new(),
                }
            } else {
                let mut leaves = Vec::new();
                for node in ctx.nodes_within_circle(canvas, *radius, layer)? {
                    if !ctx.mapper.node_has_children(node)? {
                        leaves.push(node);
                    }
                }
                leaves
            };
            let action = Action::Remove { nodes: targets };
            if action.empty() {
                return Ok(None);
            }
            Ok(Some(action.perform(ctx)?))
        }
    }
}
