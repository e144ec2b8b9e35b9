// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Brushes: the strategy objects behind the pointer.
//!
//! A brush owns its own small state (type list and index for adding,
//! size for everything) and turns a button press into a
//! [`DragEvent`](crate::DragEvent), or into an immediate effect for the
//! distance pegs. Brushes share one contract: activation, a drawn
//! cursor, type cycling, and size stepping.

use kurbo::Point;
use ridgeline_canvas::{CanvasHost, CanvasId, DrawOp};
use ridgeline_map::{Mapper, NodeRole, Result, units_to_meters};

use crate::config::ViewConfig;
use crate::context::RenderContext;
use crate::drag::{DragEvent, DrawKind};
use crate::input::Modifiers;
use crate::selection::Selection;

/// The add brush: stamps terrain or markers of the selected type.
#[derive(Clone, Debug)]
pub struct AddBrush {
    /// Type keys available on the current layer.
    type_keys: Vec<String>,
    /// Index of the selected type.
    index: usize,
    /// Brush size step.
    size: u32,
}

/// The delete brush: erases drawn leaves, or whole objects with Shift.
#[derive(Clone, Debug)]
pub struct DeleteBrush {
    size: u32,
}

/// The select brush: picks and drags selections.
#[derive(Clone, Debug)]
pub struct SelectBrush {
    size: u32,
}

/// The active editing tool.
#[derive(Clone, Debug)]
pub enum Brush {
    /// Stamp nodes of the selected type.
    Add(AddBrush),
    /// Erase nodes.
    Delete(DeleteBrush),
    /// Select and move.
    Select(SelectBrush),
    /// Store distance peg 1 or 2 (zero-indexed).
    DistancePeg(u8),
}

impl Brush {
    /// Creates an add brush with the type list for `layer`.
    #[must_use]
    pub fn add(mapper: &Mapper, layer: &str) -> Self {
        Self::Add(AddBrush {
            type_keys: mapper
                .node_types()
                .for_layer(layer)
                .iter()
                .map(|node_type| node_type.id().to_owned())
                .collect(),
            index: 0,
            size: 1,
        })
    }

    /// Creates a delete brush.
    #[must_use]
    pub fn delete() -> Self {
        Self::Delete(DeleteBrush { size: 1 })
    }

    /// Creates a select brush.
    #[must_use]
    pub fn select() -> Self {
        Self::Select(SelectBrush { size: 1 })
    }

    /// Creates a distance-peg brush for peg `index` (0 or 1).
    #[must_use]
    pub fn distance_peg(index: u8) -> Self {
        Self::DistancePeg(index)
    }

    /// Short human description shown next to the cursor.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Add(add) => match add.type_keys.get(add.index) {
                Some(key) => format!("Add {key}"),
                None => "Add".into(),
            },
            Self::Delete(_) => "Delete".into(),
            Self::Select(_) => "Select".into(),
            Self::DistancePeg(index) => format!("Distance peg {}", index + 1),
        }
    }

    /// Brush size step (1..=20).
    #[must_use]
    pub fn size(&self) -> u32 {
        match self {
            Self::Add(add) => add.size,
            Self::Delete(delete) => delete.size,
            Self::Select(select) => select.size,
            Self::DistancePeg(_) => 1,
        }
    }

    /// Brush radius in pixels.
    #[must_use]
    pub fn radius(&self, config: &ViewConfig) -> f64 {
        f64::from(self.size()) * config.brush_pixels_per_size
    }

    /// Brush radius in meters at the context's zoom.
    #[must_use]
    pub fn size_in_meters(&self, ctx: &RenderContext) -> f64 {
        units_to_meters(ctx.pixels_to_units(self.radius(ctx.config())))
    }

    /// The selected type key, for brushes that stamp one.
    #[must_use]
    pub fn type_key(&self) -> Option<&str> {
        match self {
            Self::Add(add) => add.type_keys.get(add.index).map(String::as_str),
            _ => None,
        }
    }

    /// Cycles to the next brush type.
    pub fn increment(&mut self, _ctx: &RenderContext) {
        if let Self::Add(add) = self
            && !add.type_keys.is_empty()
        {
            add.index = (add.index + 1) % add.type_keys.len();
        }
    }

    /// Cycles to the previous brush type.
    pub fn decrement(&mut self, _ctx: &RenderContext) {
        if let Self::Add(add) = self
            && !add.type_keys.is_empty()
        {
            add.index = (add.index + add.type_keys.len() - 1) % add.type_keys.len();
        }
    }

    /// Grows the brush one size step.
    pub fn enlarge(&mut self, min: u32, max: u32) {
        self.set_size(self.size().saturating_add(1), min, max);
    }

    /// Shrinks the brush one size step.
    pub fn shrink(&mut self, min: u32, max: u32) {
        self.set_size(self.size().saturating_sub(1), min, max);
    }

    fn set_size(&mut self, size: u32, min: u32, max: u32) {
        let size = size.clamp(min, max);
        match self {
            Self::Add(add) => add.size = size,
            Self::Delete(delete) => delete.size = size,
            Self::Select(select) => select.size = size,
            Self::DistancePeg(_) => {}
        }
    }

    /// Re-derives layer-dependent state after a layer change.
    pub fn signal_layer_change(&mut self, ctx: &RenderContext) {
        if let Self::Add(add) = self {
            add.type_keys = ctx
                .mapper()
                .node_types()
                .for_layer(ctx.current_layer())
                .iter()
                .map(|node_type| node_type.id().to_owned())
                .collect();
            add.index = 0;
        }
    }

    /// Draws the brush cursor: a white circle with its description.
    pub fn draw(&self, host: &mut dyn CanvasHost, target: CanvasId, position: Point, ctx: &RenderContext) {
        use peniko::Color;

        let radius = self.radius(ctx.config());
        host.draw(
            target,
            DrawOp::StrokeArc {
                center: position,
                radius,
                start_angle: 0.0,
                end_angle: core::f64::consts::TAU,
                color: Color::WHITE,
                width: 1.0,
            },
        );
        let label = format!("{} ({:.0}m)", self.description(), self.size_in_meters(ctx));
        host.draw(
            target,
            DrawOp::FillText {
                at: Point::new(position.x + radius + 4.0, position.y),
                size: 12.0,
                text: label,
                color: Color::WHITE,
            },
        );
    }
}

impl RenderContext {
    /// Activates the current brush at `point`, producing a drag for the
    /// brushes that follow the pointer.
    pub(crate) fn activate_brush(
        &mut self,
        point: Point,
        modifiers: Modifiers,
    ) -> Result<Option<DragEvent>> {
        match self.brush.clone() {
            Brush::Add(add) => self.activate_add(&add, point),
            Brush::Delete(delete) => {
                let radius = f64::from(delete.size) * self.config.brush_pixels_per_size;
                Ok(Some(DragEvent::draw(
                    DrawKind::Delete {
                        layer: self.current_layer().to_owned(),
                        radius,
                        roots: modifiers.shift,
                    },
                    point,
                )))
            }
            Brush::Select(_) => self.activate_select(point, modifiers),
            Brush::DistancePeg(index) => {
                self.pegs[usize::from(index)] = Some(self.canvas_point_to_map(point));
                self.want_redraw = true;
                Ok(None)
            }
        }
    }

    fn activate_add(&mut self, add: &AddBrush, point: Point) -> Result<Option<DragEvent>> {
        let Some(type_key) = add.type_keys.get(add.index).cloned() else {
            return Ok(None);
        };
        let layer = self.current_layer().to_owned();
        let radius = f64::from(add.size) * self.config.brush_pixels_per_size;

        // Reuse the hovered object when it stamps the same type;
        // otherwise open a fresh one under the cursor.
        let mut parent = None;
        if let Some(part) = self.drawn_part_at_canvas_point(point, &layer) {
            let root = self.object_root(part.node)?;
            if self.mapper.type_key(root)?.as_deref() == Some(type_key.as_str()) {
                parent = Some(root);
            }
        }
        let parent = match parent {
            Some(parent) => parent,
            None => self.mapper.insert_node(
                self.canvas_point_to_map(point),
                NodeRole::Object,
                ridgeline_map::InsertNodeOptions {
                    parent: None,
                    type_key: type_key.clone(),
                    radius: 0.0,
                    layer: Some(layer.clone()),
                },
            )?,
        };

        Ok(Some(DragEvent::draw(
            DrawKind::Add {
                parent,
                type_key,
                layer,
                radius,
            },
            point,
        )))
    }

    fn activate_select(
        &mut self,
        point: Point,
        modifiers: Modifiers,
    ) -> Result<Option<DragEvent>> {
        let hit = self.drawn_part_at_canvas_point(point, &self.current_layer().to_owned());
        let Some(part) = hit else {
            if !modifiers.ctrl {
                self.replace_active_selection(Selection::new())?;
            }
            return Ok(None);
        };

        if self.active.has_node(part.node) {
            // Drag the whole objects the selection belongs to.
            let mut roots = Vec::new();
            for &origin in self.active.origins().to_vec().iter() {
                let root = self.object_root(origin)?;
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
            return Ok(Some(DragEvent::translate(roots, point)));
        }

        let picked = Selection::from_origins(&mut self.mapper, &[part.node])?;
        if modifiers.ctrl {
            let mut joined = self.active.clone();
            joined.join_with(&picked);
            self.replace_active_selection(joined)?;
        } else {
            self.replace_active_selection(picked)?;
        }
        Ok(None)
    }

    fn replace_active_selection(&mut self, selection: Selection) -> Result<()> {
        let mut roots = Vec::new();
        for node in self
            .active
            .origins()
            .iter()
            .chain(selection.origins().iter())
            .copied()
            .collect::<Vec<_>>()
        {
            let root = self.object_root(node)?;
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        self.active = selection;
        self.queues.borrow_mut().selected.extend(roots);
        self.want_redraw = true;
        Ok(())
    }

    /// Collects the distinct drawn nodes whose parts lie within
    /// `radius_px` of a canvas point on `layer`.
    pub(crate) fn nodes_within_circle(
        &mut self,
        point: Point,
        radius_px: f64,
        layer: &str,
    ) -> Result<Vec<ridgeline_map::NodeRef>> {
        let absolute = self.absolute_point(point);
        let probe = kurbo::Rect::new(
            absolute.x - radius_px,
            absolute.y - radius_px,
            absolute.x + radius_px,
            absolute.y + radius_px,
        );
        let mut nodes = Vec::new();
        for key in ridgeline_raster::MegaKey::covering(self.zoom().level(), probe) {
            let Some(tile) = self.megatiles.get(key) else {
                continue;
            };
            for part in tile.parts() {
                if part.layer != layer {
                    continue;
                }
                let dx = part.point.x - absolute.x;
                let dy = part.point.y - absolute.y;
                if dx.hypot(dy) < radius_px && !nodes.contains(&part.node) {
                    nodes.push(part.node);
                }
            }
        }
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridgeline_store::MemoryStore;

    fn mapper() -> Mapper {
        Mapper::new(Box::new(MemoryStore::new()))
    }

    #[test]
    fn add_brush_lists_types_for_the_layer() {
        let mapper = mapper();
        let brush = Brush::add(&mapper, "annotation");
        assert_eq!(brush.type_key(), Some("route"));
        assert_eq!(brush.description(), "Add route");
    }

    #[test]
    fn type_cycling_wraps_both_ways() {
        let mapper = mapper();
        let mut host = ridgeline_canvas::RecordHost::new();
        let display = host.create_canvas(100, 100);
        let ctx = RenderContext::new(mapper, display, 100.0, 100.0);

        let mut brush = Brush::add(ctx.mapper(), "annotation");
        brush.increment(&ctx);
        assert_eq!(brush.type_key(), Some("note"));
        brush.increment(&ctx);
        assert_eq!(brush.type_key(), Some("route"));
        brush.decrement(&ctx);
        assert_eq!(brush.type_key(), Some("note"));
    }

    #[test]
    fn size_steps_clamp_to_bounds() {
        let mapper = mapper();
        let mut brush = Brush::add(&mapper, "geographical");
        brush.shrink(1, 20);
        assert_eq!(brush.size(), 1);
        for _ in 0..30 {
            brush.enlarge(1, 20);
        }
        assert_eq!(brush.size(), 20);
    }

    #[test]
    fn radius_scales_with_size() {
        let mapper = mapper();
        let config = ViewConfig::default();
        let mut brush = Brush::add(&mapper, "geographical");
        assert_eq!(brush.radius(&config), 15.0);
        brush.enlarge(1, 20);
        assert_eq!(brush.radius(&config), 30.0);
    }
}
