// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The recalc loop: invalidation, rebuild, and composition.

use hashbrown::HashSet;
use kurbo::Point;
use ridgeline_canvas::CanvasHost;
use ridgeline_geom::{Box3, Vec3};
use ridgeline_map::{NodeRef, Result, TypeScale};
use ridgeline_raster::{FocusTile, MegaKey};
use tracing::trace;

use crate::context::{Label, RenderContext};

/// One slice of a draw pass: a layer, optionally narrowed to a scale.
struct Filter {
    layer: String,
    scale: Option<TypeScale>,
}

impl RenderContext {
    /// The recalc tick: applies a pending zoom change, then rebuilds
    /// whatever the queues demand.
    pub fn recalc_tick(&mut self, host: &mut dyn CanvasHost) -> Result<()> {
        self.apply_requested_zoom()?;
        if self.queues.borrow().is_empty() {
            return Ok(());
        }
        self.recalculate(host)
    }

    /// The engine's central routine.
    ///
    /// 1. Collects the object roots whose renders are invalidated and
    ///    evicts them, together with every megatile they appear in; all
    ///    nodes from those megatiles join the redraw set so overlap
    ///    ordering survives.
    /// 2. When the viewport is dirty, adds every visible object not yet
    ///    composited at this zoom.
    /// 3. Draws in Z-ordered filter passes (terrain before explicit
    ///    within the area-mode layer), compositing layer records in
    ///    ascending record Z and smoothing each pass's accumulated focus
    ///    tiles.
    /// 4. Runs a second pass over untouched cohabitants of the megatiles
    ///    that received content.
    /// 5. Re-derives label anchors, clamped to the screen box.
    fn recalculate(&mut self, host: &mut dyn CanvasHost) -> Result<()> {
        let zoom = self.zoom();
        let (updated, removed, translated, selected, viewport) = {
            let mut queues = self.queues.borrow_mut();
            (
                std::mem::take(&mut queues.updated),
                std::mem::take(&mut queues.removed),
                std::mem::take(&mut queues.translated),
                std::mem::take(&mut queues.selected),
                std::mem::replace(&mut queues.viewport, false),
            )
        };

        // Step 1: eviction.
        let mut invalidated: Vec<NodeRef> = Vec::new();
        for node in updated
            .into_iter()
            .chain(removed)
            .chain(translated)
            .chain(selected)
        {
            let root = self.object_root(node)?;
            if !invalidated.contains(&root) {
                invalidated.push(root);
            }
        }

        let mut redraw: Vec<NodeRef> = Vec::new();
        let mut queued: HashSet<NodeRef> = HashSet::new();
        for &root in &invalidated {
            self.renders.evict(host, root);
            for displaced in self.megatiles.evict_node(host, root) {
                if queued.insert(displaced) {
                    redraw.push(displaced);
                }
            }
            if queued.insert(root) {
                redraw.push(root);
            }
        }

        // Step 2: undrawn visible objects.
        if viewport {
            let screen = self.screen_rect_absolute();
            let area = Box3::new(
                Vec3::new(
                    self.pixels_to_units(screen.x0),
                    self.pixels_to_units(screen.y0),
                    0.0,
                ),
                Vec3::new(
                    self.pixels_to_units(screen.x1),
                    self.pixels_to_units(screen.y1),
                    0.0,
                ),
            );
            let min_radius = self.pixels_to_units(1.0);
            for node in self.mapper.object_nodes_touching_area(area, min_radius)? {
                let drawn_here = self
                    .megatiles
                    .megatiles_of(node)
                    .iter()
                    .any(|key| key.zoom == zoom.level());
                if !drawn_here && queued.insert(node) {
                    redraw.push(node);
                }
            }
        }

        if redraw.is_empty() {
            self.want_redraw = true;
            return Ok(());
        }
        trace!(nodes = redraw.len(), "recalculating");

        // Step 3: Z-ordered filter passes.
        let filters: Vec<Filter> = {
            let mut filters = Vec::new();
            for layer in self.mapper.layers().z_sorted() {
                if layer.draw_mode() == ridgeline_map::DrawMode::Area {
                    filters.push(Filter {
                        layer: layer.id().to_owned(),
                        scale: Some(TypeScale::Terrain),
                    });
                    filters.push(Filter {
                        layer: layer.id().to_owned(),
                        scale: Some(TypeScale::Explicit),
                    });
                } else {
                    filters.push(Filter {
                        layer: layer.id().to_owned(),
                        scale: None,
                    });
                }
            }
            filters
        };

        let mut touched: HashSet<MegaKey> = HashSet::new();
        let mut drawn: HashSet<NodeRef> = HashSet::new();
        for filter in &filters {
            let focus = self.draw_filter_pass(host, filter, &redraw, &mut touched, &mut drawn)?;
            let focus: Vec<FocusTile> = focus
                .into_iter()
                .filter(|tile| touched.contains(&MegaKey::containing(zoom.level(), tile.point)))
                .collect();
            let active = self.active.clone();
            let hover = self.hover.clone();
            self.megatiles
                .smooth_focus_tiles(host, zoom.level(), &focus, |node| {
                    active.has_node(node) || hover.has_node(node)
                });
        }

        // Step 4: cohabitants of megatiles that received new content.
        let mut second: Vec<NodeRef> = Vec::new();
        for &key in &touched {
            if let Some(tile) = self.megatiles.get(key) {
                for &node in tile.nodes() {
                    if !drawn.contains(&node) && !second.contains(&node) {
                        second.push(node);
                    }
                }
            }
        }
        if !second.is_empty() {
            for filter in &filters {
                let _ = self.draw_filter_pass(host, filter, &second, &mut touched, &mut drawn)?;
            }
        }

        // Step 5: labels.
        self.rebuild_labels(host)?;

        self.want_redraw = true;
        Ok(())
    }

    /// Draws every redraw-set node matching `filter`, in ascending record
    /// Z. Returns the pass's accumulated focus tiles.
    fn draw_filter_pass(
        &mut self,
        host: &mut dyn CanvasHost,
        filter: &Filter,
        nodes: &[NodeRef],
        touched: &mut HashSet<MegaKey>,
        drawn: &mut HashSet<NodeRef>,
    ) -> Result<Vec<FocusTile>> {
        let zoom = self.zoom();

        let mut records: Vec<(f64, NodeRef, usize)> = Vec::new();
        for &node in nodes {
            if !self.mapper.node_valid(node)? {
                continue;
            }
            if self.mapper.layer_key(node)? != filter.layer {
                continue;
            }
            if let Some(required) = filter.scale {
                let scale = self.mapper.node_type(node)?.map(|t| t.scale());
                if scale != Some(required) {
                    continue;
                }
            }
            // A failing render is contained: the node stays undrawn and
            // the rest of the frame proceeds.
            let render = match self
                .renders
                .get_or_build(&mut self.mapper, host, &mut self.fills, zoom, node)
            {
                Ok(Some(render)) => render,
                Ok(None) => continue,
                Err(error) => {
                    tracing::warn!(?node, %error, "node render failed");
                    continue;
                }
            };
            for (index, layer) in render.layers.iter().enumerate() {
                records.push((layer.z, node, index));
            }
        }
        records.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut focus = Vec::new();
        for (_, node, index) in records {
            let selected = self.active.has_node(node) || self.hover.has_node(node);
            let Ok(Some(render)) =
                self.renders
                    .get_or_build(&mut self.mapper, host, &mut self.fills, zoom, node)
            else {
                continue;
            };
            let layer = &mut render.layers[index];
            focus.extend(layer.focus_tiles.values().cloned());
            let keys = self
                .megatiles
                .composite_layer(host, zoom.level(), node, layer, selected);
            touched.extend(keys);
            drawn.insert(node);
        }
        Ok(focus)
    }

    /// Records each drawn node's label anchor: the clamped-to-screen
    /// average of its parts' positions, with the font size following the
    /// pixel radius up to the cap.
    fn rebuild_labels(&mut self, host: &mut dyn CanvasHost) -> Result<()> {
        let zoom = self.zoom();
        let screen = self.screen_rect_absolute();

        let mut nodes: Vec<NodeRef> = Vec::new();
        for key in self.megatiles.keys() {
            if key.zoom != zoom.level() {
                continue;
            }
            if let Some(tile) = self.megatiles.get(key) {
                for &node in tile.nodes() {
                    if !nodes.contains(&node) {
                        nodes.push(node);
                    }
                }
            }
        }

        self.labels.clear();
        for node in nodes {
            if !self.mapper.node_valid(node)? {
                continue;
            }
            let Ok(Some(render)) =
                self.renders
                    .get_or_build(&mut self.mapper, host, &mut self.fills, zoom, node)
            else {
                continue;
            };
            let mut sum = Point::ZERO;
            let mut count = 0.0;
            for layer in &render.layers {
                for part in &layer.parts {
                    sum.x += part.point.x;
                    sum.y += part.point.y;
                    count += 1.0;
                }
            }
            if count == 0.0 {
                continue;
            }
            let anchor_absolute = Point::new(
                (sum.x / count).clamp(screen.x0, screen.x1),
                (sum.y / count).clamp(screen.y0, screen.y1),
            );
            let anchor = Point::new(
                anchor_absolute.x - self.scroll.x,
                anchor_absolute.y - self.scroll.y,
            );
            let radius_px = self.units_to_pixels(self.mapper.radius(node)?);
            let size = radius_px.min(self.config.label_size_cap);
            self.labels.insert(node, Label { anchor, size });
        }
        Ok(())
    }
}
