// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The redraw loop: megatile composition and screen overlays.

use kurbo::{Point, Rect};
use peniko::Color;
use ridgeline_canvas::{CanvasHost, DrawOp, Fill, StateOp};
use ridgeline_map::{Result, units_to_meters};
use ridgeline_raster::{MEGA_TILE_SIZE, MegaKey};

use crate::brush::Brush;
use crate::context::RenderContext;

/// Peg 1 dot color.
const PEG_ONE: Color = Color::from_rgba8(220, 60, 60, 255);
/// Peg 2 dot color.
const PEG_TWO: Color = Color::from_rgba8(60, 60, 220, 255);

impl RenderContext {
    /// The redraw tick: composites visible megatiles to the display and
    /// draws the overlays. Cheap when nothing changed.
    pub fn redraw_tick(&mut self, host: &mut dyn CanvasHost) -> Result<()> {
        if !self.want_redraw {
            return Ok(());
        }
        self.want_redraw = false;

        let display = self.display;
        host.draw(display, DrawOp::Clear { rect: None });

        // Megatiles visible in the absolute screen box.
        let screen = self.screen_rect_absolute();
        let side = f64::from(MEGA_TILE_SIZE);
        for key in MegaKey::covering(self.zoom().level(), screen) {
            let Some(tile) = self.megatiles.get(key) else {
                continue;
            };
            let rect = key.rect();
            host.blit(
                display,
                tile.canvas(),
                Rect::new(0.0, 0.0, side, side),
                Rect::new(
                    rect.x0 - self.scroll.x,
                    rect.y0 - self.scroll.y,
                    rect.x1 - self.scroll.x,
                    rect.y1 - self.scroll.y,
                ),
            );
        }

        self.draw_labels(host)?;
        if matches!(self.brush, Brush::DistancePeg(_)) {
            self.draw_pegs(host);
        }
        let brush = self.brush.clone();
        brush.draw(host, display, self.mouse, self);
        self.draw_help(host);
        self.draw_scale_bar(host);
        self.draw_version(host);
        if self.debug_overlay {
            self.draw_debug(host)?;
        }
        Ok(())
    }

    /// Draws node labels: full size on the current layer, half size on
    /// the others, slightly heavier when selected.
    fn draw_labels(&mut self, host: &mut dyn CanvasHost) -> Result<()> {
        let display = self.display;
        let labels: Vec<_> = self
            .labels
            .iter()
            .map(|(node, label)| (*node, label.clone()))
            .collect();
        for (node, label) in labels {
            let Some(name) = self.mapper.name(node)? else {
                continue;
            };
            let mut size = label.size;
            if self.mapper.layer_key(node)? != self.current_layer() {
                size /= 2.0;
            }
            if self.active.has_node(node) {
                size *= 1.2;
            }
            let width = host.measure_text(&name, size);
            host.draw(
                display,
                DrawOp::FillText {
                    at: Point::new(label.anchor.x - width / 2.0, label.anchor.y),
                    size,
                    text: name,
                    color: Color::WHITE,
                },
            );
        }
        Ok(())
    }

    /// Draws the distance pegs and their measured separation.
    fn draw_pegs(&mut self, host: &mut dyn CanvasHost) {
        let display = self.display;
        for (index, peg) in self.pegs.iter().enumerate() {
            let Some(point) = peg else { continue };
            let at = self.map_point_to_canvas(*point);
            host.draw(
                display,
                DrawOp::FillWedge {
                    center: at,
                    radius: 4.0,
                    start_angle: 0.0,
                    end_angle: core::f64::consts::TAU,
                    fill: Fill::Color(if index == 0 { PEG_ONE } else { PEG_TWO }),
                },
            );
        }

        if let [Some(first), Some(second)] = self.pegs {
            let from = self.map_point_to_canvas(first);
            let to = self.map_point_to_canvas(second);
            host.state(display, StateOp::SetDash(vec![4.0, 4.0]));
            host.draw(
                display,
                DrawOp::StrokeLine {
                    from,
                    to,
                    color: Color::WHITE,
                    width: 1.0,
                },
            );
            host.state(display, StateOp::SetDash(Vec::new()));

            let meters = units_to_meters((second - first).length());
            let kilometers = (meters / 1000.0).floor();
            host.draw(
                display,
                DrawOp::FillText {
                    at: Point::new(
                        (from.x + to.x) / 2.0,
                        (from.y + to.y) / 2.0 - 8.0,
                    ),
                    size: 12.0,
                    text: format!(
                        "Distance between markers: {meters:.0}m ({kilometers:.0}km)"
                    ),
                    color: Color::WHITE,
                },
            );
        }
    }

    /// Draws the keyboard help line.
    fn draw_help(&self, host: &mut dyn CanvasHost) {
        host.draw(
            self.display,
            DrawOp::FillText {
                at: Point::new(8.0, 16.0),
                size: 11.0,
                text: "a add  s select  d delete  1/2 pegs  l layer  q/w+wheel brush  ctrl+z undo"
                    .into(),
                color: Color::from_rgba8(255, 255, 255, 180),
            },
        );
    }

    /// Draws the scale bar: roughly a fifth of the screen, rounded to a
    /// power of ten meters, with six labeled ticks.
    fn draw_scale_bar(&self, host: &mut dyn CanvasHost) {
        let display = self.display;
        let target_meters = units_to_meters(self.pixels_to_units(self.width / 5.0));
        if target_meters <= 0.0 {
            return;
        }
        let bar_meters = 10.0_f64.powf(target_meters.log10().floor());
        let bar_pixels = self.units_to_pixels(ridgeline_map::meters_to_units(bar_meters));

        let origin = Point::new(10.0, self.height - 20.0);
        host.draw(
            display,
            DrawOp::StrokeLine {
                from: origin,
                to: Point::new(origin.x + bar_pixels, origin.y),
                color: Color::WHITE,
                width: 2.0,
            },
        );
        for tick in 0..6 {
            let fraction = f64::from(tick) / 5.0;
            let x = origin.x + bar_pixels * fraction;
            host.draw(
                display,
                DrawOp::StrokeLine {
                    from: Point::new(x, origin.y - 4.0),
                    to: Point::new(x, origin.y + 4.0),
                    color: Color::WHITE,
                    width: 1.0,
                },
            );
            host.draw(
                display,
                DrawOp::FillText {
                    at: Point::new(x, origin.y - 8.0),
                    size: 9.0,
                    text: format!("{:.0}m", bar_meters * fraction),
                    color: Color::WHITE,
                },
            );
        }
    }

    /// Draws the version badge.
    fn draw_version(&self, host: &mut dyn CanvasHost) {
        let text = concat!("ridgeline v", env!("CARGO_PKG_VERSION"));
        let width = host.measure_text(text, 10.0);
        host.draw(
            self.display,
            DrawOp::FillText {
                at: Point::new(self.width - width - 8.0, self.height - 8.0),
                size: 10.0,
                text: text.into(),
                color: Color::from_rgba8(255, 255, 255, 140),
            },
        );
    }

    /// Draws the debug overlay: node radii, graph edges, and the
    /// megatile grid.
    fn draw_debug(&mut self, host: &mut dyn CanvasHost) -> Result<()> {
        let display = self.display;
        let zoom = self.zoom();

        let mut nodes = Vec::new();
        for key in self.megatiles.keys() {
            if key.zoom != zoom.level() {
                continue;
            }
            // Grid cell.
            let rect = key.rect();
            host.draw(
                display,
                DrawOp::StrokeRect {
                    rect: Rect::new(
                        rect.x0 - self.scroll.x,
                        rect.y0 - self.scroll.y,
                        rect.x1 - self.scroll.x,
                        rect.y1 - self.scroll.y,
                    ),
                    color: Color::from_rgba8(255, 0, 255, 90),
                    width: 1.0,
                },
            );
            if let Some(tile) = self.megatiles.get(key) {
                for &node in tile.nodes() {
                    if !nodes.contains(&node) {
                        nodes.push(node);
                    }
                }
            }
        }

        let mut graph_nodes = Vec::new();
        for node in nodes {
            graph_nodes.push(node);
            graph_nodes.extend(self.mapper.descendants(node)?);
        }
        for node in graph_nodes {
            let center = self.map_point_to_canvas(self.mapper.effective_center(node)?);
            let radius = self.units_to_pixels(self.mapper.radius(node)?);
            host.draw(
                display,
                DrawOp::StrokeArc {
                    center,
                    radius,
                    start_angle: 0.0,
                    end_angle: core::f64::consts::TAU,
                    color: Color::from_rgba8(0, 255, 0, 120),
                    width: 1.0,
                },
            );
            for edge in self.mapper.node_edges(node)? {
                let other = self.map_point_to_canvas(self.mapper.effective_center(edge.other)?);
                host.draw(
                    display,
                    DrawOp::StrokeLine {
                        from: center,
                        to: other,
                        color: Color::from_rgba8(255, 255, 0, 120),
                        width: 1.0,
                    },
                );
            }
        }
        Ok(())
    }
}
