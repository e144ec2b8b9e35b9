// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node rasterization.
//!
//! A [`NodeRender`] is the cached rasterization of one object node at one
//! zoom level: a list of tile-aligned [`RenderLayer`] records, one per
//! distinct child altitude (and more when a record would exceed the
//! mini-canvas limit), each holding the draw stamps, the hit-test
//! [`Part`]s, and — for terrain — the [`FocusTile`]s along the children's
//! outer arcs that the smoothing pass blends against neighbors.

use hashbrown::HashMap;
use kurbo::{Point, Rect};
use peniko::Color;
use ridgeline_canvas::{CanvasHost, CanvasId, DrawOp, Fill, ImageId};
use ridgeline_geom::{Box3, Vec3};
use ridgeline_map::{DrawMode, Mapper, NodeRef, NodeRole, NodeType, Result, TypeFlags};
use tracing::trace;

use crate::fill::FillCache;
use crate::tile::{MINI_CANVAS_LIMIT, TILE_SIZE, tile_of};
use crate::zoom::Zoom;

/// A rasterized footprint of a single node, used for hit testing.
#[derive(Clone, Debug)]
pub struct Part {
    /// The node this footprint belongs to.
    pub node: NodeRef,
    /// Absolute canvas position; Z carries the child's altitude.
    pub point: Vec3,
    /// Footprint radius in pixels.
    pub radius: f64,
    /// Layer key the part was drawn on.
    pub layer: String,
    /// The fill used for terrain parts; explicit and border parts have
    /// none.
    pub fill: Option<Fill>,
    /// The node that provided the background pattern, if any.
    pub background: Option<NodeRef>,
}

/// A terrain tile on the outer arc of a child disk.
#[derive(Clone, Debug)]
pub struct FocusTile {
    /// Tile coordinates in the absolute tile grid.
    pub tile: (i64, i64),
    /// The tile's center in absolute canvas pixels.
    pub point: Point,
    /// Layer key of the part that produced the tile.
    pub layer: String,
}

/// One draw instruction of a render layer, in layer-local pixels.
#[derive(Clone, Debug)]
enum Stamp {
    Disk {
        at: Point,
        radius: f64,
        fill: Fill,
    },
    Image {
        image: ImageId,
        dst: Rect,
    },
    Arcs {
        at: Point,
        radius: f64,
        spans: Vec<(f64, f64)>,
        color: Color,
        width: f64,
    },
}

/// A rectangular, tile-aligned slice of a node's rasterization.
///
/// The canvas is built lazily on first request and destroyed on eviction;
/// width and height are multiples of the tile size and never exceed the
/// mini-canvas limit.
#[derive(Debug)]
pub struct RenderLayer {
    /// Absolute canvas position of the top-left corner, tile-snapped.
    pub corner: Point,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Stacking key, the children's `center.z` for this record.
    pub z: f64,
    /// Hit-test footprints drawn into this record.
    pub parts: Vec<Part>,
    /// Focus tiles keyed by tile coordinates; empty unless terrain was
    /// drawn.
    pub focus_tiles: HashMap<(i64, i64), FocusTile>,
    stamps: Vec<Stamp>,
    canvas: Option<CanvasId>,
}

impl RenderLayer {
    /// The absolute rectangle this record covers.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.corner.x,
            self.corner.y,
            self.corner.x + f64::from(self.width),
            self.corner.y + f64::from(self.height),
        )
    }

    /// Returns the record's canvas, rasterizing the stamps on first call.
    pub fn canvas(&mut self, host: &mut dyn CanvasHost) -> CanvasId {
        if let Some(canvas) = self.canvas {
            return canvas;
        }
        let canvas = host.create_canvas(self.width, self.height);
        for stamp in &self.stamps {
            match stamp {
                Stamp::Disk { at, radius, fill } => {
                    host.fill_disk(canvas, *at, *radius, *fill);
                }
                Stamp::Image { image, dst } => {
                    host.draw(
                        canvas,
                        DrawOp::DrawImage {
                            image: *image,
                            src: None,
                            dst: *dst,
                        },
                    );
                }
                Stamp::Arcs {
                    at,
                    radius,
                    spans,
                    color,
                    width,
                } => {
                    for &(start_angle, end_angle) in spans {
                        host.draw(
                            canvas,
                            DrawOp::StrokeArc {
                                center: *at,
                                radius: *radius,
                                start_angle,
                                end_angle,
                                color: *color,
                                width: *width,
                            },
                        );
                    }
                }
            }
        }
        self.canvas = Some(canvas);
        canvas
    }

    /// Destroys the built canvas, if any.
    pub fn release(&mut self, host: &mut dyn CanvasHost) {
        if let Some(canvas) = self.canvas.take() {
            host.destroy_canvas(canvas);
        }
    }
}

/// A drawable child gathered before stamping.
#[derive(Clone, Debug)]
struct Child {
    node: NodeRef,
    center: Point,
    center_units: Vec3,
    z: f64,
    radius: f64,
}

/// The cached rasterization of one object node at one zoom level.
#[derive(Debug)]
pub struct NodeRender {
    /// The object node.
    pub node: NodeRef,
    /// The zoom level this render was built for.
    pub zoom: Zoom,
    /// Layer records in ascending stacking order.
    pub layers: Vec<RenderLayer>,
}

impl NodeRender {
    /// Rasterizes `node` at `zoom`.
    ///
    /// Returns `None` when the node's radius maps to less than one pixel,
    /// or when it has no registered type. Canvases are not built here;
    /// each record rasterizes lazily on first composition.
    pub fn build(
        mapper: &mut Mapper,
        host: &mut dyn CanvasHost,
        fills: &mut FillCache,
        zoom: Zoom,
        node: NodeRef,
    ) -> Result<Option<Self>> {
        if zoom.units_to_pixels(mapper.radius(node)?) < 1.0 {
            return Ok(None);
        }
        let Some(node_type) = mapper.node_type(node)? else {
            return Ok(None);
        };
        let layer_key = mapper.layer_key(node)?;
        let draw_mode = mapper
            .layers()
            .get(&layer_key)
            .map_or(DrawMode::Area, |layer| layer.draw_mode());

        let children = Self::gather_children(mapper, zoom, node)?;
        if children.is_empty() {
            return Ok(None);
        }

        // One record per altitude; insertion order is kept within a level
        // so equal-altitude children stack deterministically.
        let mut groups: Vec<(f64, Vec<Child>)> = Vec::new();
        for child in children {
            match groups.iter_mut().find(|(z, _)| *z == child.z) {
                Some((_, group)) => group.push(child),
                None => groups.push((child.z, vec![child])),
            }
        }
        groups.sort_by(|(a, _), (b, _)| a.total_cmp(b));

        let mut layers = Vec::new();
        for (z, group) in &groups {
            Self::build_layer_records(
                mapper,
                host,
                fills,
                zoom,
                &node_type,
                &layer_key,
                draw_mode,
                *z,
                group,
                &mut layers,
            )?;
        }

        // Focus tiles survive only where the tile center is not buried
        // inside a part's interior.
        let all_parts: Vec<Part> = layers
            .iter()
            .flat_map(|layer| layer.parts.iter().cloned())
            .collect();
        let buried = |point: Point| {
            all_parts.iter().any(|part| {
                let dx = point.x - part.point.x;
                let dy = point.y - part.point.y;
                dx.hypot(dy) < part.radius - 2.0 * f64::from(TILE_SIZE)
            })
        };
        for layer in &mut layers {
            layer.focus_tiles.retain(|_, tile| !buried(tile.point));
        }

        trace!(?node, zoom = zoom.level(), records = layers.len(), "built node render");
        Ok(Some(Self {
            node,
            zoom,
            layers,
        }))
    }

    /// Destroys every built canvas.
    pub fn release(&mut self, host: &mut dyn CanvasHost) {
        for layer in &mut self.layers {
            layer.release(host);
        }
    }

    fn gather_children(mapper: &mut Mapper, zoom: Zoom, node: NodeRef) -> Result<Vec<Child>> {
        let mut drawn = Vec::new();
        let mut candidates = mapper.descendants(node)?;
        if candidates.is_empty() {
            // A childless object draws itself.
            candidates.push(node);
        }
        for candidate in candidates {
            if mapper.node_role(candidate)? == NodeRole::Object && candidate != node {
                continue;
            }
            let radius = zoom.units_to_pixels(mapper.radius(candidate)?);
            if radius <= 0.0 {
                continue;
            }
            let center_units = mapper.effective_center(candidate)?;
            let center = Point::new(
                zoom.units_to_pixels(center_units.x),
                zoom.units_to_pixels(center_units.y),
            );
            drawn.push(Child {
                node: candidate,
                center,
                center_units,
                z: mapper.center(candidate)?.z,
                radius,
            });
        }
        Ok(drawn)
    }

    fn build_layer_records(
        mapper: &mut Mapper,
        host: &mut dyn CanvasHost,
        fills: &mut FillCache,
        zoom: Zoom,
        node_type: &NodeType,
        layer_key: &str,
        draw_mode: DrawMode,
        z: f64,
        group: &[Child],
        layers: &mut Vec<RenderLayer>,
    ) -> Result<()> {
        let tile = f64::from(TILE_SIZE);
        let mut min = Point::new(f64::MAX, f64::MAX);
        let mut max = Point::new(f64::MIN, f64::MIN);
        for child in group {
            min.x = min.x.min(child.center.x - child.radius);
            min.y = min.y.min(child.center.y - child.radius);
            max.x = max.x.max(child.center.x + child.radius);
            max.y = max.y.max(child.center.y + child.radius);
        }
        let min = Point::new((min.x / tile).floor() * tile, (min.y / tile).floor() * tile);
        let max = Point::new((max.x / tile).ceil() * tile, (max.y / tile).ceil() * tile);

        let limit = f64::from(MINI_CANVAS_LIMIT);
        let mut chunk_y = min.y;
        while chunk_y < max.y {
            let chunk_height = (max.y - chunk_y).min(limit);
            let mut chunk_x = min.x;
            while chunk_x < max.x {
                let chunk_width = (max.x - chunk_x).min(limit);
                let chunk = Rect::new(
                    chunk_x,
                    chunk_y,
                    chunk_x + chunk_width,
                    chunk_y + chunk_height,
                );
                let members: Vec<&Child> = group
                    .iter()
                    .filter(|child| {
                        Box3::new(
                            Vec3::new(chunk.x0, chunk.y0, 0.0),
                            Vec3::new(chunk.x1, chunk.y1, 0.0),
                        )
                        .touches_sphere_xy(
                            Vec3::new(child.center.x, child.center.y, 0.0),
                            child.radius,
                        )
                    })
                    .collect();
                if !members.is_empty() {
                    let mut record = RenderLayer {
                        corner: Point::new(chunk_x, chunk_y),
                        width: chunk_width as u32,
                        height: chunk_height as u32,
                        z,
                        parts: Vec::new(),
                        focus_tiles: HashMap::new(),
                        stamps: Vec::new(),
                        canvas: None,
                    };
                    for child in &members {
                        match draw_mode {
                            DrawMode::Border => {
                                Self::stamp_border(node_type, layer_key, child, group, &mut record);
                            }
                            DrawMode::Area => match node_type.scale() {
                                ridgeline_map::TypeScale::Explicit => {
                                    Self::stamp_explicit(
                                        host,
                                        node_type,
                                        layer_key,
                                        child,
                                        &mut record,
                                    );
                                }
                                ridgeline_map::TypeScale::Terrain => {
                                    Self::stamp_terrain(
                                        mapper,
                                        host,
                                        fills,
                                        zoom,
                                        node_type,
                                        layer_key,
                                        child,
                                        &mut record,
                                    )?;
                                }
                            },
                        }
                    }
                    layers.push(record);
                }
                chunk_x += limit;
            }
            chunk_y += limit;
        }
        Ok(())
    }

    /// Explicit scale: the configured image (or a solid disk) at the
    /// child's effective center, never smaller than half a tile.
    fn stamp_explicit(
        host: &mut dyn CanvasHost,
        node_type: &NodeType,
        layer_key: &str,
        child: &Child,
        record: &mut RenderLayer,
    ) {
        let radius = child.radius.max(f64::from(TILE_SIZE) / 2.0);
        let local = child.center - record.corner.to_vec2();
        match node_type.image().and_then(|key| host.image(key)) {
            Some(image) => record.stamps.push(Stamp::Image {
                image,
                dst: Rect::new(
                    local.x - radius,
                    local.y - radius,
                    local.x + radius,
                    local.y + radius,
                ),
            }),
            None => record.stamps.push(Stamp::Disk {
                at: local,
                radius,
                fill: Fill::Color(node_type.color()),
            }),
        }
        record.parts.push(Part {
            node: child.node,
            point: Vec3::new(child.center.x, child.center.y, child.z),
            radius,
            layer: layer_key.to_owned(),
            fill: None,
            background: None,
        });
    }

    /// Terrain scale: a pattern-filled disk, plus focus-tile candidates
    /// along the outer arc.
    fn stamp_terrain(
        mapper: &mut Mapper,
        host: &mut dyn CanvasHost,
        fills: &mut FillCache,
        zoom: Zoom,
        node_type: &NodeType,
        layer_key: &str,
        child: &Child,
        record: &mut RenderLayer,
    ) -> Result<()> {
        let background = Self::resolve_background(mapper, zoom, node_type, layer_key, child)?;
        let background_type = match background {
            Some(node) => mapper.node_type(node)?,
            None => None,
        };
        let fill = Fill::Pattern(fills.pattern(host, node_type, background_type.as_ref()));

        let local = child.center - record.corner.to_vec2();
        record.stamps.push(Stamp::Disk {
            at: local,
            radius: child.radius,
            fill,
        });
        record.parts.push(Part {
            node: child.node,
            point: Vec3::new(child.center.x, child.center.y, child.z),
            radius: child.radius,
            layer: layer_key.to_owned(),
            fill: Some(fill),
            background,
        });

        for (start_angle, _) in arc_spans(child.radius) {
            let point = Point::new(
                child.center.x + child.radius * start_angle.cos(),
                child.center.y + child.radius * start_angle.sin(),
            );
            let tile = tile_of(point.x, point.y);
            let size = f64::from(TILE_SIZE);
            record.focus_tiles.entry(tile).or_insert_with(|| FocusTile {
                tile,
                point: Point::new(
                    tile.0 as f64 * size + size / 2.0,
                    tile.1 as f64 * size + size / 2.0,
                ),
                layer: layer_key.to_owned(),
            });
        }
        Ok(())
    }

    /// Border mode: short outer-arc segments, dropping any whose
    /// endpoints are both buried inside a sibling's inner disk.
    fn stamp_border(
        node_type: &NodeType,
        layer_key: &str,
        child: &Child,
        group: &[Child],
        record: &mut RenderLayer,
    ) {
        let local = child.center - record.corner.to_vec2();
        let mut spans = Vec::new();
        for (start_angle, end_angle) in arc_spans(child.radius) {
            let endpoints = [start_angle, end_angle].map(|angle| {
                Point::new(
                    child.center.x + child.radius * angle.cos(),
                    child.center.y + child.radius * angle.sin(),
                )
            });
            let hidden = group.iter().any(|other| {
                if other.node == child.node {
                    return false;
                }
                let inner = other.radius - 1.0;
                endpoints.iter().all(|point| {
                    let dx = point.x - other.center.x;
                    let dy = point.y - other.center.y;
                    dx.hypot(dy) < inner
                })
            });
            if !hidden {
                spans.push((start_angle, end_angle));
            }
        }
        if !spans.is_empty() {
            record.stamps.push(Stamp::Arcs {
                at: local,
                radius: child.radius,
                spans,
                color: node_type.color(),
                width: 2.0,
            });
        }
        record.parts.push(Part {
            node: child.node,
            point: Vec3::new(child.center.x, child.center.y, child.z),
            radius: child.radius,
            layer: layer_key.to_owned(),
            fill: None,
            background: None,
        });
    }

    /// Picks the background provider for a terrain child: the
    /// greatest-altitude distinct node within a pixel of the child's
    /// effective center, on the same layer, with a background-giving type
    /// different from the child's, whose radius covers the distance.
    fn resolve_background(
        mapper: &mut Mapper,
        zoom: Zoom,
        node_type: &NodeType,
        layer_key: &str,
        child: &Child,
    ) -> Result<Option<NodeRef>> {
        if !node_type.flags().contains(TypeFlags::RECEIVES_BACKGROUND) {
            return Ok(None);
        }
        let tolerance = zoom.pixels_to_units(1.0);
        let area = Box3::from_radius(child.center_units, tolerance);
        let mut best: Option<(NodeRef, f64)> = None;
        for candidate in mapper.nodes_touching_area(area, 0.0)? {
            if candidate == child.node {
                continue;
            }
            // Aggregates are not drawn; only their samples give backgrounds.
            if mapper.node_role(candidate)? == NodeRole::Object {
                continue;
            }
            let Some(candidate_type) = mapper.node_type(candidate)? else {
                continue;
            };
            if candidate_type.id() == node_type.id()
                || !candidate_type.flags().contains(TypeFlags::GIVES_BACKGROUND)
                || mapper.layer_key(candidate)? != layer_key
            {
                continue;
            }
            let center = mapper.effective_center(candidate)?;
            if center.distance_xy(child.center_units) > mapper.radius(candidate)? {
                continue;
            }
            let altitude = mapper.center(candidate)?.z;
            if best.is_none_or(|(_, best_altitude)| altitude > best_altitude) {
                best = Some((candidate, altitude));
            }
        }
        Ok(best.map(|(node, _)| node))
    }
}

/// Splits a circle of `radius` pixels into short arc spans.
///
/// The sample step is `8 / radius` radians, capped so degenerate radii
/// cannot produce unbounded span counts.
fn arc_spans(radius: f64) -> Vec<(f64, f64)> {
    const TAU: f64 = core::f64::consts::TAU;
    let step = (8.0 / radius.max(0.5)).min(TAU);
    let count = ((TAU / step).ceil() as usize).clamp(1, 4096);
    let step = TAU / count as f64;
    (0..count)
        .map(|i| (i as f64 * step, (i + 1) as f64 * step))
        .collect()
}

/// Cache of [`NodeRender`]s keyed by `(node, zoom)`.
///
/// A node whose render was skipped (sub-pixel radius) caches the skip, so
/// the decision is not recomputed every recalc.
#[derive(Debug, Default)]
pub struct NodeRenderCache {
    renders: HashMap<(NodeRef, u32), Option<NodeRender>>,
}

impl NodeRenderCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the render for `(node, zoom)`, building it if absent.
    pub fn get_or_build(
        &mut self,
        mapper: &mut Mapper,
        host: &mut dyn CanvasHost,
        fills: &mut FillCache,
        zoom: Zoom,
        node: NodeRef,
    ) -> Result<Option<&mut NodeRender>> {
        let key = (node, zoom.level());
        if !self.renders.contains_key(&key) {
            let built = NodeRender::build(mapper, host, fills, zoom, node)?;
            self.renders.insert(key, built);
        }
        Ok(self.renders.get_mut(&key).and_then(Option::as_mut))
    }

    /// Returns `true` if a render (or cached skip) exists for the pair.
    #[must_use]
    pub fn contains(&self, node: NodeRef, zoom: Zoom) -> bool {
        self.renders.contains_key(&(node, zoom.level()))
    }

    /// Evicts the node's renders at every zoom, destroying canvases.
    pub fn evict(&mut self, host: &mut dyn CanvasHost, node: NodeRef) {
        let keys: Vec<_> = self
            .renders
            .keys()
            .filter(|(cached, _)| *cached == node)
            .copied()
            .collect();
        for key in keys {
            if let Some(Some(mut render)) = self.renders.remove(&key) {
                render.release(host);
            }
        }
    }

    /// Evicts everything, destroying canvases.
    pub fn clear(&mut self, host: &mut dyn CanvasHost) {
        for (_, render) in self.renders.drain() {
            if let Some(mut render) = render {
                render.release(host);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridgeline_canvas::RecordHost;
    use ridgeline_map::InsertNodeOptions;
    use ridgeline_store::MemoryStore;

    fn mapper() -> Mapper {
        Mapper::new(Box::new(MemoryStore::new()))
    }

    fn insert(
        mapper: &mut Mapper,
        type_key: &str,
        parent: Option<NodeRef>,
        role: NodeRole,
        center: Vec3,
        radius: f64,
    ) -> NodeRef {
        mapper
            .insert_node(
                center,
                role,
                InsertNodeOptions {
                    parent,
                    type_key: type_key.into(),
                    radius,
                    layer: None,
                },
            )
            .unwrap()
    }

    fn terrain_object(mapper: &mut Mapper, type_key: &str, center: Vec3, radius: f64) -> NodeRef {
        let object = insert(mapper, type_key, None, NodeRole::Object, center, radius);
        insert(
            mapper,
            type_key,
            Some(object),
            NodeRole::Point,
            center,
            radius,
        );
        object
    }

    #[test]
    fn subpixel_radius_skips_the_render() {
        let mut mapper = mapper();
        let mut host = RecordHost::new();
        let mut fills = FillCache::new();
        let object = terrain_object(&mut mapper, "grass", Vec3::ZERO, 0.01);

        let render =
            NodeRender::build(&mut mapper, &mut host, &mut fills, Zoom::DEFAULT, object).unwrap();
        assert!(render.is_none());
    }

    #[test]
    fn terrain_render_has_pattern_parts_and_focus_tiles() {
        let mut mapper = mapper();
        let mut host = RecordHost::new();
        let mut fills = FillCache::new();
        let object = terrain_object(&mut mapper, "grass", Vec3::new(100.0, 100.0, 0.0), 40.0);

        let render = NodeRender::build(&mut mapper, &mut host, &mut fills, Zoom::DEFAULT, object)
            .unwrap()
            .unwrap();

        assert_eq!(render.layers.len(), 1);
        let layer = &render.layers[0];
        assert_eq!(layer.parts.len(), 1);
        let part = &layer.parts[0];
        assert!(matches!(part.fill, Some(Fill::Pattern(_))));
        assert_eq!(part.layer, "geographical");
        assert_eq!(part.radius, 40.0);
        assert!(!layer.focus_tiles.is_empty(), "terrain collects focus tiles");

        // Corner is tile-snapped and the size is a tile multiple.
        assert_eq!(layer.corner.x % 16.0, 0.0);
        assert_eq!(layer.corner.y % 16.0, 0.0);
        assert_eq!(layer.width % TILE_SIZE, 0);
        assert_eq!(layer.height % TILE_SIZE, 0);
    }

    #[test]
    fn focus_tiles_are_not_buried_in_part_interiors() {
        let mut mapper = mapper();
        let mut host = RecordHost::new();
        let mut fills = FillCache::new();
        let object = terrain_object(&mut mapper, "grass", Vec3::new(200.0, 200.0, 0.0), 100.0);

        let render = NodeRender::build(&mut mapper, &mut host, &mut fills, Zoom::DEFAULT, object)
            .unwrap()
            .unwrap();

        let layer = &render.layers[0];
        let part = &layer.parts[0];
        for tile in layer.focus_tiles.values() {
            let dx = tile.point.x - part.point.x;
            let dy = tile.point.y - part.point.y;
            assert!(
                dx.hypot(dy) >= part.radius - 2.0 * f64::from(TILE_SIZE),
                "focus tile buried inside the disk"
            );
        }
    }

    #[test]
    fn explicit_render_uses_images_and_a_minimum_radius() {
        let mut mapper = mapper();
        let mut host = RecordHost::new();
        host.register_image("tree", 16, 16);
        let mut fills = FillCache::new();
        let object = terrain_object(&mut mapper, "tree", Vec3::new(50.0, 50.0, 0.0), 2.0);

        let render = NodeRender::build(&mut mapper, &mut host, &mut fills, Zoom::DEFAULT, object)
            .unwrap()
            .unwrap();

        let layer = &render.layers[0];
        // Radius clamps up to half a tile even though 2 units is 2 px.
        assert_eq!(layer.parts[0].radius, 8.0);
        assert!(layer.focus_tiles.is_empty(), "explicit renders have no focus tiles");
        assert!(layer.parts[0].fill.is_none());
    }

    #[test]
    fn children_split_into_one_record_per_altitude() {
        let mut mapper = mapper();
        let mut host = RecordHost::new();
        let mut fills = FillCache::new();

        let object = insert(
            &mut mapper,
            "grass",
            None,
            NodeRole::Object,
            Vec3::new(0.0, 0.0, 0.0),
            30.0,
        );
        insert(
            &mut mapper,
            "grass",
            Some(object),
            NodeRole::Point,
            Vec3::new(0.0, 0.0, 0.0),
            20.0,
        );
        insert(
            &mut mapper,
            "grass",
            Some(object),
            NodeRole::Point,
            Vec3::new(10.0, 0.0, 2.5),
            20.0,
        );

        let render = NodeRender::build(&mut mapper, &mut host, &mut fills, Zoom::DEFAULT, object)
            .unwrap()
            .unwrap();

        assert_eq!(render.layers.len(), 2);
        assert!(render.layers[0].z < render.layers[1].z);
    }

    #[test]
    fn border_mode_strokes_arcs_and_drops_buried_segments() {
        let mut mapper = mapper();
        let mut host = RecordHost::new();
        let mut fills = FillCache::new();

        let object = insert(
            &mut mapper,
            "region",
            None,
            NodeRole::Object,
            Vec3::new(100.0, 100.0, 0.0),
            40.0,
        );
        // Two heavily overlapping children: segments between them vanish.
        let center_a = Vec3::new(100.0, 100.0, 0.0);
        let center_b = Vec3::new(110.0, 100.0, 0.0);
        insert(&mut mapper, "region", Some(object), NodeRole::Point, center_a, 30.0);
        insert(&mut mapper, "region", Some(object), NodeRole::Point, center_b, 30.0);

        let render = NodeRender::build(&mut mapper, &mut host, &mut fills, Zoom::DEFAULT, object)
            .unwrap()
            .unwrap();

        let layer = &mut render.layers.into_iter().next().unwrap();
        let canvas = layer.canvas(&mut host);
        let arc_count = host
            .ops_for(canvas)
            .iter()
            .filter(|op| matches!(op, ridgeline_canvas::CanvasOp::Draw(DrawOp::StrokeArc { .. })))
            .count();
        assert!(arc_count > 0, "borders stroke arcs");

        // A full circle at radius 30 px samples ~24 spans; two overlapping
        // circles must have dropped some.
        let full = arc_spans(30.0).len() * 2;
        assert!(arc_count < full, "overlapping borders drop buried spans");
    }

    #[test]
    fn background_resolution_prefers_the_highest_giver() {
        let mut mapper = mapper();
        let mut host = RecordHost::new();
        let mut fills = FillCache::new();

        // Two background givers under the same point; stone sits higher.
        let water = insert(
            &mut mapper,
            "water",
            None,
            NodeRole::Object,
            Vec3::new(0.0, 0.0, 0.0),
            50.0,
        );
        insert(
            &mut mapper,
            "water",
            Some(water),
            NodeRole::Point,
            Vec3::new(0.0, 0.0, 0.0),
            50.0,
        );
        let stone = insert(
            &mut mapper,
            "stone",
            None,
            NodeRole::Object,
            Vec3::new(0.0, 0.0, 1.0),
            50.0,
        );
        let stone_point = insert(
            &mut mapper,
            "stone",
            Some(stone),
            NodeRole::Point,
            Vec3::new(0.0, 0.0, 1.0),
            50.0,
        );

        let grass = terrain_object(&mut mapper, "grass", Vec3::new(0.0, 0.0, 0.0), 30.0);
        let render = NodeRender::build(&mut mapper, &mut host, &mut fills, Zoom::DEFAULT, grass)
            .unwrap()
            .unwrap();

        let part = &render.layers[0].parts[0];
        assert_eq!(part.background, Some(stone_point));
    }

    #[test]
    fn cache_skips_rebuilds_and_evicts_per_node() {
        let mut mapper = mapper();
        let mut host = RecordHost::new();
        let mut fills = FillCache::new();
        let mut cache = NodeRenderCache::new();
        let object = terrain_object(&mut mapper, "grass", Vec3::new(50.0, 50.0, 0.0), 20.0);

        assert!(!cache.contains(object, Zoom::DEFAULT));
        cache
            .get_or_build(&mut mapper, &mut host, &mut fills, Zoom::DEFAULT, object)
            .unwrap()
            .unwrap();
        assert!(cache.contains(object, Zoom::DEFAULT));

        cache.evict(&mut host, object);
        assert!(!cache.contains(object, Zoom::DEFAULT));
    }
}
