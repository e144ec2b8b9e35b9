// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The megatile composite cache.
//!
//! Megatiles are 512×512 screen-aligned canvases keyed by
//! `(zoom, x, y)` in the absolute (scroll-independent) plane. They hold
//! the composited output of every [`RenderLayer`] that overlaps them, the
//! ordered [`Part`] list for hit testing, a per-layer part lookup cached
//! at tile centers, and the reverse index from node id to the megatiles
//! it was composited into — the engine's unit of invalidation.

use hashbrown::{HashMap, HashSet};
use kurbo::{Point, Rect};
use peniko::Color;
use ridgeline_canvas::{CanvasHost, CanvasId, Composite, DrawOp, Fill, StateOp};
use ridgeline_map::NodeRef;
use tracing::trace;

use crate::render::{FocusTile, Part, RenderLayer};
use crate::tile::{MEGA_TILE_SIZE, TILE_SIZE};

/// Key of a megatile: zoom level plus megatile-grid coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MegaKey {
    /// Zoom level the tile was composited at.
    pub zoom: u32,
    /// Megatile column, `floor(absolute_x / 512)`.
    pub x: i64,
    /// Megatile row, `floor(absolute_y / 512)`.
    pub y: i64,
}

impl MegaKey {
    /// Returns the key containing an absolute pixel position.
    #[must_use]
    pub fn containing(zoom: u32, point: Point) -> Self {
        let size = f64::from(MEGA_TILE_SIZE);
        Self {
            zoom,
            x: (point.x / size).floor() as i64,
            y: (point.y / size).floor() as i64,
        }
    }

    /// Returns every key overlapping an absolute rectangle.
    #[must_use]
    pub fn covering(zoom: u32, rect: Rect) -> Vec<Self> {
        let size = f64::from(MEGA_TILE_SIZE);
        let x0 = (rect.x0 / size).floor() as i64;
        let y0 = (rect.y0 / size).floor() as i64;
        let x1 = ((rect.x1 - 1.0).max(rect.x0) / size).floor() as i64;
        let y1 = ((rect.y1 - 1.0).max(rect.y0) / size).floor() as i64;
        let mut keys = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                keys.push(Self { zoom, x, y });
            }
        }
        keys
    }

    /// The absolute rectangle this key covers.
    #[must_use]
    pub fn rect(self) -> Rect {
        let size = f64::from(MEGA_TILE_SIZE);
        Rect::new(
            self.x as f64 * size,
            self.y as f64 * size,
            (self.x + 1) as f64 * size,
            (self.y + 1) as f64 * size,
        )
    }
}

/// One composited megatile.
#[derive(Debug)]
pub struct MegaTile {
    key: MegaKey,
    canvas: CanvasId,
    nodes: HashSet<NodeRef>,
    parts: Vec<Part>,
    tile_center_cache: HashMap<(String, (i64, i64)), Option<usize>>,
}

impl MegaTile {
    /// The tile's key.
    #[must_use]
    pub fn key(&self) -> MegaKey {
        self.key
    }

    /// The composite canvas.
    #[must_use]
    pub fn canvas(&self) -> CanvasId {
        self.canvas
    }

    /// The object nodes ever composited into this tile.
    #[must_use]
    pub fn nodes(&self) -> &HashSet<NodeRef> {
        &self.nodes
    }

    /// The parts rendered into this tile, in render order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Returns the topmost part on `layer` containing the absolute point.
    ///
    /// Scans in reverse render order, so the most recently drawn part
    /// wins.
    #[must_use]
    pub fn part_at(&self, point: Point, layer: &str) -> Option<&Part> {
        self.parts.iter().rev().find(|part| {
            part.layer == layer && {
                let dx = point.x - part.point.x;
                let dy = point.y - part.point.y;
                dx.hypot(dy) < part.radius
            }
        })
    }

    /// Cached part lookup at a tile's center.
    ///
    /// The fast path for focus-tile neighbor resolution: the result per
    /// `(layer, tile)` pair is remembered until new content lands in the
    /// tile.
    pub fn part_at_tile_center(&mut self, layer: &str, tile: (i64, i64)) -> Option<Part> {
        let key = (layer.to_owned(), tile);
        if let Some(&cached) = self.tile_center_cache.get(&key) {
            return cached.map(|index| self.parts[index].clone());
        }
        let size = f64::from(TILE_SIZE);
        let center = Point::new(
            tile.0 as f64 * size + size / 2.0,
            tile.1 as f64 * size + size / 2.0,
        );
        let index = self
            .parts
            .iter()
            .enumerate()
            .rev()
            .find(|(_, part)| {
                part.layer == layer && {
                    let dx = center.x - part.point.x;
                    let dy = center.y - part.point.y;
                    dx.hypot(dy) < part.radius
                }
            })
            .map(|(index, _)| index);
        self.tile_center_cache.insert(key, index);
        index.map(|index| self.parts[index].clone())
    }
}

/// The megatile cache plus its node → megatiles reverse index.
#[derive(Debug, Default)]
pub struct MegaTileCache {
    tiles: HashMap<MegaKey, MegaTile>,
    reverse: HashMap<NodeRef, HashSet<MegaKey>>,
}

impl MegaTileCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the megatile at `key`, if composited.
    #[must_use]
    pub fn get(&self, key: MegaKey) -> Option<&MegaTile> {
        self.tiles.get(&key)
    }

    /// Returns all cached keys.
    #[must_use]
    pub fn keys(&self) -> Vec<MegaKey> {
        self.tiles.keys().copied().collect()
    }

    /// Returns the keys of every megatile `node` was composited into.
    #[must_use]
    pub fn megatiles_of(&self, node: NodeRef) -> Vec<MegaKey> {
        self.reverse
            .get(&node)
            .map(|keys| keys.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the megatile at `key`, creating its canvas if needed.
    pub fn ensure(&mut self, host: &mut dyn CanvasHost, key: MegaKey) -> &mut MegaTile {
        self.tiles.entry(key).or_insert_with(|| MegaTile {
            key,
            canvas: host.create_canvas(MEGA_TILE_SIZE, MEGA_TILE_SIZE),
            nodes: HashSet::new(),
            parts: Vec::new(),
            tile_center_cache: HashMap::new(),
        })
    }

    /// Composites one render layer of `node` into every overlapping
    /// megatile.
    ///
    /// When `selected` is set, the blitted content is darkened first
    /// (a source-atop fill at 10% black on a scratch canvas) so hover and
    /// active selections read on screen. Returns the keys that received
    /// content.
    pub fn composite_layer(
        &mut self,
        host: &mut dyn CanvasHost,
        zoom: u32,
        node: NodeRef,
        layer: &mut RenderLayer,
        selected: bool,
    ) -> Vec<MegaKey> {
        let layer_rect = layer.rect();
        let layer_canvas = layer.canvas(host);
        let mut touched = Vec::new();

        for key in MegaKey::covering(zoom, layer_rect) {
            let mega_rect = key.rect();
            let overlap = layer_rect.intersect(mega_rect);
            if overlap.width() <= 0.0 || overlap.height() <= 0.0 {
                continue;
            }
            let tile = self.ensure(host, key);
            let canvas = tile.canvas;

            let src = Rect::new(
                overlap.x0 - layer_rect.x0,
                overlap.y0 - layer_rect.y0,
                overlap.x1 - layer_rect.x0,
                overlap.y1 - layer_rect.y0,
            );
            let dst = Rect::new(
                overlap.x0 - mega_rect.x0,
                overlap.y0 - mega_rect.y0,
                overlap.x1 - mega_rect.x0,
                overlap.y1 - mega_rect.y0,
            );

            if selected {
                let scratch =
                    host.create_canvas(overlap.width() as u32, overlap.height() as u32);
                let scratch_rect = Rect::new(0.0, 0.0, overlap.width(), overlap.height());
                host.blit(scratch, layer_canvas, src, scratch_rect);
                host.state(scratch, StateOp::SetComposite(Composite::SourceAtop));
                host.draw(
                    scratch,
                    DrawOp::FillRect {
                        rect: scratch_rect,
                        fill: Fill::Color(Color::from_rgba8(0, 0, 0, 26)),
                    },
                );
                host.state(scratch, StateOp::SetComposite(Composite::SourceOver));
                host.blit(canvas, scratch, scratch_rect, dst);
                host.destroy_canvas(scratch);
            } else {
                host.blit(canvas, layer_canvas, src, dst);
            }

            tile.nodes.insert(node);
            // A recomposite replaces the node's earlier footprints instead
            // of stacking duplicates.
            let members: HashSet<NodeRef> = layer.parts.iter().map(|part| part.node).collect();
            tile.parts.retain(|part| !members.contains(&part.node));
            for part in &layer.parts {
                let dx = (part.point.x.clamp(mega_rect.x0, mega_rect.x1)) - part.point.x;
                let dy = (part.point.y.clamp(mega_rect.y0, mega_rect.y1)) - part.point.y;
                if dx.hypot(dy) <= part.radius {
                    tile.parts.push(part.clone());
                }
            }
            // New content invalidates the tile-center fast path.
            tile.tile_center_cache.clear();

            self.reverse.entry(node).or_default().insert(key);
            touched.push(key);
        }
        touched
    }

    /// Applies focus-tile smoothing for one pass's accumulated tiles.
    ///
    /// For each focus tile, the eight compass neighbors are resolved
    /// through the tile-center cache; every neighbor part on the same
    /// layer with a pattern fill contributes a half-disk of its pattern
    /// arcing into the focus tile at half alpha, with an extra faint
    /// black arc when the neighbor's node is selected.
    pub fn smooth_focus_tiles<F>(
        &mut self,
        host: &mut dyn CanvasHost,
        zoom: u32,
        tiles: &[FocusTile],
        is_selected: F,
    ) where
        F: Fn(NodeRef) -> bool,
    {
        use crate::tile::Compass;

        let half_tile = f64::from(TILE_SIZE) / 2.0;
        for focus in tiles {
            let target_key = MegaKey::containing(zoom, focus.point);
            let Some(target_canvas) = self.tiles.get(&target_key).map(|tile| tile.canvas) else {
                continue;
            };
            let target_rect = target_key.rect();

            for direction in Compass::ALL {
                let (dx, dy) = direction.offset();
                let neighbor_tile = (focus.tile.0 + dx, focus.tile.1 + dy);
                let size = f64::from(TILE_SIZE);
                let neighbor_center = Point::new(
                    neighbor_tile.0 as f64 * size + size / 2.0,
                    neighbor_tile.1 as f64 * size + size / 2.0,
                );
                let neighbor_key = MegaKey::containing(zoom, neighbor_center);
                let Some(neighbor_mega) = self.tiles.get_mut(&neighbor_key) else {
                    continue;
                };
                let Some(part) = neighbor_mega.part_at_tile_center(&focus.layer, neighbor_tile)
                else {
                    continue;
                };
                let Some(fill) = part.fill else {
                    continue;
                };

                // Half-disk anchored on the shared edge, opening into the
                // focus tile.
                let (vx, vy) = direction.vector();
                let anchor = Point::new(
                    focus.point.x + vx * half_tile - target_rect.x0,
                    focus.point.y + vy * half_tile - target_rect.y0,
                );
                let inward = direction.angle() + core::f64::consts::PI;
                let start_angle = inward - core::f64::consts::FRAC_PI_2;
                let end_angle = inward + core::f64::consts::FRAC_PI_2;

                host.state(target_canvas, StateOp::SetAlpha(0.5));
                host.draw(
                    target_canvas,
                    DrawOp::FillWedge {
                        center: anchor,
                        radius: half_tile,
                        start_angle,
                        end_angle,
                        fill,
                    },
                );
                if is_selected(part.node) {
                    host.state(target_canvas, StateOp::SetAlpha(0.05));
                    host.draw(
                        target_canvas,
                        DrawOp::FillWedge {
                            center: anchor,
                            radius: half_tile,
                            start_angle,
                            end_angle,
                            fill: Fill::Color(Color::from_rgba8(0, 0, 0, 255)),
                        },
                    );
                }
                host.state(target_canvas, StateOp::SetAlpha(1.0));
            }
        }
    }

    /// Evicts every megatile `node` appears in.
    ///
    /// Returns all node ids that had been composited into the evicted
    /// tiles, the set the next recalc must redraw to preserve overlap
    /// ordering. The reverse index is updated on both sides.
    pub fn evict_node(&mut self, host: &mut dyn CanvasHost, node: NodeRef) -> HashSet<NodeRef> {
        let keys = self.megatiles_of(node);
        let mut displaced = HashSet::new();
        for key in keys {
            displaced.extend(self.evict_key(host, key));
        }
        displaced
    }

    /// Evicts a single megatile, returning the nodes it contained.
    pub fn evict_key(&mut self, host: &mut dyn CanvasHost, key: MegaKey) -> HashSet<NodeRef> {
        let Some(tile) = self.tiles.remove(&key) else {
            return HashSet::new();
        };
        trace!(?key, nodes = tile.nodes.len(), "evicting megatile");
        host.destroy_canvas(tile.canvas);
        for contained in &tile.nodes {
            if let Some(keys) = self.reverse.get_mut(contained) {
                keys.remove(&key);
                if keys.is_empty() {
                    self.reverse.remove(contained);
                }
            }
        }
        tile.nodes
    }

    /// Evicts everything (zoom changes, imports).
    pub fn clear(&mut self, host: &mut dyn CanvasHost) {
        for (_, tile) in self.tiles.drain() {
            host.destroy_canvas(tile.canvas);
        }
        self.reverse.clear();
    }

    /// Returns `true` if no megatiles are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::FillCache;
    use crate::render::NodeRender;
    use crate::zoom::Zoom;
    use ridgeline_canvas::{CanvasOp, Event, RecordHost};
    use ridgeline_geom::Vec3;
    use ridgeline_map::{InsertNodeOptions, Mapper};
    use ridgeline_store::{MemoryStore, NodeRole};

    #[test]
    fn keys_floor_divide_absolute_positions() {
        assert_eq!(
            MegaKey::containing(5, Point::new(0.0, 0.0)),
            MegaKey { zoom: 5, x: 0, y: 0 }
        );
        assert_eq!(
            MegaKey::containing(5, Point::new(511.9, 512.0)),
            MegaKey { zoom: 5, x: 0, y: 1 }
        );
        assert_eq!(
            MegaKey::containing(5, Point::new(-0.1, -512.0)),
            MegaKey { zoom: 5, x: -1, y: -1 }
        );
    }

    #[test]
    fn covering_spans_the_rect() {
        let keys = MegaKey::covering(5, Rect::new(100.0, 100.0, 700.0, 300.0));
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&MegaKey { zoom: 5, x: 0, y: 0 }));
        assert!(keys.contains(&MegaKey { zoom: 5, x: 1, y: 0 }));
    }

    fn built_render(
        mapper: &mut Mapper,
        host: &mut RecordHost,
        fills: &mut FillCache,
        center: Vec3,
        radius: f64,
    ) -> (ridgeline_map::NodeRef, NodeRender) {
        let object = mapper
            .insert_node(
                center,
                NodeRole::Object,
                InsertNodeOptions {
                    type_key: "grass".into(),
                    radius,
                    ..InsertNodeOptions::default()
                },
            )
            .unwrap();
        mapper
            .insert_node(
                center,
                NodeRole::Point,
                InsertNodeOptions {
                    parent: Some(object),
                    type_key: "grass".into(),
                    radius,
                    ..InsertNodeOptions::default()
                },
            )
            .unwrap();
        let render = NodeRender::build(mapper, host, fills, Zoom::DEFAULT, object)
            .unwrap()
            .unwrap();
        (object, render)
    }

    #[test]
    fn composition_maintains_the_reverse_index() {
        let mut mapper = Mapper::new(Box::new(MemoryStore::new()));
        let mut host = RecordHost::new();
        let mut fills = FillCache::new();
        let mut cache = MegaTileCache::new();

        let (object, mut render) =
            built_render(&mut mapper, &mut host, &mut fills, Vec3::new(500.0, 500.0, 0.0), 40.0);
        let mut touched = Vec::new();
        for layer in &mut render.layers {
            touched.extend(cache.composite_layer(&mut host, 5, object, layer, false));
        }

        // The node straddles the megatile boundary at 512.
        assert!(touched.len() >= 2);
        for &key in &touched {
            assert!(cache.get(key).unwrap().nodes().contains(&object));
            assert!(cache.megatiles_of(object).contains(&key));
        }

        // Eviction clears both sides of the index.
        let displaced = cache.evict_node(&mut host, object);
        assert!(displaced.contains(&object));
        assert!(cache.megatiles_of(object).is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn eviction_returns_cohabitant_nodes() {
        let mut mapper = Mapper::new(Box::new(MemoryStore::new()));
        let mut host = RecordHost::new();
        let mut fills = FillCache::new();
        let mut cache = MegaTileCache::new();

        let (first, mut render_a) =
            built_render(&mut mapper, &mut host, &mut fills, Vec3::new(100.0, 100.0, 0.0), 30.0);
        let (second, mut render_b) =
            built_render(&mut mapper, &mut host, &mut fills, Vec3::new(150.0, 100.0, 0.0), 30.0);
        for layer in &mut render_a.layers {
            cache.composite_layer(&mut host, 5, first, layer, false);
        }
        for layer in &mut render_b.layers {
            cache.composite_layer(&mut host, 5, second, layer, false);
        }

        let displaced = cache.evict_node(&mut host, first);
        assert!(displaced.contains(&second), "cohabitants must be redrawn");
    }

    #[test]
    fn hit_testing_prefers_the_most_recent_part() {
        let mut mapper = Mapper::new(Box::new(MemoryStore::new()));
        let mut host = RecordHost::new();
        let mut fills = FillCache::new();
        let mut cache = MegaTileCache::new();

        let center = Vec3::new(100.0, 100.0, 0.0);
        let (first, mut render_a) = built_render(&mut mapper, &mut host, &mut fills, center, 30.0);
        let (second, mut render_b) = built_render(&mut mapper, &mut host, &mut fills, center, 30.0);
        for layer in &mut render_a.layers {
            cache.composite_layer(&mut host, 5, first, layer, false);
        }
        for layer in &mut render_b.layers {
            cache.composite_layer(&mut host, 5, second, layer, false);
        }

        let key = MegaKey::containing(5, Point::new(100.0, 100.0));
        let tile = cache.get(key).unwrap();
        let hit = tile.part_at(Point::new(100.0, 100.0), "geographical").unwrap();
        let second_children = mapper.node_children(second).unwrap();
        assert_eq!(hit.node, second_children[0]);

        // Misses: wrong layer, or outside every disk.
        assert!(tile.part_at(Point::new(100.0, 100.0), "political").is_none());
        assert!(tile.part_at(Point::new(400.0, 400.0), "geographical").is_none());
    }

    #[test]
    fn tile_center_cache_matches_direct_lookup() {
        let mut mapper = Mapper::new(Box::new(MemoryStore::new()));
        let mut host = RecordHost::new();
        let mut fills = FillCache::new();
        let mut cache = MegaTileCache::new();

        let (object, mut render) =
            built_render(&mut mapper, &mut host, &mut fills, Vec3::new(104.0, 104.0, 0.0), 30.0);
        for layer in &mut render.layers {
            cache.composite_layer(&mut host, 5, object, layer, false);
        }

        let key = MegaKey::containing(5, Point::new(104.0, 104.0));
        let tile = cache.tiles.get_mut(&key).unwrap();
        // Tile (6, 6) has center (104, 104), inside the disk.
        let cached = tile.part_at_tile_center("geographical", (6, 6)).unwrap();
        let direct = tile.part_at(Point::new(104.0, 104.0), "geographical").unwrap();
        assert_eq!(cached.node, direct.node);
        // Second read hits the cache (same result).
        let again = tile.part_at_tile_center("geographical", (6, 6)).unwrap();
        assert_eq!(again.node, cached.node);
    }

    #[test]
    fn selected_composition_darkens_through_a_scratch_canvas() {
        let mut mapper = Mapper::new(Box::new(MemoryStore::new()));
        let mut host = RecordHost::new();
        let mut fills = FillCache::new();
        let mut cache = MegaTileCache::new();

        let (object, mut render) =
            built_render(&mut mapper, &mut host, &mut fills, Vec3::new(100.0, 100.0, 0.0), 30.0);
        host.clear_events();
        for layer in &mut render.layers {
            cache.composite_layer(&mut host, 5, object, layer, true);
        }

        let darkened = host.events().iter().any(|event| {
            matches!(
                event,
                Event::Op {
                    op: CanvasOp::Draw(DrawOp::FillRect {
                        fill: Fill::Color(color),
                        ..
                    }),
                    state,
                    ..
                } if color.components[3] < 0.2 && state.composite == Composite::SourceAtop
            )
        });
        assert!(darkened, "selection must darken with a source-atop fill");
    }

    #[test]
    fn smoothing_draws_half_disks_from_neighbor_fills() {
        let mut mapper = Mapper::new(Box::new(MemoryStore::new()));
        let mut host = RecordHost::new();
        let mut fills = FillCache::new();
        let mut cache = MegaTileCache::new();

        let (object, mut render) =
            built_render(&mut mapper, &mut host, &mut fills, Vec3::new(100.0, 100.0, 0.0), 40.0);
        let mut focus_tiles = Vec::new();
        for layer in &mut render.layers {
            cache.composite_layer(&mut host, 5, object, layer, false);
            focus_tiles.extend(layer.focus_tiles.values().cloned());
        }
        assert!(!focus_tiles.is_empty());

        host.clear_events();
        cache.smooth_focus_tiles(&mut host, 5, &focus_tiles, |_| false);

        let half_disks = host
            .events()
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::Op {
                        op: CanvasOp::Draw(DrawOp::FillWedge {
                            fill: Fill::Pattern(_),
                            ..
                        }),
                        state,
                        ..
                    } if state.alpha == 0.5
                )
            })
            .count();
        assert!(half_disks > 0, "smoothing draws pattern half-disks at half alpha");
    }
}
