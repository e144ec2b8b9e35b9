// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render context: viewport, input, caches, and undo.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};
use kurbo::{Point, Rect, Vec2};
use ridgeline_canvas::CanvasId;
use ridgeline_geom::Vec3;
use ridgeline_map::{HookBus, MapEvent, Mapper, NodeRef, Result};
use ridgeline_raster::{FillCache, MegaTileCache, NodeRenderCache, Part, Zoom};
use tracing::debug;

use crate::action::Action;
use crate::brush::Brush;
use crate::config::ViewConfig;
use crate::drag::DragEvent;
use crate::input::{Key, KeyEvent, Modifiers, MouseButton};
use crate::keymap::{ShortcutId, ShortcutRegistry};
use crate::selection::Selection;

/// Events emitted by the render context on its own hook bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    /// The zoom level changed (applied at recalc time).
    ChangedZoom(u32),
}

/// A pending in-place label edit, anchored at a node's label position.
///
/// The host owns the actual text input; the context records which node is
/// being renamed and where the input belongs, and applies the rename as
/// an undoable action on commit.
#[derive(Clone, Debug)]
pub struct NameEdit {
    /// The node being renamed.
    pub node: NodeRef,
    /// Canvas position to anchor the input at.
    pub anchor: Point,
}

/// A drawn label's anchor and font size, recorded during recalc.
#[derive(Clone, Debug)]
pub(crate) struct Label {
    pub anchor: Point,
    pub size: f64,
}

/// Pending invalidation work, filled by the mapper hook listener and
/// drained by the recalc loop.
#[derive(Debug, Default)]
pub(crate) struct RecalcQueues {
    pub updated: Vec<NodeRef>,
    pub removed: Vec<NodeRef>,
    pub translated: Vec<NodeRef>,
    pub selected: Vec<NodeRef>,
    pub viewport: bool,
}

impl RecalcQueues {
    pub(crate) fn is_empty(&self) -> bool {
        self.updated.is_empty()
            && self.removed.is_empty()
            && self.translated.is_empty()
            && self.selected.is_empty()
            && !self.viewport
    }
}

/// The interactive editor core.
///
/// Owns the mapper, the render caches, the viewport state, both
/// selections, the undo and redo stacks, and the per-button drag map.
/// The host feeds it input events and drives the loops through
/// [`Scheduler`](crate::Scheduler), passing its
/// [`CanvasHost`](ridgeline_canvas::CanvasHost) into each tick.
pub struct RenderContext {
    pub(crate) mapper: Mapper,
    pub(crate) config: ViewConfig,
    pub(crate) display: CanvasId,
    pub(crate) width: f64,
    pub(crate) height: f64,
    zoom: Zoom,
    requested_zoom: Zoom,
    pub(crate) scroll: Vec2,
    current_layer: String,
    pub(crate) brush: Brush,
    pub(crate) hover: Selection,
    pub(crate) active: Selection,
    pub(crate) pegs: [Option<Vec3>; 2],
    undo_stack: Vec<Action>,
    redo_stack: Vec<Action>,
    pressed_keys: HashSet<Key>,
    drags: HashMap<MouseButton, DragEvent>,
    pub(crate) mouse: Point,
    mouse_history: VecDeque<Point>,
    pub(crate) queues: Rc<RefCell<RecalcQueues>>,
    pub(crate) renders: NodeRenderCache,
    pub(crate) megatiles: MegaTileCache,
    pub(crate) fills: FillCache,
    pub(crate) labels: HashMap<NodeRef, Label>,
    shortcuts: ShortcutRegistry,
    hooks: HookBus<ViewEvent>,
    pub(crate) debug_overlay: bool,
    pub(crate) want_redraw: bool,
    recheck_requested: bool,
    name_edit: Option<NameEdit>,
}

impl core::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderContext")
            .field("zoom", &self.zoom)
            .field("scroll", &self.scroll)
            .field("layer", &self.current_layer)
            .field("undo_depth", &self.undo_stack.len())
            .finish_non_exhaustive()
    }
}

impl RenderContext {
    /// Creates a context over `mapper`, drawing to `display`.
    ///
    /// Registers the hook listener that feeds the recalc queues; the
    /// whole viewport starts dirty.
    #[must_use]
    pub fn new(mut mapper: Mapper, display: CanvasId, width: f64, height: f64) -> Self {
        let config = ViewConfig::default();
        let queues = Rc::new(RefCell::new(RecalcQueues {
            viewport: true,
            ..RecalcQueues::default()
        }));
        let sink = queues.clone();
        mapper.hooks_mut().on(move |event: &MapEvent| {
            let mut pending = sink.borrow_mut();
            match event {
                MapEvent::InsertNode(node) | MapEvent::UpdateNode(node) => {
                    pending.updated.push(*node);
                }
                MapEvent::RemoveNodes(nodes) => pending.removed.extend(nodes),
                MapEvent::UnremoveNodes(nodes) => pending.updated.extend(nodes),
                MapEvent::TranslateNodes(nodes) => pending.translated.extend(nodes),
                _ => {}
            }
            Ok(())
        });

        let current_layer = mapper.layers().default_layer().id().to_owned();
        let brush = Brush::add(&mapper, &current_layer);
        Self {
            mapper,
            display,
            width,
            height,
            zoom: Zoom::new(config.default_zoom),
            requested_zoom: Zoom::new(config.default_zoom),
            scroll: Vec2::ZERO,
            current_layer,
            brush,
            hover: Selection::new(),
            active: Selection::new(),
            pegs: [None, None],
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            pressed_keys: HashSet::new(),
            drags: HashMap::new(),
            mouse: Point::ZERO,
            mouse_history: VecDeque::new(),
            queues,
            renders: NodeRenderCache::new(),
            megatiles: MegaTileCache::new(),
            fills: FillCache::new(),
            labels: HashMap::new(),
            shortcuts: ShortcutRegistry::new(),
            hooks: HookBus::new(),
            debug_overlay: false,
            want_redraw: true,
            recheck_requested: false,
            name_edit: None,
            config,
        }
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    /// The mapper.
    #[must_use]
    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    /// The mapper, mutably.
    pub fn mapper_mut(&mut self) -> &mut Mapper {
        &mut self.mapper
    }

    /// The view configuration.
    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// The current zoom level.
    #[must_use]
    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    /// The zoom that will apply at the next recalc.
    #[must_use]
    pub fn requested_zoom(&self) -> Zoom {
        self.requested_zoom
    }

    /// The scroll offset (absolute canvas-pixel origin of the viewport).
    #[must_use]
    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    /// The current drawing layer key.
    #[must_use]
    pub fn current_layer(&self) -> &str {
        &self.current_layer
    }

    /// Sets the current drawing layer and notifies the brush.
    pub fn set_current_layer(&mut self, layer: &str) {
        self.current_layer = layer.to_owned();
        let mut brush = std::mem::replace(&mut self.brush, Brush::distance_peg(0));
        brush.signal_layer_change(self);
        self.brush = brush;
        self.want_redraw = true;
    }

    /// The active brush.
    #[must_use]
    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    /// Replaces the active brush.
    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
        self.want_redraw = true;
    }

    /// The hover selection.
    #[must_use]
    pub fn hover_selection(&self) -> &Selection {
        &self.hover
    }

    /// The active selection.
    #[must_use]
    pub fn active_selection(&self) -> &Selection {
        &self.active
    }

    /// The two distance-peg points, in map space.
    #[must_use]
    pub fn pegs(&self) -> &[Option<Vec3>; 2] {
        &self.pegs
    }

    /// The context's own hook bus.
    pub fn hooks_mut(&mut self) -> &mut HookBus<ViewEvent> {
        &mut self.hooks
    }

    /// Undo stack depth.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Redo stack depth.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// The pending name edit, if one is open.
    #[must_use]
    pub fn name_edit(&self) -> Option<&NameEdit> {
        self.name_edit.as_ref()
    }

    /// The current pointer position in canvas pixels.
    #[must_use]
    pub fn mouse_position(&self) -> Point {
        self.mouse
    }

    /// Recent pointer positions, most recent last.
    #[must_use]
    pub fn mouse_history(&self) -> &VecDeque<Point> {
        &self.mouse_history
    }

    /// Whether the debug overlay is enabled.
    #[must_use]
    pub fn debug_overlay_enabled(&self) -> bool {
        self.debug_overlay
    }

    /// Resizes the viewport and schedules a full recalc.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.queues.borrow_mut().viewport = true;
        self.want_redraw = true;
    }

    // ---------------------------------------------------------------
    // Coordinate conversions
    // ---------------------------------------------------------------

    /// Converts screen pixels to world units at the current zoom.
    #[must_use]
    pub fn pixels_to_units(&self, pixels: f64) -> f64 {
        self.zoom.pixels_to_units(pixels)
    }

    /// Converts world units to screen pixels at the current zoom.
    #[must_use]
    pub fn units_to_pixels(&self, units: f64) -> f64 {
        self.zoom.units_to_pixels(units)
    }

    /// Converts a canvas point to a map-space point: scroll is added,
    /// then pixels become units.
    #[must_use]
    pub fn canvas_point_to_map(&self, point: Point) -> Vec3 {
        Vec3::new(
            self.pixels_to_units(point.x + self.scroll.x),
            self.pixels_to_units(point.y + self.scroll.y),
            0.0,
        )
    }

    /// Converts a map-space point to a canvas point: units become
    /// pixels, then scroll is subtracted.
    #[must_use]
    pub fn map_point_to_canvas(&self, point: Vec3) -> Point {
        Point::new(
            self.units_to_pixels(point.x) - self.scroll.x,
            self.units_to_pixels(point.y) - self.scroll.y,
        )
    }

    /// The absolute position of a canvas point (scroll applied).
    #[must_use]
    pub fn absolute_point(&self, point: Point) -> Point {
        Point::new(point.x + self.scroll.x, point.y + self.scroll.y)
    }

    /// The viewport in absolute canvas pixels.
    #[must_use]
    pub fn screen_rect_absolute(&self) -> Rect {
        Rect::new(
            self.scroll.x,
            self.scroll.y,
            self.scroll.x + self.width,
            self.scroll.y + self.height,
        )
    }

    // ---------------------------------------------------------------
    // Zoom and scroll
    // ---------------------------------------------------------------

    /// Requests a zoom level; it applies at the next recalc, keeping the
    /// map point under the cursor fixed.
    pub fn request_zoom(&mut self, zoom: Zoom) {
        self.requested_zoom = zoom;
    }

    /// Applies a pending zoom change. Called from the recalc loop.
    pub(crate) fn apply_requested_zoom(&mut self) -> Result<()> {
        if self.requested_zoom == self.zoom {
            return Ok(());
        }
        let anchor = self.mouse;
        let fixed = self.canvas_point_to_map(anchor);
        self.zoom = self.requested_zoom;
        self.scroll = Vec2::new(
            self.units_to_pixels(fixed.x) - anchor.x,
            self.units_to_pixels(fixed.y) - anchor.y,
        );
        self.queues.borrow_mut().viewport = true;
        debug!(zoom = self.zoom.level(), "applied zoom change");
        self.hooks
            .emit(&ViewEvent::ChangedZoom(self.zoom.level()))
            .map_err(|error| ridgeline_map::MapError::Hook(error.to_string()))?;
        Ok(())
    }

    /// Scrolls by a pixel delta.
    pub fn scroll_by(&mut self, delta: Vec2) {
        self.scroll += delta;
        self.queues.borrow_mut().viewport = true;
        self.want_redraw = true;
    }

    /// Recenters the view and restores the default zoom.
    pub fn recenter(&mut self) {
        self.scroll = Vec2::ZERO;
        self.requested_zoom = Zoom::new(self.config.default_zoom);
        self.queues.borrow_mut().viewport = true;
        self.want_redraw = true;
    }

    // ---------------------------------------------------------------
    // Hit testing
    // ---------------------------------------------------------------

    /// Returns the topmost drawn part under a canvas point on `layer`.
    ///
    /// Resolves the megatile containing the point, then scans its parts
    /// in reverse render order.
    #[must_use]
    pub fn drawn_part_at_canvas_point(&self, point: Point, layer: &str) -> Option<Part> {
        let absolute = self.absolute_point(point);
        let key = ridgeline_raster::MegaKey::containing(self.zoom.level(), absolute);
        self.megatiles
            .get(key)
            .and_then(|tile| tile.part_at(absolute, layer))
            .cloned()
    }

    /// Climbs to the topmost ancestor of a node.
    pub(crate) fn object_root(&mut self, node: NodeRef) -> Result<NodeRef> {
        let mut current = node;
        while let Some(parent) = self.mapper.node_parent(current)? {
            current = parent;
        }
        Ok(current)
    }

    // ---------------------------------------------------------------
    // Actions and undo
    // ---------------------------------------------------------------

    /// Performs an action and records its inverse for undo.
    ///
    /// No-op actions are dropped without touching the stacks.
    pub fn perform_action(&mut self, action: Action) -> Result<()> {
        if action.empty() {
            return Ok(());
        }
        let inverse = action.perform(self)?;
        self.undo_stack.push(inverse);
        self.redo_stack.clear();
        Ok(())
    }

    /// Pushes an already-performed action's inverse onto the undo stack.
    pub(crate) fn push_undo(&mut self, inverse: Action) {
        if !inverse.empty() {
            self.undo_stack.push(inverse);
            self.redo_stack.clear();
        }
    }

    /// Pops and performs the top undo action.
    pub fn undo(&mut self) -> Result<()> {
        if let Some(action) = self.undo_stack.pop() {
            let inverse = action.perform(self)?;
            self.redo_stack.push(inverse);
        }
        Ok(())
    }

    /// Pops and performs the top redo action.
    pub fn redo(&mut self) -> Result<()> {
        if let Some(action) = self.redo_stack.pop() {
            let inverse = action.perform(self)?;
            self.undo_stack.push(inverse);
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Keyboard input
    // ---------------------------------------------------------------

    /// Registers a re-bindable keyboard shortcut.
    ///
    /// Registered handlers run before the built-in keymap; a handler
    /// returning `false` suppresses default handling for that event.
    pub fn register_keyboard_shortcut<F, H>(&mut self, filter: F, handler: H) -> ShortcutId
    where
        F: Fn(&KeyEvent) -> bool + 'static,
        H: FnMut(&mut Self, &KeyEvent) -> bool + 'static,
    {
        self.shortcuts.register(filter, handler)
    }

    /// Unregisters a shortcut.
    pub fn unregister_keyboard_shortcut(&mut self, id: ShortcutId) -> bool {
        self.shortcuts.unregister(id)
    }

    /// Handles a key press.
    pub fn key_down(&mut self, event: KeyEvent) -> Result<()> {
        self.pressed_keys.insert(event.key);

        let mut shortcuts = std::mem::take(&mut self.shortcuts);
        let continue_default = shortcuts.dispatch(self, &event);
        self.shortcuts = shortcuts;
        if !continue_default {
            return Ok(());
        }

        let Modifiers { ctrl, .. } = event.modifiers;
        match event.key {
            Key::Char('z') if ctrl => self.undo()?,
            Key::Char('y') if ctrl => self.redo()?,
            Key::Char('c') if ctrl => self.recenter(),
            Key::Char('+') if ctrl => self.request_zoom(self.requested_zoom.zoom_in()),
            Key::Char('-') if ctrl => self.request_zoom(self.requested_zoom.zoom_out()),
            Key::Char('a') if !ctrl => {
                self.brush = Brush::add(&self.mapper, &self.current_layer);
            }
            Key::Char('s') if !ctrl => self.brush = Brush::select(),
            Key::Char('d') if !ctrl => self.brush = Brush::delete(),
            Key::Char('1') if !ctrl => self.brush = Brush::distance_peg(0),
            Key::Char('2') if !ctrl => self.brush = Brush::distance_peg(1),
            Key::Char('l') if !ctrl => {
                let next = self
                    .mapper
                    .layers()
                    .next_after(&self.current_layer)
                    .id()
                    .to_owned();
                self.set_current_layer(&next);
            }
            Key::Char('`') => self.debug_overlay = !self.debug_overlay,
            Key::Char('n') if !ctrl => self.begin_name_edit(),
            Key::ArrowUp => self.scroll_by(Vec2::new(0.0, -self.height / 3.0)),
            Key::ArrowDown => self.scroll_by(Vec2::new(0.0, self.height / 3.0)),
            Key::ArrowLeft => self.scroll_by(Vec2::new(-self.width / 3.0, 0.0)),
            Key::ArrowRight => self.scroll_by(Vec2::new(self.width / 3.0, 0.0)),
            _ => {}
        }
        self.want_redraw = true;
        Ok(())
    }

    /// Handles a key release.
    pub fn key_up(&mut self, key: Key) {
        self.pressed_keys.remove(&key);
    }

    /// Handles a wheel step. Positive `delta` is wheel-down.
    ///
    /// Plain wheel zooms; with "q" held it cycles the brush type and
    /// with "w" held it resizes the brush.
    pub fn wheel(&mut self, delta: f64) -> Result<()> {
        if self.pressed_keys.contains(&Key::Char('q')) {
            let mut brush = std::mem::replace(&mut self.brush, Brush::distance_peg(0));
            if delta > 0.0 {
                brush.increment(self);
            } else {
                brush.decrement(self);
            }
            self.brush = brush;
        } else if self.pressed_keys.contains(&Key::Char('w')) {
            let (min, max) = (self.config.brush_size_min, self.config.brush_size_max);
            let mut brush = std::mem::replace(&mut self.brush, Brush::distance_peg(0));
            if delta > 0.0 {
                brush.shrink(min, max);
            } else {
                brush.enlarge(min, max);
            }
            self.brush = brush;
        } else if delta > 0.0 {
            self.request_zoom(self.requested_zoom.zoom_out());
        } else {
            self.request_zoom(self.requested_zoom.zoom_in());
        }
        self.want_redraw = true;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Pointer input
    // ---------------------------------------------------------------

    /// Handles a button press.
    pub fn mouse_down(
        &mut self,
        button: MouseButton,
        point: Point,
        modifiers: Modifiers,
    ) -> Result<()> {
        self.mouse = point;
        match button {
            MouseButton::Left => {
                if let Some(drag) = self.activate_brush(point, modifiers)? {
                    self.drags.insert(MouseButton::Left, drag);
                }
            }
            MouseButton::Right => {
                // Right while drawing cancels the left drag outright.
                if let Some(mut drag) = self.drags.remove(&MouseButton::Left) {
                    drag.cancel(self)?;
                } else {
                    self.drags
                        .insert(MouseButton::Right, DragEvent::pan(point));
                }
            }
        }
        Ok(())
    }

    /// Handles pointer movement.
    pub fn mouse_move(&mut self, point: Point) -> Result<()> {
        self.mouse = point;
        self.mouse_history.push_back(point);
        if self.mouse_history.len() > 32 {
            self.mouse_history.pop_front();
        }
        self.recheck_requested = true;

        let mut drags = std::mem::take(&mut self.drags);
        let mut result = Ok(());
        for drag in drags.values_mut() {
            if result.is_ok() {
                result = drag.next(self, point);
            }
        }
        self.drags = drags;
        self.want_redraw = true;
        if let Err(error) = &result {
            // A failing handler cancels whatever was in flight so the
            // map is not left mid-gesture.
            debug!(%error, "input handler failed; cancelling drags");
            let _ = self.mouse_leave();
        }
        result
    }

    /// Handles a button release.
    pub fn mouse_up(&mut self, button: MouseButton, point: Point) -> Result<()> {
        if let Some(drag) = self.drags.remove(&button) {
            drag.end(self, point)?;
        }
        Ok(())
    }

    /// Cancels every in-flight drag (pointer left the canvas).
    pub fn mouse_leave(&mut self) -> Result<()> {
        let drags = std::mem::take(&mut self.drags);
        for (_, mut drag) in drags {
            drag.cancel(self)?;
        }
        Ok(())
    }

    /// Returns `true` if any drag is in flight.
    #[must_use]
    pub fn dragging(&self) -> bool {
        !self.drags.is_empty()
    }

    // ---------------------------------------------------------------
    // Hover recheck
    // ---------------------------------------------------------------

    /// Asks the recheck loop to refresh the hover selection.
    pub fn request_recheck(&mut self) {
        self.recheck_requested = true;
    }

    /// The selection-recheck tick: refreshes hover from a hit test and
    /// re-derives both selections' expansions.
    ///
    /// Skipped while any button is down, so drags see a stable hover.
    pub fn recheck_tick(&mut self) -> Result<()> {
        if !self.recheck_requested || !self.drags.is_empty() {
            return Ok(());
        }
        self.recheck_requested = false;

        let previous: Vec<NodeRef> = self.hover.origins().to_vec();
        let hit = self.drawn_part_at_canvas_point(self.mouse, &self.current_layer.clone());
        self.hover = match hit {
            Some(part) => Selection::from_origins(&mut self.mapper, &[part.node])?,
            None => Selection::new(),
        };
        self.active.recompute(&mut self.mapper)?;

        // Selection changes recomposite the affected objects so the
        // darkening tracks the pointer. An unchanged hover enqueues
        // nothing.
        if previous.as_slice() == self.hover.origins() {
            return Ok(());
        }
        let mut changed: Vec<NodeRef> = Vec::new();
        changed.extend(previous.iter().copied());
        changed.extend(self.hover.origins().iter().copied());
        if !changed.is_empty() {
            let mut roots = Vec::new();
            for node in changed {
                let root = self.object_root(node)?;
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
            self.queues.borrow_mut().selected.extend(roots);
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Name editing
    // ---------------------------------------------------------------

    /// Opens a name edit for the hovered node, if any.
    pub fn begin_name_edit(&mut self) {
        let Some(part) = self.drawn_part_at_canvas_point(self.mouse, &self.current_layer.clone())
        else {
            return;
        };
        let Ok(root) = self.object_root(part.node) else {
            return;
        };
        let anchor = self
            .labels
            .get(&root)
            .map_or(self.mouse, |label| label.anchor);
        self.name_edit = Some(NameEdit { node: root, anchor });
    }

    /// Commits the pending name edit as an undoable rename.
    pub fn commit_name_edit(&mut self, name: &str) -> Result<()> {
        if let Some(edit) = self.name_edit.take() {
            self.perform_action(Action::ChangeName {
                node: edit.node,
                name: Some(name.to_owned()),
            })?;
        }
        Ok(())
    }

    /// Abandons the pending name edit (Escape or blur).
    pub fn cancel_name_edit(&mut self) {
        self.name_edit = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridgeline_canvas::{CanvasHost, RecordHost};
    use ridgeline_store::MemoryStore;

    fn context(host: &mut RecordHost) -> RenderContext {
        let display = host.create_canvas(800, 600);
        let mapper = Mapper::new(Box::new(MemoryStore::new()));
        RenderContext::new(mapper, display, 800.0, 600.0)
    }

    #[test]
    fn conversions_are_inverse_at_default_zoom() {
        let mut host = RecordHost::new();
        let ctx = context(&mut host);
        for pixels in [1.0, 250.0, 10_000.0] {
            let units = ctx.pixels_to_units(pixels);
            assert!((ctx.units_to_pixels(units) - pixels).abs() < 1e-9);
        }
    }

    #[test]
    fn canvas_and_map_points_round_trip_through_scroll() {
        let mut host = RecordHost::new();
        let mut ctx = context(&mut host);
        ctx.scroll_by(Vec2::new(120.0, -40.0));

        let canvas = Point::new(33.0, 77.0);
        let map = ctx.canvas_point_to_map(canvas);
        let back = ctx.map_point_to_canvas(map);
        assert!((back.x - canvas.x).abs() < 1e-9);
        assert!((back.y - canvas.y).abs() < 1e-9);
    }

    #[test]
    fn zoom_applies_at_recalc_and_keeps_the_cursor_anchor() {
        let mut host = RecordHost::new();
        let mut ctx = context(&mut host);
        ctx.mouse = Point::new(400.0, 300.0);

        let before = ctx.canvas_point_to_map(ctx.mouse);
        ctx.wheel(-1.0).unwrap();
        assert_eq!(ctx.zoom(), Zoom::new(5), "zoom waits for recalc");

        ctx.apply_requested_zoom().unwrap();
        assert_eq!(ctx.zoom(), Zoom::new(4));
        let after = ctx.map_point_to_canvas(before);
        assert!((after.x - 400.0).abs() < 1.0);
        assert!((after.y - 300.0).abs() < 1.0);
    }

    #[test]
    fn recenter_resets_scroll_and_zoom() {
        let mut host = RecordHost::new();
        let mut ctx = context(&mut host);
        ctx.scroll_by(Vec2::new(500.0, 500.0));
        ctx.wheel(1.0).unwrap();
        ctx.apply_requested_zoom().unwrap();

        ctx.key_down(KeyEvent::new(Key::Char('c'), Modifiers::CTRL))
            .unwrap();
        ctx.apply_requested_zoom().unwrap();

        assert_eq!(ctx.scroll(), Vec2::ZERO);
        assert_eq!(ctx.zoom(), Zoom::DEFAULT);
    }

    #[test]
    fn brush_keys_switch_brushes() {
        let mut host = RecordHost::new();
        let mut ctx = context(&mut host);

        ctx.key_down(KeyEvent::new(Key::Char('s'), Modifiers::NONE))
            .unwrap();
        assert!(matches!(ctx.brush(), Brush::Select(_)));

        ctx.key_down(KeyEvent::new(Key::Char('d'), Modifiers::NONE))
            .unwrap();
        assert!(matches!(ctx.brush(), Brush::Delete(_)));

        ctx.key_down(KeyEvent::new(Key::Char('a'), Modifiers::NONE))
            .unwrap();
        assert!(matches!(ctx.brush(), Brush::Add(_)));

        ctx.key_down(KeyEvent::new(Key::Char('1'), Modifiers::NONE))
            .unwrap();
        assert!(matches!(ctx.brush(), Brush::DistancePeg(0)));
    }

    #[test]
    fn layer_cycling_wraps_through_the_registry() {
        let mut host = RecordHost::new();
        let mut ctx = context(&mut host);
        assert_eq!(ctx.current_layer(), "geographical");

        for expected in ["political", "annotation", "geographical"] {
            ctx.key_down(KeyEvent::new(Key::Char('l'), Modifiers::NONE))
                .unwrap();
            assert_eq!(ctx.current_layer(), expected);
        }
    }

    #[test]
    fn arrows_scroll_by_a_third_of_the_screen() {
        let mut host = RecordHost::new();
        let mut ctx = context(&mut host);
        ctx.key_down(KeyEvent::new(Key::ArrowRight, Modifiers::NONE))
            .unwrap();
        assert_eq!(ctx.scroll(), Vec2::new(800.0 / 3.0, 0.0));
        ctx.key_down(KeyEvent::new(Key::ArrowUp, Modifiers::NONE))
            .unwrap();
        assert_eq!(ctx.scroll(), Vec2::new(800.0 / 3.0, -200.0));
    }

    #[test]
    fn custom_shortcuts_can_suppress_defaults() {
        let mut host = RecordHost::new();
        let mut ctx = context(&mut host);

        ctx.register_keyboard_shortcut(
            |event| event.key == Key::Char('d'),
            |_, _| false,
        );
        ctx.key_down(KeyEvent::new(Key::Char('d'), Modifiers::NONE))
            .unwrap();
        assert!(
            matches!(ctx.brush(), Brush::Add(_)),
            "suppressed default must not switch the brush"
        );
    }

    #[test]
    fn debug_overlay_toggles() {
        let mut host = RecordHost::new();
        let mut ctx = context(&mut host);
        assert!(!ctx.debug_overlay_enabled());
        ctx.key_down(KeyEvent::new(Key::Char('`'), Modifiers::NONE))
            .unwrap();
        assert!(ctx.debug_overlay_enabled());
        ctx.key_down(KeyEvent::new(Key::Char('`'), Modifiers::NONE))
            .unwrap();
        assert!(!ctx.debug_overlay_enabled());
    }
}
