// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording reference host.
//!
//! [`RecordHost`] implements [`CanvasHost`] without producing pixels. It
//! tracks per-canvas state, logs every operation and blit together with
//! the state it ran under, and hands out resource ids from simple
//! counters. It exists for tests and debugging that want to assert on
//! what was drawn, not how it looked.

use hashbrown::HashMap;
use kurbo::Rect;

use crate::{CanvasHost, CanvasId, CanvasOp, Composite, ImageId, PatternId, StateOp};

/// Snapshot of one canvas's drawing state.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSnapshot {
    /// Global alpha for subsequent draws.
    pub alpha: f64,
    /// Composite mode for subsequent draws.
    pub composite: Composite,
    /// Line-dash pattern; empty means solid.
    pub dash: Vec<f64>,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            composite: Composite::SourceOver,
            dash: Vec::new(),
        }
    }
}

/// One recorded host interaction.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// An operation applied to a canvas.
    Op {
        /// The canvas drawn to.
        target: CanvasId,
        /// The operation.
        op: CanvasOp,
        /// The target's state after state ops, at draw time for draw ops.
        state: StateSnapshot,
    },
    /// A canvas-to-canvas copy.
    Blit {
        /// The canvas drawn to.
        target: CanvasId,
        /// The canvas copied from.
        source: CanvasId,
        /// Source rectangle.
        src: Rect,
        /// Destination rectangle.
        dst: Rect,
        /// The target's state at blit time.
        state: StateSnapshot,
    },
}

#[derive(Clone, Debug)]
struct CanvasRecord {
    width: u32,
    height: u32,
    alive: bool,
    state: StateSnapshot,
}

/// A [`CanvasHost`] that records instead of rasterizing.
///
/// Bundled images are registered up front with
/// [`RecordHost::register_image`]; text measurement is a fixed
/// advance-per-character model so overlay layout is deterministic.
#[derive(Debug, Default)]
pub struct RecordHost {
    canvases: Vec<CanvasRecord>,
    patterns: Vec<CanvasId>,
    images: Vec<(u32, u32)>,
    image_keys: HashMap<String, ImageId>,
    events: Vec<Event>,
}

impl RecordHost {
    /// Creates an empty host with no bundled images.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bundled image under `key`.
    pub fn register_image(&mut self, key: &str, width: u32, height: u32) -> ImageId {
        let id = ImageId(u32::try_from(self.images.len()).expect("image ids fit in u32"));
        self.images.push((width, height));
        self.image_keys.insert(key.into(), id);
        id
    }

    /// Returns every recorded event in order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Returns the operations applied to `target`, in order.
    #[must_use]
    pub fn ops_for(&self, target: CanvasId) -> Vec<&CanvasOp> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Op {
                    target: event_target,
                    op,
                    ..
                } if *event_target == target => Some(op),
                _ => None,
            })
            .collect()
    }

    /// Returns the blits applied to `target`, in order.
    #[must_use]
    pub fn blits_for(&self, target: CanvasId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|event| {
                matches!(event, Event::Blit { target: event_target, .. } if *event_target == target)
            })
            .collect()
    }

    /// Clears the event log but keeps resources and canvas state.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Returns the canvas a pattern was built from, if the id is live.
    #[must_use]
    pub fn pattern_source(&self, id: PatternId) -> Option<CanvasId> {
        self.patterns.get(id.0 as usize).copied()
    }

    /// Returns `true` if the canvas has not been destroyed.
    #[must_use]
    pub fn canvas_alive(&self, id: CanvasId) -> bool {
        self.canvases
            .get(id.0 as usize)
            .is_some_and(|canvas| canvas.alive)
    }

    /// Returns the number of live canvases.
    #[must_use]
    pub fn live_canvas_count(&self) -> usize {
        self.canvases.iter().filter(|canvas| canvas.alive).count()
    }

    fn canvas_mut(&mut self, id: CanvasId) -> &mut CanvasRecord {
        &mut self.canvases[id.0 as usize]
    }
}

impl CanvasHost for RecordHost {
    fn create_canvas(&mut self, width: u32, height: u32) -> CanvasId {
        let id = CanvasId(u32::try_from(self.canvases.len()).expect("canvas ids fit in u32"));
        self.canvases.push(CanvasRecord {
            width,
            height,
            alive: true,
            state: StateSnapshot::default(),
        });
        id
    }

    fn destroy_canvas(&mut self, id: CanvasId) {
        if let Some(canvas) = self.canvases.get_mut(id.0 as usize) {
            canvas.alive = false;
        }
    }

    fn canvas_size(&self, id: CanvasId) -> (u32, u32) {
        let canvas = &self.canvases[id.0 as usize];
        (canvas.width, canvas.height)
    }

    fn create_pattern(&mut self, source: CanvasId) -> PatternId {
        let id = PatternId(u32::try_from(self.patterns.len()).expect("pattern ids fit in u32"));
        self.patterns.push(source);
        id
    }

    fn image(&self, key: &str) -> Option<ImageId> {
        self.image_keys.get(key).copied()
    }

    fn image_size(&self, id: ImageId) -> (u32, u32) {
        self.images[id.0 as usize]
    }

    fn apply(&mut self, target: CanvasId, op: CanvasOp) {
        if let CanvasOp::State(state_op) = &op {
            let canvas = self.canvas_mut(target);
            match state_op {
                StateOp::SetAlpha(alpha) => canvas.state.alpha = *alpha,
                StateOp::SetComposite(composite) => canvas.state.composite = *composite,
                StateOp::SetDash(dash) => canvas.state.dash = dash.clone(),
            }
        }
        let state = self.canvases[target.0 as usize].state.clone();
        self.events.push(Event::Op { target, op, state });
    }

    fn blit(&mut self, target: CanvasId, source: CanvasId, src: Rect, dst: Rect) {
        let state = self.canvases[target.0 as usize].state.clone();
        self.events.push(Event::Blit {
            target,
            source,
            src,
            dst,
            state,
        });
    }

    fn measure_text(&self, text: &str, size: f64) -> f64 {
        // Fixed-advance model: six tenths of the font size per character.
        text.chars().count() as f64 * size * 0.6
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DrawOp, Fill};
    use kurbo::Point;
    use peniko::Color;

    #[test]
    fn draws_record_the_state_they_ran_under() {
        let mut host = RecordHost::new();
        let canvas = host.create_canvas(64, 64);

        host.state(canvas, StateOp::SetAlpha(0.5));
        host.fill_disk(
            canvas,
            Point::new(8.0, 8.0),
            4.0,
            Fill::Color(Color::WHITE),
        );

        let events = host.events();
        assert_eq!(events.len(), 2);
        match &events[1] {
            Event::Op { op, state, .. } => {
                assert!(matches!(op, CanvasOp::Draw(DrawOp::FillWedge { .. })));
                assert_eq!(state.alpha, 0.5);
            }
            Event::Blit { .. } => panic!("expected a draw event"),
        }
    }

    #[test]
    fn state_is_tracked_per_canvas() {
        let mut host = RecordHost::new();
        let a = host.create_canvas(16, 16);
        let b = host.create_canvas(16, 16);

        host.state(a, StateOp::SetComposite(Composite::SourceAtop));
        host.blit(b, a, Rect::new(0.0, 0.0, 16.0, 16.0), Rect::new(0.0, 0.0, 16.0, 16.0));

        match host.blits_for(b)[0] {
            Event::Blit { state, .. } => assert_eq!(state.composite, Composite::SourceOver),
            Event::Op { .. } => panic!("expected a blit event"),
        }
    }

    #[test]
    fn patterns_remember_their_source() {
        let mut host = RecordHost::new();
        let tile = host.create_canvas(16, 16);
        let pattern = host.create_pattern(tile);
        assert_eq!(host.pattern_source(pattern), Some(tile));
    }

    #[test]
    fn destroy_marks_canvases_dead() {
        let mut host = RecordHost::new();
        let canvas = host.create_canvas(16, 16);
        assert!(host.canvas_alive(canvas));
        assert_eq!(host.live_canvas_count(), 1);

        host.destroy_canvas(canvas);
        assert!(!host.canvas_alive(canvas));
        assert_eq!(host.live_canvas_count(), 0);
    }

    #[test]
    fn images_resolve_by_key() {
        let mut host = RecordHost::new();
        let id = host.register_image("grass", 16, 16);
        assert_eq!(host.image("grass"), Some(id));
        assert_eq!(host.image("lava"), None);
        assert_eq!(host.image_size(id), (16, 16));
    }

    #[test]
    fn ops_for_filters_by_target() {
        let mut host = RecordHost::new();
        let a = host.create_canvas(16, 16);
        let b = host.create_canvas(16, 16);

        host.draw(a, DrawOp::Clear { rect: None });
        host.draw(b, DrawOp::Clear { rect: None });
        host.draw(a, DrawOp::Clear { rect: None });

        assert_eq!(host.ops_for(a).len(), 2);
        assert_eq!(host.ops_for(b).len(), 1);
    }

    #[test]
    fn text_measurement_is_deterministic() {
        let host = RecordHost::new();
        assert_eq!(host.measure_text("abcd", 10.0), 24.0);
        assert_eq!(host.measure_text("", 10.0), 0.0);
    }
}
