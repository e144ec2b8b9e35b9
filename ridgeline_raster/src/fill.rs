// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fill-pattern cache.

use hashbrown::HashMap;
use kurbo::Rect;
use ridgeline_canvas::{CanvasHost, DrawOp, Fill, PatternId};
use ridgeline_map::NodeType;

use crate::tile::TILE_SIZE;

/// Cache of repeating tile patterns keyed by `(type, background type)`.
///
/// The first request for a pair builds a tile-sized canvas — background
/// color first, then the type's image (or its solid color when it has
/// none) — and wraps it as a repeating pattern. Patterns are never
/// evicted and are shared across zoom levels; tile pixels do not change
/// with zoom.
#[derive(Debug, Default)]
pub struct FillCache {
    patterns: HashMap<(String, String), PatternId>,
}

impl FillCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pattern for a node type over an optional background
    /// type, building it on first request.
    ///
    /// The same `(type, background)` pair always returns the same pattern
    /// id for the lifetime of the cache.
    pub fn pattern(
        &mut self,
        host: &mut dyn CanvasHost,
        node_type: &NodeType,
        background: Option<&NodeType>,
    ) -> PatternId {
        let key = (
            node_type.id().to_owned(),
            background.map_or_else(String::new, |bg| bg.id().to_owned()),
        );
        if let Some(&pattern) = self.patterns.get(&key) {
            return pattern;
        }

        let size = f64::from(TILE_SIZE);
        let full = Rect::new(0.0, 0.0, size, size);
        let canvas = host.create_canvas(TILE_SIZE, TILE_SIZE);
        if let Some(background) = background {
            host.draw(
                canvas,
                DrawOp::FillRect {
                    rect: full,
                    fill: Fill::Color(background.color()),
                },
            );
        }
        match node_type.image().and_then(|image_key| host.image(image_key)) {
            Some(image) => host.draw(
                canvas,
                DrawOp::DrawImage {
                    image,
                    src: None,
                    dst: full,
                },
            ),
            None => host.draw(
                canvas,
                DrawOp::FillRect {
                    rect: full,
                    fill: Fill::Color(node_type.color()),
                },
            ),
        }

        let pattern = host.create_pattern(canvas);
        self.patterns.insert(key, pattern);
        pattern
    }

    /// Returns the number of built patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if no patterns have been built yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
