// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ridgeline Editor: the interactive core of the map editor.
//!
//! [`RenderContext`] ties the stack together: it owns the
//! [`Mapper`](ridgeline_map::Mapper), the render caches, the viewport
//! (zoom, scroll, and the unit ↔ pixel conversions), the undo and redo
//! stacks, the selections, and the per-button drag state. The host feeds
//! it pointer and keyboard events and drives three cooperative loops
//! through [`Scheduler`]:
//!
//! 1. the redraw loop composites visible megatiles and overlays,
//! 2. the recalc loop applies pending zoom changes and rebuilds
//!    invalidated renders and megatiles,
//! 3. the recheck loop refreshes the hover selection from hit tests.
//!
//! Editing is strategy + command shaped: a [`Brush`] turns pointer input
//! into [`DragEvent`]s, drags emit [`Action`]s, and every performed
//! action returns its inverse, which is what the undo stacks store.
//!
//! Nothing here talks to a real screen: drawing goes through
//! [`ridgeline_canvas::CanvasHost`], so the whole crate runs headless
//! under the recording backend.

mod action;
mod brush;
mod config;
mod context;
mod drag;
mod input;
mod keymap;
mod overlay;
mod recalc;
mod scheduler;
mod selection;

pub use action::Action;
pub use brush::{AddBrush, Brush, DeleteBrush, SelectBrush};
pub use config::ViewConfig;
pub use context::{NameEdit, RenderContext, ViewEvent};
pub use drag::{DragEvent, DrawKind};
pub use input::{Key, KeyEvent, Modifiers, MouseButton};
pub use keymap::{ShortcutId, ShortcutRegistry};
pub use scheduler::Scheduler;
pub use selection::Selection;
