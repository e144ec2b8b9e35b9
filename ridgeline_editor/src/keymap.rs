// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Re-bindable keyboard shortcuts.

use core::fmt;

use crate::context::RenderContext;
use crate::input::KeyEvent;

/// Handle for unregistering a shortcut.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShortcutId(u64);

type Filter = Box<dyn Fn(&KeyEvent) -> bool>;
type Handler = Box<dyn FnMut(&mut RenderContext, &KeyEvent) -> bool>;

/// Registry of keyboard shortcuts consulted before the built-in keymap.
///
/// Every registered entry whose filter matches a key event runs, in
/// registration order. A handler returning `true` lets default handling
/// continue; returning `false` swallows the event, so the built-in
/// binding (and later matching of the default keymap) is skipped.
#[derive(Default)]
pub struct ShortcutRegistry {
    entries: Vec<(ShortcutId, Filter, Handler)>,
    next_id: u64,
}

impl fmt::Debug for ShortcutRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcutRegistry")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl ShortcutRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shortcut.
    pub fn register<F, H>(&mut self, filter: F, handler: H) -> ShortcutId
    where
        F: Fn(&KeyEvent) -> bool + 'static,
        H: FnMut(&mut RenderContext, &KeyEvent) -> bool + 'static,
    {
        let id = ShortcutId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(filter), Box::new(handler)));
        id
    }

    /// Unregisters a shortcut. Returns `true` if it was registered.
    pub fn unregister(&mut self, id: ShortcutId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Runs matching handlers; returns `true` if default handling should
    /// continue.
    pub(crate) fn dispatch(&mut self, ctx: &mut RenderContext, event: &KeyEvent) -> bool {
        let mut continue_default = true;
        for (_, filter, handler) in &mut self.entries {
            if filter(event) {
                continue_default &= handler(ctx, event);
            }
        }
        continue_default
    }

    /// Returns the number of registered shortcuts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
