// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input event vocabulary.
//!
//! The host translates its native keyboard and pointer events into these
//! types; the render context neither sees nor cares about the original
//! event source.

/// A key, reduced to what the editor binds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character, lowercased.
    Char(char),
    /// Up arrow.
    ArrowUp,
    /// Down arrow.
    ArrowDown,
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
    /// Enter / Return.
    Enter,
    /// Escape.
    Escape,
}

/// Modifier state accompanying a key or pointer event.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Control (or the platform's primary shortcut modifier).
    pub ctrl: bool,
    /// Shift.
    pub shift: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
    };

    /// Control held.
    pub const CTRL: Self = Self {
        ctrl: true,
        shift: false,
    };

    /// Shift held.
    pub const SHIFT: Self = Self {
        ctrl: false,
        shift: true,
    };
}

/// A key press with its modifiers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// The pressed key.
    pub key: Key,
    /// Modifier state at press time.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Creates a key event.
    #[must_use]
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// Pointer buttons the editor distinguishes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button; drives the active brush.
    Left,
    /// Secondary button; cancels the primary drag or pans.
    Right,
}
