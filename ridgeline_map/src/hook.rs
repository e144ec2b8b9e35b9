// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered event dispatcher for store ↔ map ↔ render signaling.

use core::fmt;
use std::error::Error;

/// Result type returned by hook listeners.
pub type HookResult = Result<(), Box<dyn Error>>;

/// Handle for unregistering a listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A named-event dispatcher with ordered listeners.
///
/// Listeners run sequentially in registration order on every
/// [`HookBus::emit`]. A failing listener does not stop the rest from
/// running; `emit` returns the first error after all listeners have run.
///
/// The event payload is a caller-chosen enum, so dispatch stays typed
/// rather than stringly-keyed; listeners match on the variants they care
/// about and ignore the rest.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use ridgeline_map::HookBus;
///
/// let mut bus = HookBus::<u32>::new();
/// let seen = Rc::new(Cell::new(0));
///
/// let seen_in_hook = seen.clone();
/// let id = bus.on(move |event| {
///     seen_in_hook.set(*event);
///     Ok(())
/// });
///
/// bus.emit(&7).unwrap();
/// assert_eq!(seen.get(), 7);
///
/// bus.off(id);
/// bus.emit(&9).unwrap();
/// assert_eq!(seen.get(), 7);
/// ```
pub struct HookBus<E> {
    listeners: Vec<(ListenerId, Box<dyn FnMut(&E) -> HookResult>)>,
    next_id: u64,
}

impl<E> Default for HookBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for HookBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookBus")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<E> HookBus<E> {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Registers a listener and returns its unregistration handle.
    pub fn on<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&E) -> HookResult + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregisters a listener. Returns `true` if it was registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Dispatches `event` to every listener in registration order.
    ///
    /// All listeners run even when an earlier one fails; the first error is
    /// returned afterwards.
    pub fn emit(&mut self, event: &E) -> HookResult {
        let mut first_error = None;
        for (_, listener) in &mut self.listeners {
            if let Err(error) = listener(event) {
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
