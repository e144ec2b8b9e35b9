// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ridgeline Store: the persistent-store contract the map core consumes.
//!
//! The map graph lives behind the [`MapStore`] trait: entities with an
//! integer id, a kind tag, a soft-delete flag, and typed properties; nodes
//! with a role and optional parent; undirected edges with exactly two
//! distinct endpoints. The core never talks to a concrete database — it
//! only uses this trait, plus the snapshot format for portable
//! export/import.
//!
//! # Contract highlights
//!
//! - **Soft delete**: [`MapStore::invalidate`] clears the valid flag; for
//!   nodes it transitively clears every descendant. [`MapStore::revalidate`]
//!   restores a single entity, so undo machinery that recorded the full
//!   affected set can restore exactly what it removed.
//! - **Typed properties**: numbers, text, and 3D vectors. The provided
//!   default methods store numbers and vectors through the text accessors,
//!   which matches minimal backends; [`MemoryStore`] overrides them with
//!   typed columns.
//! - **Deterministic listings**: children, edges, and spatial scans come
//!   back in insertion order. Callers lean on this for stable stacking of
//!   equal-altitude terrain.
//! - **Versioned snapshots**: [`MapStore::export`] produces one opaque byte
//!   sequence. Import accepts the current [`FORMAT_VERSION`], upgrades a
//!   snapshot exactly one revision old in place, and refuses anything else.
//!
//! # Example
//!
//! ```rust
//! use ridgeline_geom::Vec3;
//! use ridgeline_store::{MapStore, MemoryStore, NodeRole, props};
//!
//! let mut store = MemoryStore::new();
//! let region = store.create_node(None, NodeRole::Object)?;
//! let sample = store.create_node(Some(region), NodeRole::Point)?;
//! store.set_vector(sample, props::CENTER, Vec3::new(4.0, 2.0, 0.0))?;
//! store.set_number(sample, props::RADIUS, 10.0)?;
//!
//! assert_eq!(store.node_children(region)?, vec![sample]);
//! # Ok::<(), ridgeline_store::StoreError>(())
//! ```

mod error;
mod memory;
mod property;
mod snapshot;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use property::PropertyValue;
pub use snapshot::{EntityRecord, FORMAT_VERSION, NodeRecord, Snapshot};
pub use store::{DirectedEdgeRecord, EntityId, EntityKind, MapStore, NodeRole, props};

/// Convenience alias for store results.
pub type Result<T> = core::result::Result<T, StoreError>;
