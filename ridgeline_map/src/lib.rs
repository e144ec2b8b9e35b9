// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ridgeline Map: the graph layer between the store and the renderer.
//!
//! This crate owns everything about the map graph that is not persistence
//! and not pixels:
//!
//! - [`NodeRef`]/[`EdgeRef`]: copyable references into the store, read
//!   through a relation cache so repeated parent/children/edge lookups do
//!   not re-query the backend.
//! - [`NodeTypeRegistry`]/[`LayerRegistry`]: the immutable descriptors for
//!   terrain and annotation types and the logical drawing planes.
//! - [`HookBus`]: a tiny ordered event dispatcher used for store ↔ map ↔
//!   render signaling.
//! - [`Mapper`]: the high-level mutation surface. Every public mutation
//!   emits its hook event plus a catch-all [`MapEvent::Update`], tracks the
//!   unsaved-changes flag, and keeps the relation cache honest.
//!
//! # Example
//!
//! ```rust
//! use ridgeline_geom::Vec3;
//! use ridgeline_map::{InsertNodeOptions, Mapper, MapEvent};
//! use ridgeline_store::{MemoryStore, NodeRole};
//!
//! let mut mapper = Mapper::new(Box::new(MemoryStore::new()));
//! let region = mapper.insert_node(
//!     Vec3::new(0.0, 0.0, 0.0),
//!     NodeRole::Object,
//!     InsertNodeOptions {
//!         type_key: "grass".into(),
//!         radius: 12.0,
//!         ..InsertNodeOptions::default()
//!     },
//! )?;
//! assert!(mapper.has_unsaved_changes());
//! assert_eq!(mapper.radius(region)?, 12.0);
//! # Ok::<(), ridgeline_map::MapError>(())
//! ```

mod error;
mod hook;
mod mapper;
mod refs;
mod registry;

pub use error::MapError;
pub use hook::{HookBus, HookResult, ListenerId};
pub use mapper::{
    InsertNodeOptions, MapEvent, Mapper, meters_to_units, units_to_meters,
};
pub use refs::{DirectedEdge, EdgeRef, NodeRef};
pub use ridgeline_store::NodeRole;
pub use registry::{
    DrawMode, Layer, LayerKind, LayerRegistry, NodeType, NodeTypeRegistry, TypeFlags, TypeScale,
};

/// Convenience alias for map-layer results.
pub type Result<T> = core::result::Result<T, MapError>;
