// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lightweight references to stored entities.

use ridgeline_store::EntityId;

/// A reference to a node entity.
///
/// Refs are plain ids; all data access goes through the
/// [`Mapper`](crate::Mapper), which caches relations per entity. A ref does
/// not imply the node is still valid.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub EntityId);

/// A reference to an edge entity.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeRef(pub EntityId);

/// An edge viewed from one of its endpoints.
///
/// Transient pairing with no identity of its own; produced by
/// [`Mapper::node_edges`](crate::Mapper::node_edges) so iteration can walk
/// outward from a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DirectedEdge {
    /// The undirected edge entity.
    pub edge: EdgeRef,
    /// The endpoint this view starts from.
    pub start: NodeRef,
    /// The endpoint opposite `start`.
    pub other: NodeRef,
}

impl From<NodeRef> for EntityId {
    fn from(node: NodeRef) -> Self {
        node.0
    }
}

impl From<EdgeRef> for EntityId {
    fn from(edge: EdgeRef) -> Self {
        edge.0
    }
}
