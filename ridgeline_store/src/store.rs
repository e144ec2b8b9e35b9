// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`MapStore`] trait and its small vocabulary types.

use ridgeline_geom::{Box3, Vec3};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Identifier of a stored entity.
///
/// Ids are allocated by the store, never reused within one store lifetime,
/// and stable across export/import.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// The kind tag of an entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// A free-standing record (settings, one-shot bookkeeping).
    Global,
    /// A node in the map graph.
    Node,
    /// An undirected edge between two nodes.
    Edge,
}

/// The structural role of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    /// The visible aggregate; its descendants describe its shape.
    Object,
    /// A border sample under an object.
    Point,
    /// A path vertex under an object.
    Path,
}

/// Well-known property names used by the map core.
pub mod props {
    /// Nominal position (vector, world units).
    pub const CENTER: &str = "center";
    /// Effective center used for rendering (vector, world units).
    pub const E_CENTER: &str = "eCenter";
    /// Influence radius for rendering and hit tests (number, world units).
    pub const RADIUS: &str = "radius";
    /// Key into the node-type registry (text).
    pub const TYPE: &str = "type";
    /// Key into the layer registry (text).
    pub const LAYER: &str = "layer";
    /// Displayed label (text, optional).
    pub const NAME: &str = "name";
}

/// An edge paired with the endpoint it is being viewed from.
///
/// This is a transient iteration convenience with no identity of its own;
/// the same edge appears once per endpoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DirectedEdgeRecord {
    /// The edge entity.
    pub edge: EntityId,
    /// The endpoint the view starts from.
    pub start: EntityId,
}

/// Abstract persistent store for map entities.
///
/// Implementations own id allocation, the parent/child and edge tables,
/// property storage, and snapshot encoding. Every listing method returns a
/// materialized, insertion-ordered `Vec`; backends backed by prepared
/// statements can collect their cursor into it.
pub trait MapStore {
    /// Returns the format version of the open store.
    fn version(&self) -> u32;

    /// Creates a bare entity of the given kind.
    fn create_entity(&mut self, kind: EntityKind) -> Result<EntityId>;

    /// Returns `true` if the id refers to any entity, valid or not.
    fn entity_exists(&self, id: EntityId) -> Result<bool>;

    /// Returns `true` if the entity exists and has not been soft-deleted.
    fn entity_valid(&self, id: EntityId) -> Result<bool>;

    /// Creates a node, optionally under a parent node.
    fn create_node(&mut self, parent: Option<EntityId>, role: NodeRole) -> Result<EntityId>;

    /// Returns the structural role of a node.
    fn node_role(&self, id: EntityId) -> Result<NodeRole>;

    /// Returns the parent of a node, if it has one.
    fn node_parent(&self, id: EntityId) -> Result<Option<EntityId>>;

    /// Returns the direct children of a node in insertion order.
    fn node_children(&self, id: EntityId) -> Result<Vec<EntityId>>;

    /// Returns `true` if the node has at least one child.
    fn node_has_children(&self, id: EntityId) -> Result<bool> {
        Ok(!self.node_children(id)?.is_empty())
    }

    /// Creates an undirected edge between two distinct nodes.
    fn create_edge(&mut self, a: EntityId, b: EntityId) -> Result<EntityId>;

    /// Returns the edges touching a node, viewed from that node.
    fn node_edges(&self, id: EntityId) -> Result<Vec<DirectedEdgeRecord>>;

    /// Returns both endpoints of an edge.
    fn edge_nodes(&self, edge: EntityId) -> Result<(EntityId, EntityId)>;

    /// Returns the endpoint of `edge` that is not `endpoint`.
    fn edge_other_node(&self, edge: EntityId, endpoint: EntityId) -> Result<EntityId> {
        let (a, b) = self.edge_nodes(edge)?;
        if endpoint == a {
            Ok(b)
        } else if endpoint == b {
            Ok(a)
        } else {
            Err(crate::StoreError::UnrelatedEndpoint { edge, endpoint })
        }
    }

    /// Returns the edge connecting `a` and `b`, if one exists.
    fn edge_between(&self, a: EntityId, b: EntityId) -> Result<Option<EntityId>> {
        for record in self.node_edges(a)? {
            if self.edge_other_node(record.edge, a)? == b {
                return Ok(Some(record.edge));
            }
        }
        Ok(None)
    }

    /// Returns a text property, or `None` if unset.
    fn text(&self, id: EntityId, name: &str) -> Result<Option<String>>;

    /// Sets a text property.
    fn set_text(&mut self, id: EntityId, name: &str, value: &str) -> Result<()>;

    /// Returns a numeric property, or `None` if unset.
    ///
    /// The default implementation parses the text column; a value that does
    /// not parse is treated as not set.
    fn number(&self, id: EntityId, name: &str) -> Result<Option<f64>> {
        Ok(self.text(id, name)?.and_then(|text| text.parse().ok()))
    }

    /// Sets a numeric property.
    ///
    /// The default implementation serializes through the text column.
    fn set_number(&mut self, id: EntityId, name: &str, value: f64) -> Result<()> {
        self.set_text(id, name, &value.to_string())
    }

    /// Returns a vector property, or `None` if unset.
    ///
    /// The default implementation parses the text column (three
    /// whitespace-separated components); a value that does not parse is
    /// treated as not set.
    fn vector(&self, id: EntityId, name: &str) -> Result<Option<Vec3>> {
        let Some(text) = self.text(id, name)? else {
            return Ok(None);
        };
        let mut parts = text.split_whitespace().map(str::parse::<f64>);
        let parsed = (parts.next(), parts.next(), parts.next(), parts.next());
        Ok(match parsed {
            (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => Some(Vec3::new(x, y, z)),
            _ => None,
        })
    }

    /// Sets a vector property.
    ///
    /// The default implementation serializes through the text column.
    fn set_vector(&mut self, id: EntityId, name: &str, value: Vec3) -> Result<()> {
        self.set_text(id, name, &format!("{} {} {}", value.x, value.y, value.z))
    }

    /// Soft-deletes an entity.
    ///
    /// For nodes this transitively soft-deletes every descendant, matching
    /// a cascading trigger in the relational layout.
    fn invalidate(&mut self, id: EntityId) -> Result<()>;

    /// Restores a single soft-deleted entity.
    ///
    /// Deliberately not transitive: undo machinery restores exactly the set
    /// it recorded when removing.
    fn revalidate(&mut self, id: EntityId) -> Result<()>;

    /// Returns all valid nodes with radius at least `min_radius` whose
    /// bounding sphere intersects `area`, in insertion order.
    fn nodes_touching_area(&self, area: Box3, min_radius: f64) -> Result<Vec<EntityId>>;

    /// Like [`MapStore::nodes_touching_area`], restricted to
    /// [`NodeRole::Object`] nodes.
    fn object_nodes_touching_area(&self, area: Box3, min_radius: f64) -> Result<Vec<EntityId>> {
        let mut objects = Vec::new();
        for id in self.nodes_touching_area(area, min_radius)? {
            if self.node_role(id)? == NodeRole::Object {
                objects.push(id);
            }
        }
        Ok(objects)
    }

    /// Encodes the full store as one portable byte sequence.
    fn export(&self) -> Result<Vec<u8>>;

    /// Replaces all state from a byte sequence produced by
    /// [`MapStore::export`].
    ///
    /// Runs the version check and the one-revision upgrade before any state
    /// is replaced.
    fn import(&mut self, bytes: &[u8]) -> Result<()>;

    /// Forces persistence of any buffered state.
    fn flush(&mut self) -> Result<()>;
}
