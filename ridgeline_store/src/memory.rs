// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory reference backend.

use hashbrown::HashMap;
use ridgeline_geom::{Box3, Vec3};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::snapshot::{EntityRecord, FORMAT_VERSION, NodeRecord, Snapshot};
use crate::store::{DirectedEdgeRecord, EntityId, EntityKind, MapStore, NodeRole, props};
use crate::{PropertyValue, Result, StoreError};

#[derive(Clone, Debug)]
struct NodeData {
    role: NodeRole,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    edges: Vec<EntityId>,
}

/// Inline capacity for property rows.
///
/// Nodes carry about six well-known properties, so the common case never
/// leaves the entity allocation.
const INLINE_PROPERTIES: usize = 8;

#[derive(Clone, Debug)]
struct Entity {
    kind: EntityKind,
    valid: bool,
    /// Property rows in set order. Property sets are small, so a linear
    /// scan beats hashing and keeps exports deterministic.
    properties: SmallVec<[(String, PropertyValue); INLINE_PROPERTIES]>,
    node: Option<NodeData>,
    edge: Option<(EntityId, EntityId)>,
}

/// The in-memory reference implementation of [`MapStore`].
///
/// Entities, children, and edges are all kept in insertion order so every
/// listing and spatial scan is deterministic. Properties use typed columns
/// rather than the text round-trip of the trait defaults.
///
/// This backend is also the authority on snapshot semantics: `export`
/// writes the current [`FORMAT_VERSION`] and `import` accepts it or the
/// one-revision upgrade.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: u64,
    order: Vec<EntityId>,
    entities: HashMap<EntityId, Entity>,
}

impl MemoryStore {
    /// Creates an empty store at the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            order: Vec::new(),
            entities: HashMap::new(),
        }
    }

    fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(&id).ok_or(StoreError::UnknownEntity(id))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities
            .get_mut(&id)
            .ok_or(StoreError::UnknownEntity(id))
    }

    fn node_data(&self, id: EntityId) -> Result<&NodeData> {
        self.entity(id)?.node.as_ref().ok_or(StoreError::WrongKind {
            id,
            expected: "node",
        })
    }

    fn allocate(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.order.push(id);
        self.entities.insert(id, entity);
        id
    }

    fn property(&self, id: EntityId, name: &str) -> Result<Option<&PropertyValue>> {
        Ok(self
            .entity(id)?
            .properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value))
    }

    fn set_property(&mut self, id: EntityId, name: &str, value: PropertyValue) -> Result<()> {
        let entity = self.entity_mut(id)?;
        if let Some(slot) = entity.properties.iter_mut().find(|(key, _)| key == name) {
            slot.1 = value;
        } else {
            entity.properties.push((name.into(), value));
        }
        Ok(())
    }

    fn replace_from_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        let mut next = Self {
            next_id: snapshot.next_id,
            order: Vec::with_capacity(snapshot.entities.len()),
            entities: HashMap::with_capacity(snapshot.entities.len()),
        };

        // First pass: materialize every entity so parent/edge references in
        // the second pass can be checked.
        for record in &snapshot.entities {
            next.order.push(record.id);
            next.entities.insert(
                record.id,
                Entity {
                    kind: record.kind,
                    valid: record.valid,
                    properties: SmallVec::from_vec(record.properties.clone()),
                    node: record.node.as_ref().map(|node| NodeData {
                        role: node.role,
                        parent: node.parent,
                        children: Vec::new(),
                        edges: Vec::new(),
                    }),
                    edge: record.edge,
                },
            );
            next.next_id = next.next_id.max(record.id.0 + 1);
        }

        // Second pass: rebuild child and edge listings in entity insertion
        // order, which is also the order they were created in.
        for record in &snapshot.entities {
            if let Some(node) = &record.node
                && let Some(parent) = node.parent
            {
                let parent_entity = next
                    .entities
                    .get_mut(&parent)
                    .ok_or(StoreError::UnknownEntity(parent))?;
                let parent_node = parent_entity.node.as_mut().ok_or(StoreError::WrongKind {
                    id: parent,
                    expected: "node",
                })?;
                parent_node.children.push(record.id);
            }
            if let Some((a, b)) = record.edge {
                for endpoint in [a, b] {
                    let entity = next
                        .entities
                        .get_mut(&endpoint)
                        .ok_or(StoreError::UnknownEntity(endpoint))?;
                    let node = entity.node.as_mut().ok_or(StoreError::WrongKind {
                        id: endpoint,
                        expected: "node",
                    })?;
                    node.edges.push(record.id);
                }
            }
        }

        *self = next;
        Ok(())
    }
}

impl MapStore for MemoryStore {
    fn version(&self) -> u32 {
        FORMAT_VERSION
    }

    fn create_entity(&mut self, kind: EntityKind) -> Result<EntityId> {
        Ok(self.allocate(Entity {
            kind,
            valid: true,
            properties: SmallVec::new(),
            node: None,
            edge: None,
        }))
    }

    fn entity_exists(&self, id: EntityId) -> Result<bool> {
        Ok(self.entities.contains_key(&id))
    }

    fn entity_valid(&self, id: EntityId) -> Result<bool> {
        Ok(self.entities.get(&id).is_some_and(|entity| entity.valid))
    }

    fn create_node(&mut self, parent: Option<EntityId>, role: NodeRole) -> Result<EntityId> {
        if let Some(parent) = parent {
            // Fails early if the parent is missing or not a node.
            self.node_data(parent)?;
        }
        let id = self.allocate(Entity {
            kind: EntityKind::Node,
            valid: true,
            properties: SmallVec::new(),
            node: Some(NodeData {
                role,
                parent,
                children: Vec::new(),
                edges: Vec::new(),
            }),
            edge: None,
        });
        if let Some(parent) = parent {
            let parent_node = self
                .entities
                .get_mut(&parent)
                .and_then(|entity| entity.node.as_mut())
                .expect("parent checked above");
            parent_node.children.push(id);
        }
        Ok(id)
    }

    fn node_role(&self, id: EntityId) -> Result<NodeRole> {
        Ok(self.node_data(id)?.role)
    }

    fn node_parent(&self, id: EntityId) -> Result<Option<EntityId>> {
        Ok(self.node_data(id)?.parent)
    }

    fn node_children(&self, id: EntityId) -> Result<Vec<EntityId>> {
        Ok(self.node_data(id)?.children.clone())
    }

    fn create_edge(&mut self, a: EntityId, b: EntityId) -> Result<EntityId> {
        if a == b {
            return Err(StoreError::IdenticalEndpoints);
        }
        self.node_data(a)?;
        self.node_data(b)?;

        let id = self.allocate(Entity {
            kind: EntityKind::Edge,
            valid: true,
            properties: SmallVec::new(),
            node: None,
            edge: Some((a, b)),
        });
        for endpoint in [a, b] {
            let node = self
                .entities
                .get_mut(&endpoint)
                .and_then(|entity| entity.node.as_mut())
                .expect("endpoints checked above");
            node.edges.push(id);
        }
        Ok(id)
    }

    fn node_edges(&self, id: EntityId) -> Result<Vec<DirectedEdgeRecord>> {
        Ok(self
            .node_data(id)?
            .edges
            .iter()
            .map(|&edge| DirectedEdgeRecord { edge, start: id })
            .collect())
    }

    fn edge_nodes(&self, edge: EntityId) -> Result<(EntityId, EntityId)> {
        self.entity(edge)?.edge.ok_or(StoreError::WrongKind {
            id: edge,
            expected: "edge",
        })
    }

    fn text(&self, id: EntityId, name: &str) -> Result<Option<String>> {
        Ok(self
            .property(id, name)?
            .and_then(|value| value.as_text().map(str::to_owned)))
    }

    fn set_text(&mut self, id: EntityId, name: &str, value: &str) -> Result<()> {
        self.set_property(id, name, value.into())
    }

    fn number(&self, id: EntityId, name: &str) -> Result<Option<f64>> {
        Ok(self.property(id, name)?.and_then(|value| match value {
            PropertyValue::Number(number) => Some(*number),
            // Tolerate text-column writers; anything unparseable is unset.
            PropertyValue::Text(text) => text.parse().ok(),
            PropertyValue::Vector(_) => None,
        }))
    }

    fn set_number(&mut self, id: EntityId, name: &str, value: f64) -> Result<()> {
        self.set_property(id, name, value.into())
    }

    fn vector(&self, id: EntityId, name: &str) -> Result<Option<Vec3>> {
        Ok(self.property(id, name)?.and_then(PropertyValue::as_vector))
    }

    fn set_vector(&mut self, id: EntityId, name: &str, value: Vec3) -> Result<()> {
        self.set_property(id, name, value.into())
    }

    fn invalidate(&mut self, id: EntityId) -> Result<()> {
        self.entity(id)?;

        // Nodes cascade to every descendant, like a trigger would.
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let entity = self.entity_mut(current)?;
            entity.valid = false;
            if let Some(node) = &entity.node {
                trace!(?current, "invalidated node");
                pending.extend(node.children.iter().copied());
            }
        }
        Ok(())
    }

    fn revalidate(&mut self, id: EntityId) -> Result<()> {
        self.entity_mut(id)?.valid = true;
        Ok(())
    }

    fn nodes_touching_area(&self, area: Box3, min_radius: f64) -> Result<Vec<EntityId>> {
        let mut touching = Vec::new();
        for &id in &self.order {
            let entity = &self.entities[&id];
            if !entity.valid || entity.node.is_none() {
                continue;
            }
            let Some(radius) = self.number(id, props::RADIUS)? else {
                continue;
            };
            if radius < min_radius {
                continue;
            }
            let Some(center) = self.vector(id, props::CENTER)? else {
                continue;
            };
            if area.touches_sphere_xy(center, radius) {
                touching.push(id);
            }
        }
        Ok(touching)
    }

    fn export(&self) -> Result<Vec<u8>> {
        let snapshot = Snapshot {
            version: FORMAT_VERSION,
            next_id: self.next_id,
            entities: self
                .order
                .iter()
                .map(|&id| {
                    let entity = &self.entities[&id];
                    EntityRecord {
                        id,
                        kind: entity.kind,
                        valid: entity.valid,
                        node: entity.node.as_ref().map(|node| NodeRecord {
                            role: node.role,
                            parent: node.parent,
                        }),
                        edge: entity.edge,
                        properties: entity.properties.to_vec(),
                    }
                })
                .collect(),
        };
        debug!(entities = snapshot.entities.len(), "exporting snapshot");
        snapshot.encode()
    }

    fn import(&mut self, bytes: &[u8]) -> Result<()> {
        let snapshot = Snapshot::decode(bytes)?;
        debug!(entities = snapshot.entities.len(), "importing snapshot");
        self.replace_from_snapshot(snapshot)
    }

    fn flush(&mut self) -> Result<()> {
        // Nothing buffered; a durable backend would sync here.
        Ok(())
    }
}
