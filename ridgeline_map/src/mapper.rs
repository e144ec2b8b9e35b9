// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The high-level mutation surface over the store.

use hashbrown::{HashMap, HashSet};
use ridgeline_geom::{Box3, Vec3};
use ridgeline_store::{MapStore, NodeRole, props};
use tracing::debug;

use crate::hook::HookBus;
use crate::refs::{DirectedEdge, EdgeRef, NodeRef};
use crate::registry::{LayerRegistry, NodeType, NodeTypeRegistry};
use crate::{MapError, Result};

/// Converts world units to meters. One unit is two meters.
///
/// This pair of functions is the only place the ratio appears.
#[must_use]
pub fn units_to_meters(units: f64) -> f64 {
    units * 2.0
}

/// Converts meters to world units.
#[must_use]
pub fn meters_to_units(meters: f64) -> f64 {
    meters / 2.0
}

/// Events emitted by the [`Mapper`] on its hook bus.
#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
    /// A node was inserted.
    InsertNode(NodeRef),
    /// A node's properties changed.
    UpdateNode(NodeRef),
    /// Nodes were soft-deleted; carries the full affected set.
    RemoveNodes(Vec<NodeRef>),
    /// Soft-deleted nodes were restored.
    UnremoveNodes(Vec<NodeRef>),
    /// Nodes were translated; carries every moved node.
    TranslateNodes(Vec<NodeRef>),
    /// Edges were soft-deleted.
    RemoveEdges(Vec<EdgeRef>),
    /// Soft-deleted edges were restored.
    UnremoveEdges(Vec<EdgeRef>),
    /// Catch-all fired after every mutation.
    Update,
    /// The unsaved-changes flag flipped.
    UnsavedState(bool),
    /// A mutation failed; carries the error description.
    Error(String),
}

/// Options for [`Mapper::insert_node`].
#[derive(Clone, Debug, Default)]
pub struct InsertNodeOptions {
    /// Parent object node, if the new node describes an existing object.
    pub parent: Option<NodeRef>,
    /// Key into the node-type registry. Must name a registered type.
    pub type_key: String,
    /// Influence radius in world units.
    pub radius: f64,
    /// Layer key; defaults to the node type's layer.
    pub layer: Option<String>,
}

/// Cached relations of one node.
///
/// `None` means "not fetched yet". The cached listings are already
/// filtered down to valid entities.
#[derive(Clone, Debug, Default)]
struct RelationEntry {
    role: Option<NodeRole>,
    parent: Option<Option<NodeRef>>,
    children: Option<Vec<NodeRef>>,
    edges: Option<Vec<DirectedEdge>>,
    neighbors: Option<Vec<NodeRef>>,
}

/// Owner of the store, the registries, and the hook bus.
///
/// All reads go through a per-node relation cache; every mutation purges
/// the cached relations of the touched node, its parent, and its
/// neighbors, then emits its hook event plus the catch-all
/// [`MapEvent::Update`].
pub struct Mapper {
    store: Box<dyn MapStore>,
    node_types: NodeTypeRegistry,
    layers: LayerRegistry,
    hooks: HookBus<MapEvent>,
    cache: HashMap<NodeRef, RelationEntry>,
    unsaved: bool,
}

impl core::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Mapper")
            .field("cached_nodes", &self.cache.len())
            .field("unsaved", &self.unsaved)
            .finish_non_exhaustive()
    }
}

impl Mapper {
    /// Creates a mapper over `store` with the bundled registries.
    #[must_use]
    pub fn new(store: Box<dyn MapStore>) -> Self {
        Self::with_registries(store, NodeTypeRegistry::default(), LayerRegistry::default())
    }

    /// Creates a mapper with explicit registries.
    #[must_use]
    pub fn with_registries(
        store: Box<dyn MapStore>,
        node_types: NodeTypeRegistry,
        layers: LayerRegistry,
    ) -> Self {
        Self {
            store,
            node_types,
            layers,
            hooks: HookBus::new(),
            cache: HashMap::new(),
            unsaved: false,
        }
    }

    /// The node-type registry.
    #[must_use]
    pub fn node_types(&self) -> &NodeTypeRegistry {
        &self.node_types
    }

    /// The layer registry.
    #[must_use]
    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    /// The hook bus, for registering and unregistering listeners.
    pub fn hooks_mut(&mut self) -> &mut HookBus<MapEvent> {
        &mut self.hooks
    }

    // ---------------------------------------------------------------
    // Cached reads
    // ---------------------------------------------------------------

    /// Returns `true` if the node exists and has not been soft-deleted.
    pub fn node_valid(&self, node: NodeRef) -> Result<bool> {
        Ok(self.store.entity_valid(node.0)?)
    }

    /// Returns the structural role of a node.
    pub fn node_role(&mut self, node: NodeRef) -> Result<NodeRole> {
        if let Some(role) = self.cache.get(&node).and_then(|entry| entry.role) {
            return Ok(role);
        }
        let role = self.store.node_role(node.0)?;
        self.cache.entry(node).or_default().role = Some(role);
        Ok(role)
    }

    /// Returns the parent of a node, if any.
    pub fn node_parent(&mut self, node: NodeRef) -> Result<Option<NodeRef>> {
        if let Some(parent) = self.cache.get(&node).and_then(|entry| entry.parent) {
            return Ok(parent);
        }
        let parent = self.store.node_parent(node.0)?.map(NodeRef);
        self.cache.entry(node).or_default().parent = Some(parent);
        Ok(parent)
    }

    /// Returns the valid children of a node in insertion order.
    pub fn node_children(&mut self, node: NodeRef) -> Result<Vec<NodeRef>> {
        if let Some(children) = self
            .cache
            .get(&node)
            .and_then(|entry| entry.children.clone())
        {
            return Ok(children);
        }
        let mut children = Vec::new();
        for id in self.store.node_children(node.0)? {
            if self.store.entity_valid(id)? {
                children.push(NodeRef(id));
            }
        }
        self.cache.entry(node).or_default().children = Some(children.clone());
        Ok(children)
    }

    /// Returns `true` if the node has at least one valid child.
    pub fn node_has_children(&mut self, node: NodeRef) -> Result<bool> {
        Ok(!self.node_children(node)?.is_empty())
    }

    /// Returns the live edges of a node, viewed from that node.
    ///
    /// Edges whose opposite endpoint has been soft-deleted are filtered
    /// out: an edge is only as valid as both of its endpoints.
    pub fn node_edges(&mut self, node: NodeRef) -> Result<Vec<DirectedEdge>> {
        if let Some(edges) = self.cache.get(&node).and_then(|entry| entry.edges.clone()) {
            return Ok(edges);
        }
        let mut edges = Vec::new();
        for record in self.store.node_edges(node.0)? {
            if !self.store.entity_valid(record.edge)? {
                continue;
            }
            let other = self.store.edge_other_node(record.edge, node.0)?;
            if !self.store.entity_valid(other)? {
                continue;
            }
            edges.push(DirectedEdge {
                edge: EdgeRef(record.edge),
                start: node,
                other: NodeRef(other),
            });
        }
        self.cache.entry(node).or_default().edges = Some(edges.clone());
        Ok(edges)
    }

    /// Returns the nodes connected to `node` by live edges.
    pub fn node_neighbors(&mut self, node: NodeRef) -> Result<Vec<NodeRef>> {
        if let Some(neighbors) = self
            .cache
            .get(&node)
            .and_then(|entry| entry.neighbors.clone())
        {
            return Ok(neighbors);
        }
        let neighbors: Vec<NodeRef> = self
            .node_edges(node)?
            .iter()
            .map(|edge| edge.other)
            .collect();
        self.cache.entry(node).or_default().neighbors = Some(neighbors.clone());
        Ok(neighbors)
    }

    /// Returns `node` followed by its neighbors.
    pub fn node_self_and_neighbors(&mut self, node: NodeRef) -> Result<Vec<NodeRef>> {
        let mut all = vec![node];
        all.extend(self.node_neighbors(node)?);
        Ok(all)
    }

    /// Returns every valid descendant of `node`, depth first.
    pub fn descendants(&mut self, node: NodeRef) -> Result<Vec<NodeRef>> {
        let mut out = Vec::new();
        let mut stack = self.node_children(node)?;
        stack.reverse();
        while let Some(current) = stack.pop() {
            out.push(current);
            let mut children = self.node_children(current)?;
            children.reverse();
            stack.extend(children);
        }
        Ok(out)
    }

    /// Returns `node` followed by its valid descendants, depth first.
    pub fn self_and_descendants(&mut self, node: NodeRef) -> Result<Vec<NodeRef>> {
        let mut all = vec![node];
        all.extend(self.descendants(node)?);
        Ok(all)
    }

    // ---------------------------------------------------------------
    // Property access
    // ---------------------------------------------------------------

    /// Returns the nominal center, or the zero vector when unset.
    pub fn center(&self, node: NodeRef) -> Result<Vec3> {
        Ok(self
            .store
            .vector(node.0, props::CENTER)?
            .unwrap_or(Vec3::ZERO))
    }

    /// Returns the effective (rendering) center.
    ///
    /// Falls back to the nominal center when no cleanup has set one.
    pub fn effective_center(&self, node: NodeRef) -> Result<Vec3> {
        match self.store.vector(node.0, props::E_CENTER)? {
            Some(center) => Ok(center),
            None => self.center(node),
        }
    }

    /// Returns the influence radius, or zero when unset.
    pub fn radius(&self, node: NodeRef) -> Result<f64> {
        Ok(self.store.number(node.0, props::RADIUS)?.unwrap_or(0.0))
    }

    /// Returns the node's type key.
    pub fn type_key(&self, node: NodeRef) -> Result<Option<String>> {
        Ok(self.store.text(node.0, props::TYPE)?)
    }

    /// Resolves the node's type descriptor from the registry.
    pub fn node_type(&self, node: NodeRef) -> Result<Option<NodeType>> {
        Ok(self
            .type_key(node)?
            .and_then(|key| self.node_types.get(&key).cloned()))
    }

    /// Returns the node's layer key.
    ///
    /// Falls back through the node type's layer to the default layer.
    pub fn layer_key(&self, node: NodeRef) -> Result<String> {
        if let Some(layer) = self.store.text(node.0, props::LAYER)? {
            return Ok(layer);
        }
        if let Some(node_type) = self.node_type(node)? {
            return Ok(node_type.layer().to_owned());
        }
        Ok(self.layers.default_layer().id().to_owned())
    }

    /// Returns the node's display name, if set. Empty names read as unset.
    pub fn name(&self, node: NodeRef) -> Result<Option<String>> {
        Ok(self
            .store
            .text(node.0, props::NAME)?
            .filter(|name| !name.is_empty()))
    }

    /// Sets the nominal center and emits an update.
    pub fn set_center(&mut self, node: NodeRef, center: Vec3) -> Result<()> {
        self.store.set_vector(node.0, props::CENTER, center)?;
        self.touch(node)
    }

    /// Sets the effective center and emits an update.
    pub fn set_effective_center(&mut self, node: NodeRef, center: Vec3) -> Result<()> {
        self.store.set_vector(node.0, props::E_CENTER, center)?;
        self.touch(node)
    }

    /// Sets the radius and emits an update.
    pub fn set_radius(&mut self, node: NodeRef, radius: f64) -> Result<()> {
        self.store.set_number(node.0, props::RADIUS, radius)?;
        self.touch(node)
    }

    /// Sets the display name and emits an update. `None` clears it.
    pub fn set_name(&mut self, node: NodeRef, name: Option<&str>) -> Result<()> {
        self.store.set_text(node.0, props::NAME, name.unwrap_or(""))?;
        self.touch(node)
    }

    /// Sets center, effective center, and radius in one update.
    pub fn set_node_space(
        &mut self,
        node: NodeRef,
        center: Vec3,
        effective_center: Vec3,
        radius: f64,
    ) -> Result<()> {
        self.store.set_vector(node.0, props::CENTER, center)?;
        self.store
            .set_vector(node.0, props::E_CENTER, effective_center)?;
        self.store.set_number(node.0, props::RADIUS, radius)?;
        self.touch(node)
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    /// Inserts a node at `point`.
    ///
    /// The center and effective center start identical; the type key must
    /// be registered and the layer (explicit or from the type) must exist.
    /// Emits [`MapEvent::InsertNode`] and [`MapEvent::Update`].
    pub fn insert_node(
        &mut self,
        point: Vec3,
        role: NodeRole,
        options: InsertNodeOptions,
    ) -> Result<NodeRef> {
        let result = self.insert_node_inner(point, role, options);
        self.report_on_error(&result);
        result
    }

    fn insert_node_inner(
        &mut self,
        point: Vec3,
        role: NodeRole,
        options: InsertNodeOptions,
    ) -> Result<NodeRef> {
        if self.node_types.get(&options.type_key).is_none() {
            return Err(MapError::UnknownType(options.type_key));
        }
        let layer = match &options.layer {
            Some(layer) => layer.clone(),
            None => self
                .node_types
                .get(&options.type_key)
                .expect("checked above")
                .layer()
                .to_owned(),
        };
        if self.layers.get(&layer).is_none() {
            return Err(MapError::UnknownLayer(layer));
        }

        let id = self
            .store
            .create_node(options.parent.map(|parent| parent.0), role)?;
        let node = NodeRef(id);
        self.store.set_vector(id, props::CENTER, point)?;
        self.store.set_vector(id, props::E_CENTER, point)?;
        self.store.set_number(id, props::RADIUS, options.radius)?;
        self.store.set_text(id, props::TYPE, &options.type_key)?;
        self.store.set_text(id, props::LAYER, &layer)?;

        if let Some(parent) = options.parent {
            self.cache.remove(&parent);
        }
        debug!(?node, role = ?role, "inserted node");
        self.declare_unsaved_changes()?;
        self.emit(MapEvent::InsertNode(node))?;
        self.emit(MapEvent::Update)?;
        Ok(node)
    }

    /// Translates `origin` and all its descendants by `offset`.
    ///
    /// Both the nominal and effective centers move. Emits one
    /// [`MapEvent::UpdateNode`] per moved node, then
    /// [`MapEvent::TranslateNodes`] with the full set.
    pub fn translate_node(&mut self, origin: NodeRef, offset: Vec3) -> Result<Vec<NodeRef>> {
        let result = self.translate_node_inner(origin, offset);
        self.report_on_error(&result);
        result
    }

    fn translate_node_inner(&mut self, origin: NodeRef, offset: Vec3) -> Result<Vec<NodeRef>> {
        let affected = self.self_and_descendants(origin)?;
        for &node in &affected {
            let center = self.center(node)?;
            let effective = self.effective_center(node)?;
            self.store.set_vector(node.0, props::CENTER, center + offset)?;
            self.store
                .set_vector(node.0, props::E_CENTER, effective + offset)?;
        }
        self.declare_unsaved_changes()?;
        for &node in &affected {
            self.emit(MapEvent::UpdateNode(node))?;
        }
        self.emit(MapEvent::TranslateNodes(affected.clone()))?;
        self.emit(MapEvent::Update)?;
        Ok(affected)
    }

    /// Soft-deletes the given nodes.
    ///
    /// The set expands to include every descendant, and parents left with
    /// no valid children are soft-deleted too. Returns the full affected
    /// set, in removal order, for undo.
    pub fn remove_nodes(&mut self, refs: &[NodeRef]) -> Result<Vec<NodeRef>> {
        let result = self.remove_nodes_inner(refs);
        self.report_on_error(&result);
        result
    }

    fn remove_nodes_inner(&mut self, refs: &[NodeRef]) -> Result<Vec<NodeRef>> {
        let mut affected = Vec::new();
        let mut seen = HashSet::new();
        for &node in refs {
            for expanded in self.self_and_descendants(node)? {
                if seen.insert(expanded) {
                    affected.push(expanded);
                }
            }
        }

        // Purge relations while the graph still reflects the pre-removal
        // state; neighbor listings are unreachable afterwards.
        for &node in &affected {
            self.purge_around(node)?;
        }
        for &node in &affected {
            self.store.invalidate(node.0)?;
        }

        // Parents that just lost their last valid child go too.
        let mut candidates: Vec<NodeRef> = Vec::new();
        for &node in &affected {
            if let Some(parent) = self.store.node_parent(node.0)?.map(NodeRef)
                && !seen.contains(&parent)
                && !candidates.contains(&parent)
            {
                candidates.push(parent);
            }
        }
        while let Some(parent) = candidates.pop() {
            if !self.store.entity_valid(parent.0)? {
                continue;
            }
            let mut any_valid = false;
            for child in self.store.node_children(parent.0)? {
                if self.store.entity_valid(child)? {
                    any_valid = true;
                    break;
                }
            }
            if any_valid {
                continue;
            }
            self.purge_around(parent)?;
            self.store.invalidate(parent.0)?;
            seen.insert(parent);
            affected.push(parent);
            if let Some(grandparent) = self.store.node_parent(parent.0)?.map(NodeRef)
                && !seen.contains(&grandparent)
            {
                candidates.push(grandparent);
            }
        }

        debug!(count = affected.len(), "removed nodes");
        self.declare_unsaved_changes()?;
        self.emit(MapEvent::RemoveNodes(affected.clone()))?;
        self.emit(MapEvent::Update)?;
        Ok(affected)
    }

    /// Restores previously soft-deleted nodes.
    ///
    /// Deliberately not transitive: callers pass the exact affected set a
    /// remove returned.
    pub fn unremove_nodes(&mut self, refs: &[NodeRef]) -> Result<()> {
        let result = self.unremove_nodes_inner(refs);
        self.report_on_error(&result);
        result
    }

    fn unremove_nodes_inner(&mut self, refs: &[NodeRef]) -> Result<()> {
        for &node in refs {
            self.store.revalidate(node.0)?;
        }
        for &node in refs {
            self.purge_around(node)?;
        }
        self.declare_unsaved_changes()?;
        self.emit(MapEvent::UnremoveNodes(refs.to_vec()))?;
        self.emit(MapEvent::Update)?;
        Ok(())
    }

    /// Creates an edge between two distinct nodes, or returns the one that
    /// already connects them.
    pub fn insert_edge(&mut self, a: NodeRef, b: NodeRef) -> Result<EdgeRef> {
        let result = self.insert_edge_inner(a, b);
        self.report_on_error(&result);
        result
    }

    fn insert_edge_inner(&mut self, a: NodeRef, b: NodeRef) -> Result<EdgeRef> {
        if let Some(existing) = self.store.edge_between(a.0, b.0)? {
            if !self.store.entity_valid(existing)? {
                self.store.revalidate(existing)?;
            }
            self.cache.remove(&a);
            self.cache.remove(&b);
            return Ok(EdgeRef(existing));
        }
        let edge = EdgeRef(self.store.create_edge(a.0, b.0)?);
        self.cache.remove(&a);
        self.cache.remove(&b);
        self.declare_unsaved_changes()?;
        self.emit(MapEvent::Update)?;
        Ok(edge)
    }

    /// Soft-deletes the given edges.
    pub fn remove_edges(&mut self, refs: &[EdgeRef]) -> Result<()> {
        let result = self.remove_edges_inner(refs, false);
        self.report_on_error(&result);
        result
    }

    /// Restores previously soft-deleted edges.
    pub fn unremove_edges(&mut self, refs: &[EdgeRef]) -> Result<()> {
        let result = self.remove_edges_inner(refs, true);
        self.report_on_error(&result);
        result
    }

    fn remove_edges_inner(&mut self, refs: &[EdgeRef], restore: bool) -> Result<()> {
        for &edge in refs {
            let (a, b) = self.store.edge_nodes(edge.0)?;
            if restore {
                self.store.revalidate(edge.0)?;
            } else {
                self.store.invalidate(edge.0)?;
            }
            self.cache.remove(&NodeRef(a));
            self.cache.remove(&NodeRef(b));
        }
        self.declare_unsaved_changes()?;
        let refs = refs.to_vec();
        self.emit(if restore {
            MapEvent::UnremoveEdges(refs)
        } else {
            MapEvent::RemoveEdges(refs)
        })?;
        self.emit(MapEvent::Update)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Spatial queries
    // ---------------------------------------------------------------

    /// All valid nodes with radius ≥ `min_radius` whose bounding sphere
    /// intersects `area`.
    pub fn nodes_touching_area(&self, area: Box3, min_radius: f64) -> Result<Vec<NodeRef>> {
        Ok(self
            .store
            .nodes_touching_area(area, min_radius)?
            .into_iter()
            .map(NodeRef)
            .collect())
    }

    /// Like [`Mapper::nodes_touching_area`], restricted to object nodes.
    pub fn object_nodes_touching_area(&self, area: Box3, min_radius: f64) -> Result<Vec<NodeRef>> {
        Ok(self
            .store
            .object_nodes_touching_area(area, min_radius)?
            .into_iter()
            .map(NodeRef)
            .collect())
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    /// Returns `true` if there are changes since the last save marker.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Marks the map as having unsaved changes.
    pub fn declare_unsaved_changes(&mut self) -> Result<()> {
        if !self.unsaved {
            self.unsaved = true;
            self.emit(MapEvent::UnsavedState(true))?;
        }
        Ok(())
    }

    /// Clears the unsaved-changes flag (after a successful save).
    pub fn clear_unsaved_change_state(&mut self) -> Result<()> {
        if self.unsaved {
            self.unsaved = false;
            self.emit(MapEvent::UnsavedState(false))?;
        }
        Ok(())
    }

    /// Forces the store to persist buffered state.
    pub fn flush(&mut self) -> Result<()> {
        Ok(self.store.flush()?)
    }

    /// Exports the full store as one portable byte sequence.
    pub fn export_map(&mut self) -> Result<Vec<u8>> {
        self.store.flush()?;
        Ok(self.store.export()?)
    }

    /// Replaces all map state from exported bytes.
    pub fn import_map(&mut self, bytes: &[u8]) -> Result<()> {
        self.store.import(bytes)?;
        self.cache.clear();
        self.declare_unsaved_changes()?;
        self.emit(MapEvent::Update)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    /// Drops the cached relations of `node`, its parent, and its
    /// neighbors. Uses unfiltered store listings so it also works when the
    /// node is about to be (or already is) invalid.
    fn purge_around(&mut self, node: NodeRef) -> Result<()> {
        self.cache.remove(&node);
        if let Some(parent) = self.store.node_parent(node.0)? {
            self.cache.remove(&NodeRef(parent));
        }
        for record in self.store.node_edges(node.0)? {
            let other = self.store.edge_other_node(record.edge, node.0)?;
            self.cache.remove(&NodeRef(other));
        }
        Ok(())
    }

    fn touch(&mut self, node: NodeRef) -> Result<()> {
        self.declare_unsaved_changes()?;
        self.emit(MapEvent::UpdateNode(node))?;
        self.emit(MapEvent::Update)
    }

    fn emit(&mut self, event: MapEvent) -> Result<()> {
        self.hooks
            .emit(&event)
            .map_err(|error| MapError::Hook(error.to_string()))
    }

    /// Re-emits a failed mutation on the hook bus as an error event.
    fn report_on_error<T>(&mut self, result: &Result<T>) {
        if let Err(error) = result {
            let _ = self.hooks.emit(&MapEvent::Error(error.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridgeline_store::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn mapper() -> Mapper {
        Mapper::new(Box::new(MemoryStore::new()))
    }

    fn grass(radius: f64, parent: Option<NodeRef>) -> InsertNodeOptions {
        InsertNodeOptions {
            parent,
            type_key: "grass".into(),
            radius,
            layer: None,
        }
    }

    fn event_log(mapper: &mut Mapper) -> Rc<RefCell<Vec<MapEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        mapper.hooks_mut().on(move |event: &MapEvent| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });
        log
    }

    #[test]
    fn insert_sets_center_and_effective_center_alike() {
        let mut mapper = mapper();
        let point = Vec3::new(3.0, 4.0, 1.5);
        let node = mapper
            .insert_node(point, NodeRole::Object, grass(7.0, None))
            .unwrap();

        assert_eq!(mapper.center(node).unwrap(), point);
        assert_eq!(mapper.effective_center(node).unwrap(), point);
        assert_eq!(mapper.center(node).unwrap().z, mapper.effective_center(node).unwrap().z);
        assert_eq!(mapper.radius(node).unwrap(), 7.0);
        assert_eq!(mapper.layer_key(node).unwrap(), "geographical");
        assert!(mapper.has_unsaved_changes());
    }

    #[test]
    fn insert_emits_insert_then_update() {
        let mut mapper = mapper();
        let log = event_log(&mut mapper);
        let node = mapper
            .insert_node(Vec3::ZERO, NodeRole::Object, grass(1.0, None))
            .unwrap();

        let events = log.borrow();
        assert_eq!(events[0], MapEvent::UnsavedState(true));
        assert_eq!(events[1], MapEvent::InsertNode(node));
        assert_eq!(events[2], MapEvent::Update);
    }

    #[test]
    fn insert_with_unknown_type_reports_and_no_ops() {
        let mut mapper = mapper();
        let log = event_log(&mut mapper);
        let result = mapper.insert_node(
            Vec3::ZERO,
            NodeRole::Object,
            InsertNodeOptions {
                type_key: "lava".into(),
                ..InsertNodeOptions::default()
            },
        );

        assert!(matches!(result, Err(MapError::UnknownType(_))));
        assert!(!mapper.has_unsaved_changes());
        assert!(matches!(log.borrow()[0], MapEvent::Error(_)));
    }

    #[test]
    fn translate_moves_descendants_and_both_centers() {
        let mut mapper = mapper();
        let parent = mapper
            .insert_node(Vec3::ZERO, NodeRole::Object, grass(5.0, None))
            .unwrap();
        let child = mapper
            .insert_node(
                Vec3::new(1.0, 0.0, 0.0),
                NodeRole::Point,
                grass(2.0, Some(parent)),
            )
            .unwrap();
        mapper
            .set_effective_center(child, Vec3::new(1.5, 0.0, 0.0))
            .unwrap();

        let log = event_log(&mut mapper);
        let offset = Vec3::new(10.0, -2.0, 0.0);
        let moved = mapper.translate_node(parent, offset).unwrap();

        assert_eq!(moved, vec![parent, child]);
        assert_eq!(mapper.center(parent).unwrap(), offset);
        assert_eq!(mapper.center(child).unwrap(), Vec3::new(11.0, -2.0, 0.0));
        assert_eq!(
            mapper.effective_center(child).unwrap(),
            Vec3::new(11.5, -2.0, 0.0)
        );

        // One update per moved node.
        let updates = log
            .borrow()
            .iter()
            .filter(|event| matches!(event, MapEvent::UpdateNode(_)))
            .count();
        assert_eq!(updates, 2);
    }

    fn family(mapper: &mut Mapper) -> (NodeRef, Vec<NodeRef>, Vec<EdgeRef>) {
        let parent = mapper
            .insert_node(Vec3::ZERO, NodeRole::Object, grass(5.0, None))
            .unwrap();
        let children: Vec<NodeRef> = (0..3)
            .map(|i| {
                mapper
                    .insert_node(
                        Vec3::new(f64::from(i), 0.0, 0.0),
                        NodeRole::Point,
                        grass(1.0, Some(parent)),
                    )
                    .unwrap()
            })
            .collect();
        let edges = vec![
            mapper.insert_edge(children[0], children[1]).unwrap(),
            mapper.insert_edge(children[1], children[2]).unwrap(),
            mapper.insert_edge(children[2], children[0]).unwrap(),
        ];
        (parent, children, edges)
    }

    #[test]
    fn remove_expands_to_descendants() {
        let mut mapper = mapper();
        let (parent, children, _) = family(&mut mapper);

        let affected = mapper.remove_nodes(&[parent]).unwrap();

        assert_eq!(affected.len(), 4);
        for node in [parent, children[0], children[1], children[2]] {
            assert!(affected.contains(&node));
            assert!(!mapper.node_valid(node).unwrap());
        }
    }

    #[test]
    fn removing_all_children_removes_the_parent() {
        let mut mapper = mapper();
        let (parent, children, _) = family(&mut mapper);

        let affected = mapper.remove_nodes(&children).unwrap();

        assert!(affected.contains(&parent), "childless parent should go too");
        assert!(!mapper.node_valid(parent).unwrap());
    }

    #[test]
    fn removing_one_child_keeps_the_parent() {
        let mut mapper = mapper();
        let (parent, children, _) = family(&mut mapper);

        let affected = mapper.remove_nodes(&[children[0]]).unwrap();

        assert_eq!(affected, vec![children[0]]);
        assert!(mapper.node_valid(parent).unwrap());
        assert_eq!(
            mapper.node_children(parent).unwrap(),
            vec![children[1], children[2]]
        );
    }

    #[test]
    fn unremove_restores_the_affected_set() {
        let mut mapper = mapper();
        let (parent, children, _) = family(&mut mapper);

        let affected = mapper.remove_nodes(&[parent]).unwrap();
        mapper.unremove_nodes(&affected).unwrap();

        for node in [parent, children[0], children[1], children[2]] {
            assert!(mapper.node_valid(node).unwrap());
        }
        assert_eq!(mapper.node_children(parent).unwrap(), children);
    }

    #[test]
    fn node_edges_hide_dead_endpoints() {
        let mut mapper = mapper();
        let (_, children, _) = family(&mut mapper);

        assert_eq!(mapper.node_edges(children[0]).unwrap().len(), 2);
        mapper.remove_nodes(&[children[1]]).unwrap();

        let edges = mapper.node_edges(children[0]).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].other, children[2]);
        assert_eq!(
            mapper.node_neighbors(children[0]).unwrap(),
            vec![children[2]]
        );
    }

    #[test]
    fn remove_and_unremove_edges() {
        let mut mapper = mapper();
        let (_, children, edges) = family(&mut mapper);

        mapper.remove_edges(&[edges[0]]).unwrap();
        assert_eq!(mapper.node_edges(children[0]).unwrap().len(), 1);

        mapper.unremove_edges(&[edges[0]]).unwrap();
        assert_eq!(mapper.node_edges(children[0]).unwrap().len(), 2);
    }

    #[test]
    fn insert_edge_is_idempotent() {
        let mut mapper = mapper();
        let (_, children, edges) = family(&mut mapper);
        let again = mapper.insert_edge(children[0], children[1]).unwrap();
        assert_eq!(again, edges[0]);
    }

    #[test]
    fn self_edge_reports_and_no_ops() {
        let mut mapper = mapper();
        let (_, children, _) = family(&mut mapper);
        assert!(mapper.insert_edge(children[0], children[0]).is_err());
    }

    #[test]
    fn unit_conversions_are_exact_inverses() {
        for meters in [0.0, 1.0, 2.5, 100.0, 12345.0] {
            assert_eq!(units_to_meters(meters_to_units(meters)), meters);
        }
        assert_eq!(units_to_meters(1.0), 2.0);
    }

    #[test]
    fn unsaved_state_is_tristate() {
        let mut mapper = mapper();
        let log = event_log(&mut mapper);

        assert!(!mapper.has_unsaved_changes());
        mapper.declare_unsaved_changes().unwrap();
        mapper.declare_unsaved_changes().unwrap();
        assert!(mapper.has_unsaved_changes());
        mapper.clear_unsaved_change_state().unwrap();
        assert!(!mapper.has_unsaved_changes());

        // The flag only emits on transitions.
        let events: Vec<_> = log
            .borrow()
            .iter()
            .filter(|event| matches!(event, MapEvent::UnsavedState(_)))
            .cloned()
            .collect();
        assert_eq!(
            events,
            vec![MapEvent::UnsavedState(true), MapEvent::UnsavedState(false)]
        );
    }

    #[test]
    fn export_import_round_trips_through_the_mapper() {
        let mut mapper = mapper();
        let (parent, children, _) = family(&mut mapper);
        let bytes = mapper.export_map().unwrap();

        let mut fresh = Mapper::new(Box::new(MemoryStore::new()));
        fresh.import_map(&bytes).unwrap();
        assert_eq!(fresh.node_children(parent).unwrap(), children);
    }

    #[test]
    fn spatial_wrapper_forwards() {
        let mut mapper = mapper();
        let node = mapper
            .insert_node(
                Vec3::new(5.0, 5.0, 0.0),
                NodeRole::Object,
                grass(2.0, None),
            )
            .unwrap();

        let area = Box3::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 0.0));
        assert_eq!(mapper.nodes_touching_area(area, 0.0).unwrap(), vec![node]);
        assert_eq!(
            mapper.object_nodes_touching_area(area, 0.0).unwrap(),
            vec![node]
        );
    }
}
