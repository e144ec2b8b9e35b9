// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Derived hover and active selections.

use hashbrown::HashSet;
use ridgeline_map::{Mapper, NodeRef, Result};

/// A transient selection derived from origin nodes.
///
/// Selections are never persisted; they are recomputed from their origins
/// whenever the graph changes. From the origins the selection expands to
/// the *direct* set (origins, their descendants, and their parents) and
/// the wider set that also includes siblings (the parents' other
/// descendants). Hover and active selections are separate instances of
/// this type.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    origins: Vec<NodeRef>,
    parents: HashSet<NodeRef>,
    children: HashSet<NodeRef>,
    siblings: HashSet<NodeRef>,
    direct: HashSet<NodeRef>,
    full: HashSet<NodeRef>,
}

impl Selection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a selection from origin nodes.
    pub fn from_origins(mapper: &mut Mapper, origins: &[NodeRef]) -> Result<Self> {
        let mut selection = Self {
            origins: origins.to_vec(),
            ..Self::default()
        };
        for &origin in origins {
            selection.direct.insert(origin);
            for descendant in mapper.descendants(origin)? {
                selection.children.insert(descendant);
                selection.direct.insert(descendant);
            }
            if let Some(parent) = mapper.node_parent(origin)? {
                selection.parents.insert(parent);
                selection.direct.insert(parent);
                for sibling in mapper.descendants(parent)? {
                    if !selection.direct.contains(&sibling) {
                        selection.siblings.insert(sibling);
                    }
                }
            }
        }
        selection.full = selection
            .direct
            .union(&selection.siblings)
            .copied()
            .collect();
        Ok(selection)
    }

    /// Re-derives this selection's expansion from its origins.
    pub fn recompute(&mut self, mapper: &mut Mapper) -> Result<()> {
        *self = Self::from_origins(mapper, &self.origins.clone())?;
        Ok(())
    }

    /// The origin nodes the selection was built from.
    #[must_use]
    pub fn origins(&self) -> &[NodeRef] {
        &self.origins
    }

    /// Returns `true` if no origins are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// Returns `true` if the node is anywhere in the expansion, siblings
    /// included.
    #[must_use]
    pub fn has_node(&self, node: NodeRef) -> bool {
        self.full.contains(&node)
    }

    /// Returns `true` if the node is in the direct set (no siblings).
    #[must_use]
    pub fn has_node_direct(&self, node: NodeRef) -> bool {
        self.direct.contains(&node)
    }

    /// Returns `true` if the node is one of the origins.
    #[must_use]
    pub fn node_is_origin(&self, node: NodeRef) -> bool {
        self.origins.contains(&node)
    }

    /// Returns `true` if the node is an origin's parent.
    #[must_use]
    pub fn node_is_parent(&self, node: NodeRef) -> bool {
        self.parents.contains(&node)
    }

    /// Returns `true` if the node is a descendant of an origin.
    #[must_use]
    pub fn node_is_child(&self, node: NodeRef) -> bool {
        self.children.contains(&node)
    }

    /// Returns `true` if the node is a sibling (a parent's other
    /// descendant).
    #[must_use]
    pub fn node_is_sibling(&self, node: NodeRef) -> bool {
        self.siblings.contains(&node)
    }

    /// Returns `true` if `other`'s direct set is contained in this
    /// selection's direct set.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        !other.direct.is_empty() && other.direct.is_subset(&self.direct)
    }

    /// Merges `other` into this selection.
    pub fn join_with(&mut self, other: &Self) {
        for &origin in &other.origins {
            if !self.origins.contains(&origin) {
                self.origins.push(origin);
            }
        }
        self.parents.extend(&other.parents);
        self.children.extend(&other.children);
        self.siblings.extend(&other.siblings);
        self.direct.extend(&other.direct);
        self.full.extend(&other.full);
        // A node promoted into the direct set is no longer a sibling.
        let direct = self.direct.clone();
        self.siblings.retain(|node| !direct.contains(node));
    }
}
