// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Portable snapshot format for export/import.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{EntityId, EntityKind, NodeRole, props};
use crate::{PropertyValue, Result, StoreError};

/// The snapshot format version this build reads and writes natively.
///
/// Version 1 predates the effective-center column; its upgrade copies
/// `center` into missing `eCenter` slots.
pub const FORMAT_VERSION: u32 = 2;

/// Per-node structural data in a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Structural role.
    pub role: NodeRole,
    /// Parent node, if any.
    pub parent: Option<EntityId>,
}

/// One entity in a snapshot, in store insertion order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// The entity's id.
    pub id: EntityId,
    /// The entity's kind tag.
    pub kind: EntityKind,
    /// Soft-delete flag.
    pub valid: bool,
    /// Node data when `kind` is [`EntityKind::Node`].
    pub node: Option<NodeRecord>,
    /// Endpoints when `kind` is [`EntityKind::Edge`].
    pub edge: Option<(EntityId, EntityId)>,
    /// Property rows, keyed by name.
    pub properties: Vec<(String, PropertyValue)>,
}

/// A complete, portable image of a store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version the snapshot was written with.
    pub version: u32,
    /// The id the store will allocate next.
    pub next_id: u64,
    /// All entities in insertion order.
    pub entities: Vec<EntityRecord>,
}

impl Snapshot {
    /// Creates an empty snapshot at the current version.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: FORMAT_VERSION,
            next_id: 1,
            entities: Vec::new(),
        }
    }

    /// Encodes the snapshot as one opaque byte sequence.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(self)?)
    }

    /// Decodes a snapshot, applying the one-revision upgrade if needed.
    ///
    /// A snapshot newer than [`FORMAT_VERSION`], or older than one
    /// revision, fails with [`StoreError::VersionMismatch`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut snapshot: Self = postcard::from_bytes(bytes)?;
        match snapshot.version {
            version if version == FORMAT_VERSION => {}
            version if version == FORMAT_VERSION - 1 => {
                debug!(from = version, to = FORMAT_VERSION, "upgrading snapshot");
                snapshot.upgrade_one_revision();
            }
            version => {
                return Err(StoreError::VersionMismatch {
                    found: version,
                    supported: FORMAT_VERSION,
                });
            }
        }
        Ok(snapshot)
    }

    /// Upgrades a snapshot exactly one revision behind to the current
    /// version. The steps are deterministic.
    fn upgrade_one_revision(&mut self) {
        for entity in &mut self.entities {
            if entity.node.is_none() {
                continue;
            }
            let center = entity
                .properties
                .iter()
                .find(|(name, _)| name == props::CENTER)
                .map(|(_, value)| value.clone());
            let has_effective = entity
                .properties
                .iter()
                .any(|(name, _)| name == props::E_CENTER);
            if let Some(center) = center
                && !has_effective
            {
                entity.properties.push((props::E_CENTER.into(), center));
            }
        }
        self.version = FORMAT_VERSION;
    }
}
