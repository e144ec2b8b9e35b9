// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Store error taxonomy.

use thiserror::Error;

use crate::store::EntityId;

/// Errors surfaced by [`MapStore`](crate::MapStore) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The entity id does not exist in the store.
    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),

    /// The entity exists but has the wrong kind for the operation.
    #[error("entity {id:?} is not a {expected}")]
    WrongKind {
        /// The offending entity.
        id: EntityId,
        /// The kind the operation needed.
        expected: &'static str,
    },

    /// An edge was requested between a node and itself.
    #[error("an edge needs two distinct endpoints")]
    IdenticalEndpoints,

    /// The edge does not connect the given endpoint.
    #[error("edge {edge:?} does not start or end at {endpoint:?}")]
    UnrelatedEndpoint {
        /// The edge queried.
        edge: EntityId,
        /// The endpoint that is not part of it.
        endpoint: EntityId,
    },

    /// The stored format version cannot be read by this build.
    ///
    /// A snapshot exactly one revision behind is upgraded in place; anything
    /// newer, or older than one revision, lands here.
    #[error("stored format version {found} is not supported (this build reads {supported})")]
    VersionMismatch {
        /// The version found in the snapshot.
        found: u32,
        /// The version this build reads natively.
        supported: u32,
    },

    /// The snapshot bytes did not decode.
    #[error("snapshot decode failed: {0}")]
    Codec(#[from] postcard::Error),
}
