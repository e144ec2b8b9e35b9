// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Map-layer error taxonomy.

use thiserror::Error;

use ridgeline_store::StoreError;

/// Errors surfaced by the map layer.
///
/// Invalid mutations (unknown type keys, self-edges) report and no-op: the
/// store is left untouched when one of these comes back.
#[derive(Debug, Error)]
pub enum MapError {
    /// A persistence failure from the underlying store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A node type key that is not in the registry.
    #[error("unknown node type {0:?}")]
    UnknownType(String),

    /// A layer key that is not in the registry.
    #[error("unknown layer {0:?}")]
    UnknownLayer(String),

    /// A hook listener failed while an event was being dispatched.
    ///
    /// The remaining listeners still ran; this carries the first failure.
    #[error("hook listener failed: {0}")]
    Hook(String),
}
