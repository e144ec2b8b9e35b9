// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed property values.

use ridgeline_geom::Vec3;
use serde::{Deserialize, Serialize};

/// A property value: number, text, or 3D vector.
///
/// The relational reference layout keeps one column per variant; this enum
/// is the in-memory and snapshot form of the same tagged union.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// A numeric value.
    Number(f64),
    /// A text value.
    Text(String),
    /// A 3D vector value.
    Vector(Vec3),
}

impl PropertyValue {
    /// Returns the numeric value, if this is a number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text value, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the vector value, if this is a vector.
    #[must_use]
    pub fn as_vector(&self) -> Option<Vec3> {
        match self {
            Self::Vector(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<Vec3> for PropertyValue {
    fn from(value: Vec3) -> Self {
        Self::Vector(value)
    }
}
