// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node-type and layer registries.
//!
//! Both registries are populated at [`Mapper`](crate::Mapper) construction
//! and treated as immutable afterwards. The built-in entries cover the
//! bundled terrain, structure, and annotation types.

use bitflags::bitflags;
use peniko::Color;

/// How a node type scales with its children.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeScale {
    /// Children stamp terrain disks that merge into an area.
    Terrain,
    /// Children draw at an explicit size (trees, towers, markers).
    Explicit,
}

/// The kind of a drawing layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LayerKind {
    /// Physical terrain.
    Geographical,
    /// Political regions.
    Political,
    /// Notes and routes.
    Annotation,
}

/// How a layer is drawn.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DrawMode {
    /// Filled areas (geographical terrain).
    Area,
    /// Outlines only (political and annotation layers).
    Border,
}

bitflags! {
    /// Behavior flags of a node type.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        /// Picks up a background pattern from overlapping terrain.
        const RECEIVES_BACKGROUND = 0b0000_0001;
        /// Provides a background pattern to overlapping terrain.
        const GIVES_BACKGROUND    = 0b0000_0010;
        /// Drawn as a filled area.
        const AREA                = 0b0000_0100;
        /// Drawn as a stroke along path vertices.
        const PATH                = 0b0000_1000;
    }
}

/// Immutable descriptor of a node type.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeType {
    id: String,
    color: Color,
    image: Option<String>,
    layer: String,
    scale: TypeScale,
    flags: TypeFlags,
}

impl NodeType {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(
        id: &str,
        color: Color,
        image: Option<&str>,
        layer: &str,
        scale: TypeScale,
        flags: TypeFlags,
    ) -> Self {
        Self {
            id: id.into(),
            color,
            image: image.map(str::to_owned),
            layer: layer.into(),
            scale,
            flags,
        }
    }

    /// The registry key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fill/stroke color.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Key of the bundled raster image, if the type has one.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Key of the layer this type draws on.
    #[must_use]
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Scale mode.
    #[must_use]
    pub fn scale(&self) -> TypeScale {
        self.scale
    }

    /// Behavior flags.
    #[must_use]
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// Returns `true` if the type stamps path vertices.
    #[must_use]
    pub fn is_path(&self) -> bool {
        self.flags.contains(TypeFlags::PATH)
    }
}

/// Immutable descriptor of a drawing layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    id: String,
    kind: LayerKind,
    z: i32,
    draw_mode: DrawMode,
}

impl Layer {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(id: &str, kind: LayerKind, z: i32, draw_mode: DrawMode) -> Self {
        Self {
            id: id.into(),
            kind,
            z,
            draw_mode,
        }
    }

    /// The registry key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The layer kind.
    #[must_use]
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Stacking order; higher draws later.
    #[must_use]
    pub fn z(&self) -> i32 {
        self.z
    }

    /// Area or border drawing.
    #[must_use]
    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }
}

/// Registry of node types, keyed by id.
#[derive(Clone, Debug)]
pub struct NodeTypeRegistry {
    types: Vec<NodeType>,
}

impl Default for NodeTypeRegistry {
    /// Seeds the bundled type library.
    fn default() -> Self {
        use TypeFlags as F;
        use TypeScale::{Explicit, Terrain};

        let area = F::AREA;
        let mut registry = Self { types: Vec::new() };
        for entry in [
            NodeType::new(
                "water",
                Color::from_rgba8(62, 100, 196, 255),
                Some("water"),
                "geographical",
                Terrain,
                F::GIVES_BACKGROUND | area,
            ),
            NodeType::new(
                "grass",
                Color::from_rgba8(90, 181, 82, 255),
                Some("grass"),
                "geographical",
                Terrain,
                F::RECEIVES_BACKGROUND | F::GIVES_BACKGROUND | area,
            ),
            NodeType::new(
                "forest",
                Color::from_rgba8(58, 125, 68, 255),
                Some("forest"),
                "geographical",
                Terrain,
                F::RECEIVES_BACKGROUND | area,
            ),
            NodeType::new(
                "tree",
                Color::from_rgba8(58, 125, 68, 255),
                Some("tree"),
                "geographical",
                Explicit,
                F::empty(),
            ),
            NodeType::new(
                "rocks",
                Color::from_rgba8(144, 144, 144, 255),
                Some("rocks"),
                "geographical",
                Terrain,
                F::RECEIVES_BACKGROUND | area,
            ),
            NodeType::new(
                "stone",
                Color::from_rgba8(169, 169, 169, 255),
                Some("stone"),
                "geographical",
                Terrain,
                F::GIVES_BACKGROUND | area,
            ),
            NodeType::new(
                "road",
                Color::from_rgba8(181, 152, 90, 255),
                Some("road"),
                "geographical",
                Terrain,
                F::PATH,
            ),
            NodeType::new(
                "buildings",
                Color::from_rgba8(188, 108, 85, 255),
                Some("buildings"),
                "geographical",
                Terrain,
                F::RECEIVES_BACKGROUND | area,
            ),
            NodeType::new(
                "tower",
                Color::from_rgba8(120, 120, 120, 255),
                Some("tower"),
                "geographical",
                Explicit,
                F::empty(),
            ),
            NodeType::new(
                "region",
                Color::from_rgba8(200, 60, 60, 255),
                None,
                "political",
                Terrain,
                area,
            ),
            NodeType::new(
                "route",
                Color::from_rgba8(60, 60, 200, 255),
                None,
                "annotation",
                Terrain,
                F::PATH,
            ),
            NodeType::new(
                "note",
                Color::from_rgba8(230, 200, 60, 255),
                Some("note"),
                "annotation",
                Explicit,
                F::empty(),
            ),
        ] {
            registry.register(entry);
        }
        registry
    }
}

impl NodeTypeRegistry {
    /// Registers a type, replacing any existing entry with the same id.
    pub fn register(&mut self, node_type: NodeType) {
        self.types.retain(|existing| existing.id != node_type.id);
        self.types.push(node_type);
    }

    /// Looks up a type by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.iter().find(|node_type| node_type.id == id)
    }

    /// Iterates all types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeType> {
        self.types.iter()
    }

    /// Returns the types assigned to `layer`, in registration order.
    #[must_use]
    pub fn for_layer(&self, layer: &str) -> Vec<&NodeType> {
        self.types
            .iter()
            .filter(|node_type| node_type.layer == layer)
            .collect()
    }
}

/// Registry of drawing layers, keyed by id.
#[derive(Clone, Debug)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
}

impl Default for LayerRegistry {
    /// Seeds geographical (Z 0), political (Z 10), and annotation (Z 15).
    fn default() -> Self {
        Self {
            layers: vec![
                Layer::new("geographical", LayerKind::Geographical, 0, DrawMode::Area),
                Layer::new("political", LayerKind::Political, 10, DrawMode::Border),
                Layer::new("annotation", LayerKind::Annotation, 15, DrawMode::Border),
            ],
        }
    }
}

impl LayerRegistry {
    /// Looks up a layer by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// The default drawing layer (geographical).
    #[must_use]
    pub fn default_layer(&self) -> &Layer {
        &self.layers[0]
    }

    /// Iterates the layers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Returns the layers sorted by ascending Z.
    #[must_use]
    pub fn z_sorted(&self) -> Vec<&Layer> {
        let mut sorted: Vec<_> = self.layers.iter().collect();
        sorted.sort_by_key(|layer| layer.z);
        sorted
    }

    /// Returns the layer after `current`, wrapping around.
    ///
    /// Used by the layer-cycling shortcut; an unknown id cycles to the
    /// first layer.
    #[must_use]
    pub fn next_after(&self, current: &str) -> &Layer {
        let index = self
            .layers
            .iter()
            .position(|layer| layer.id == current)
            .map_or(0, |index| (index + 1) % self.layers.len());
        &self.layers[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_types_are_present() {
        let registry = NodeTypeRegistry::default();
        for id in [
            "water",
            "grass",
            "forest",
            "tree",
            "rocks",
            "stone",
            "road",
            "buildings",
            "tower",
            "region",
            "route",
            "note",
        ] {
            assert!(registry.get(id).is_some(), "{id} missing from registry");
        }
    }

    #[test]
    fn layers_have_the_documented_order() {
        let registry = LayerRegistry::default();

        let geographical = registry.get("geographical").unwrap();
        assert_eq!(geographical.z(), 0);
        assert_eq!(geographical.draw_mode(), DrawMode::Area);

        let political = registry.get("political").unwrap();
        assert_eq!(political.z(), 10);
        assert_eq!(political.draw_mode(), DrawMode::Border);

        let annotation = registry.get("annotation").unwrap();
        assert_eq!(annotation.z(), 15);
        assert_eq!(annotation.draw_mode(), DrawMode::Border);

        assert_eq!(registry.default_layer().id(), "geographical");
    }

    #[test]
    fn layer_cycling_wraps() {
        let registry = LayerRegistry::default();
        assert_eq!(registry.next_after("geographical").id(), "political");
        assert_eq!(registry.next_after("political").id(), "annotation");
        assert_eq!(registry.next_after("annotation").id(), "geographical");
        assert_eq!(registry.next_after("bogus").id(), "geographical");
    }

    #[test]
    fn for_layer_filters_types() {
        let registry = NodeTypeRegistry::default();
        let annotation: Vec<_> = registry
            .for_layer("annotation")
            .iter()
            .map(|node_type| node_type.id().to_owned())
            .collect();
        assert_eq!(annotation, vec!["route", "note"]);
    }

    #[test]
    fn register_replaces_by_id() {
        let mut registry = NodeTypeRegistry::default();
        let count = registry.iter().count();

        registry.register(NodeType::new(
            "water",
            Color::from_rgba8(0, 0, 0, 255),
            None,
            "geographical",
            TypeScale::Terrain,
            TypeFlags::AREA,
        ));

        assert_eq!(registry.iter().count(), count);
        assert_eq!(registry.get("water").unwrap().image(), None);
    }

    #[test]
    fn terrain_scale_and_flags_round_trip() {
        let registry = NodeTypeRegistry::default();
        let grass = registry.get("grass").unwrap();
        assert_eq!(grass.scale(), TypeScale::Terrain);
        assert!(grass.flags().contains(TypeFlags::RECEIVES_BACKGROUND));
        assert!(grass.flags().contains(TypeFlags::GIVES_BACKGROUND));

        let route = registry.get("route").unwrap();
        assert!(route.is_path());
    }
}
