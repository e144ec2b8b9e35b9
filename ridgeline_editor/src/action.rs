// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Undoable editing actions.
//!
//! Every action's [`Action::perform`] applies its mutation and returns
//! the action that exactly reverses it; the undo and redo stacks hold
//! nothing but actions. Bulk actions compose: performing one performs
//! its members in order and returns the reversed list of their inverses.

use kurbo::Point;
use ridgeline_geom::{Path, Vec3};
use ridgeline_map::{
    EdgeRef, InsertNodeOptions, NodeRef, NodeRole, Result, meters_to_units,
};

use crate::context::RenderContext;

/// An undoable mutation of the map.
#[derive(Clone, Debug)]
pub enum Action {
    /// Performs a sequence of actions; the inverse is the reversed
    /// sequence of their inverses.
    Bulk(Vec<Action>),
    /// Renames a node. `None` clears the name.
    ChangeName {
        /// The node to rename.
        node: NodeRef,
        /// The new name.
        name: Option<String>,
    },
    /// Soft-deletes nodes (with descendant and childless-parent
    /// expansion).
    Remove {
        /// The nodes to remove.
        nodes: Vec<NodeRef>,
    },
    /// Restores soft-deleted nodes.
    Unremove {
        /// The exact set to restore.
        nodes: Vec<NodeRef>,
    },
    /// Soft-deletes edges.
    RemoveEdges {
        /// The edges to remove.
        edges: Vec<EdgeRef>,
    },
    /// Restores soft-deleted edges.
    UnremoveEdges {
        /// The edges to restore.
        edges: Vec<EdgeRef>,
    },
    /// Translates a node and its descendants.
    Translate {
        /// The origin node.
        node: NodeRef,
        /// World-unit offset.
        offset: Vec3,
    },
    /// Sets a node's center, effective center, and radius.
    SetNodeSpace {
        /// The node to update.
        node: NodeRef,
        /// New nominal center.
        center: Vec3,
        /// New effective center.
        effective_center: Vec3,
        /// New radius in world units.
        radius: f64,
    },
    /// Stamps brush placements along a stroke path.
    DrawPath(DrawPath),
    /// Collapses near-coincident point children under a parent and
    /// re-derives the parent's space.
    NodeCleanup {
        /// The parent object node.
        parent: NodeRef,
    },
}

/// Inputs of [`Action::DrawPath`].
#[derive(Clone, Debug)]
pub struct DrawPath {
    /// The stroke in canvas pixels.
    pub path: Path,
    /// Draw radius in pixels.
    pub radius: f64,
    /// Node type stamped by the brush.
    pub type_key: String,
    /// The object node the placements go under.
    pub parent: NodeRef,
    /// Layer the placements belong to.
    pub layer: String,
    /// Set on the final segment of a stroke; triggers node cleanup.
    pub complete: bool,
}

impl Action {
    /// Returns `true` if performing the action would change nothing.
    #[must_use]
    pub fn empty(&self) -> bool {
        match self {
            Self::Bulk(actions) => actions.iter().all(Self::empty),
            Self::ChangeName { .. } | Self::SetNodeSpace { .. } | Self::NodeCleanup { .. } => false,
            Self::Remove { nodes } | Self::Unremove { nodes } => nodes.is_empty(),
            Self::RemoveEdges { edges } | Self::UnremoveEdges { edges } => edges.is_empty(),
            Self::Translate { offset, .. } => *offset == Vec3::ZERO,
            Self::DrawPath(draw) => draw.path.is_empty(),
        }
    }

    /// Performs the mutation and returns its inverse.
    pub fn perform(self, ctx: &mut RenderContext) -> Result<Self> {
        match self {
            Self::Bulk(actions) => {
                let mut inverses = Vec::with_capacity(actions.len());
                for action in actions {
                    inverses.push(action.perform(ctx)?);
                }
                inverses.reverse();
                Ok(Self::Bulk(inverses))
            }
            Self::ChangeName { node, name } => {
                let previous = ctx.mapper.name(node)?;
                ctx.mapper.set_name(node, name.as_deref())?;
                Ok(Self::ChangeName {
                    node,
                    name: previous,
                })
            }
            Self::Remove { nodes } => {
                let affected = ctx.mapper.remove_nodes(&nodes)?;
                Ok(Self::Unremove { nodes: affected })
            }
            Self::Unremove { nodes } => {
                ctx.mapper.unremove_nodes(&nodes)?;
                Ok(Self::Remove { nodes })
            }
            Self::RemoveEdges { edges } => {
                ctx.mapper.remove_edges(&edges)?;
                Ok(Self::UnremoveEdges { edges })
            }
            Self::UnremoveEdges { edges } => {
                ctx.mapper.unremove_edges(&edges)?;
                Ok(Self::RemoveEdges { edges })
            }
            Self::Translate { node, offset } => {
                ctx.mapper.translate_node(node, offset)?;
                Ok(Self::Translate {
                    node,
                    offset: -offset,
                })
            }
            Self::SetNodeSpace {
                node,
                center,
                effective_center,
                radius,
            } => {
                let previous = Self::SetNodeSpace {
                    node,
                    center: ctx.mapper.center(node)?,
                    effective_center: ctx.mapper.effective_center(node)?,
                    radius: ctx.mapper.radius(node)?,
                };
                ctx.mapper
                    .set_node_space(node, center, effective_center, radius)?;
                Ok(previous)
            }
            Self::DrawPath(draw) => perform_draw_path(ctx, draw),
            Self::NodeCleanup { parent } => perform_cleanup(ctx, parent),
        }
    }
}

/// One placement along a stroke: the nodes stamped at one vertex.
struct Placement {
    nodes: Vec<NodeRef>,
}

/// The draw-path state machine.
///
/// Walks the (bisected) stroke vertices, stamping perpendicular pairs of
/// point children spaced two radii apart — all four sides at the stroke
/// ends — wiring placements together with edges, bumping each placement
/// one altitude increment above whatever is visible at that screen
/// position, and finally re-deriving effective centers and growing the
/// parent to fit. A completed stroke runs node cleanup on the parent.
fn perform_draw_path(ctx: &mut RenderContext, draw: DrawPath) -> Result<Action> {
    let mut path = draw.path.clone();
    path.bisect(draw.radius);

    let radius_units = ctx.pixels_to_units(draw.radius);
    let altitude_step = meters_to_units(5.0);
    let parent_is_path = ctx
        .mapper
        .node_type(draw.parent)?
        .is_some_and(|node_type| node_type.is_path());

    let parent_space_before = Action::SetNodeSpace {
        node: draw.parent,
        center: ctx.mapper.center(draw.parent)?,
        effective_center: ctx.mapper.effective_center(draw.parent)?,
        radius: ctx.mapper.radius(draw.parent)?,
    };

    let vertices: Vec<Vec3> = path.vertices().collect();
    let last_index = vertices.len() - 1;

    let mut placed: Vec<NodeRef> = Vec::new();
    let mut previous: Option<Placement> = None;
    let mut previous_path_node: Option<NodeRef> = None;
    let mut distance_since_placement = 0.0;

    for (index, &vertex) in vertices.iter().enumerate() {
        if index > 0 {
            distance_since_placement += (vertex - vertices[index - 1]).length();
        }
        let terminal = index == 0 || index == last_index;
        if !terminal && distance_since_placement <= draw.radius / 2.0 {
            continue;
        }
        distance_since_placement = 0.0;

        // Instantaneous travel direction: into the vertex, or out of it
        // at the stroke start.
        let direction = if index == 0 {
            vertices.get(1).map_or(Vec3::ZERO, |next| *next - vertex)
        } else {
            vertex - vertices[index - 1]
        }
        .normalize();
        let direction = if direction == Vec3::ZERO {
            Vec3::new(1.0, 0.0, 0.0)
        } else {
            direction
        };
        let perpendicular = Vec3::new(-direction.y, direction.x, 0.0);

        // One altitude increment above whatever is visible here.
        let screen = Point::new(vertex.x, vertex.y);
        let altitude = match ctx.drawn_part_at_canvas_point(screen, &draw.layer) {
            Some(part) => part.point.z + altitude_step,
            None => 0.0,
        };

        // The ends stamp all four sides; mid-stroke stamps one
        // perpendicular pair.
        let offsets = if terminal {
            vec![
                perpendicular * draw.radius,
                perpendicular * -draw.radius,
                direction * draw.radius,
                direction * -draw.radius,
            ]
        } else {
            vec![perpendicular * draw.radius, perpendicular * -draw.radius]
        };

        let mut nodes = Vec::with_capacity(offsets.len());
        for offset in offsets {
            let canvas = vertex + offset;
            let mut point = ctx.canvas_point_to_map(Point::new(canvas.x, canvas.y));
            point.z = altitude;
            let node = ctx.mapper.insert_node(
                point,
                NodeRole::Point,
                InsertNodeOptions {
                    parent: Some(draw.parent),
                    type_key: draw.type_key.clone(),
                    radius: radius_units,
                    layer: Some(draw.layer.clone()),
                },
            )?;
            nodes.push(node);
        }

        ctx.mapper.insert_edge(nodes[0], nodes[1])?;
        if nodes.len() == 4 {
            ctx.mapper.insert_edge(nodes[2], nodes[3])?;
        }
        if let Some(previous) = &previous {
            ctx.mapper.insert_edge(nodes[0], previous.nodes[0])?;
            ctx.mapper.insert_edge(nodes[1], previous.nodes[1])?;
        }
        placed.extend(nodes.iter().copied());

        if parent_is_path {
            let mut point = ctx.canvas_point_to_map(screen);
            point.z = altitude;
            let path_node = ctx.mapper.insert_node(
                point,
                NodeRole::Path,
                InsertNodeOptions {
                    parent: Some(draw.parent),
                    type_key: draw.type_key.clone(),
                    radius: radius_units,
                    layer: Some(draw.layer.clone()),
                },
            )?;
            if let Some(previous_path) = previous_path_node {
                ctx.mapper.insert_edge(path_node, previous_path)?;
            }
            previous_path_node = Some(path_node);
            placed.push(path_node);
        }

        previous = Some(Placement { nodes });
    }

    // Effective centers settle on the neighborhood mean; radii stretch
    // to its farthest member.
    for &node in &placed {
        let mut points = vec![ctx.mapper.center(node)?];
        for neighbor in ctx.mapper.node_neighbors(node)? {
            points.push(ctx.mapper.center(neighbor)?);
        }
        let mut mean = Vec3::ZERO;
        for point in &points {
            mean = mean + *point;
        }
        let mean = mean / points.len() as f64;
        let spread = points
            .iter()
            .map(|point| (*point - mean).length())
            .fold(0.0, f64::max);
        ctx.mapper.set_effective_center(node, mean)?;
        ctx.mapper.set_radius(node, spread.max(radius_units))?;
    }

    // Grow the parent to cover the new children.
    let parent_center = ctx.mapper.center(draw.parent)?;
    let mut parent_radius = ctx.mapper.radius(draw.parent)?;
    for &node in &placed {
        let center = ctx.mapper.center(node)?;
        let radius = ctx.mapper.radius(node)?;
        parent_radius = parent_radius.max(parent_center.distance_xy(center) + radius);
    }
    ctx.mapper.set_radius(draw.parent, parent_radius)?;

    let mut inverse = Vec::new();
    if draw.complete {
        inverse.push(perform_cleanup(ctx, draw.parent)?);
    }
    inverse.push(parent_space_before);
    inverse.push(Action::Remove { nodes: placed });
    Ok(Action::Bulk(inverse))
}

/// Collapses near-coincident point children and re-derives the parent.
///
/// Pairs of point descendants closer than a quarter of their combined
/// radii merge into the first of the pair; the loser's edges re-wire to
/// the keeper before the loser is removed. The parent's center and
/// effective center become the survivors' centroid, its radius the
/// distance to the farthest survivor.
fn perform_cleanup(ctx: &mut RenderContext, parent: NodeRef) -> Result<Action> {
    let parent_space_before = Action::SetNodeSpace {
        node: parent,
        center: ctx.mapper.center(parent)?,
        effective_center: ctx.mapper.effective_center(parent)?,
        radius: ctx.mapper.radius(parent)?,
    };

    let mut kept: Vec<NodeRef> = Vec::new();
    let mut removed_nodes: Vec<NodeRef> = Vec::new();
    let mut removed_edges: Vec<EdgeRef> = Vec::new();
    let mut created_edges: Vec<EdgeRef> = Vec::new();

    for node in ctx.mapper.descendants(parent)? {
        if ctx.mapper.node_role(node)? != NodeRole::Point {
            continue;
        }
        let center = ctx.mapper.effective_center(node)?;
        let radius = ctx.mapper.radius(node)?;

        let mut merged_into = None;
        for &keeper in &kept {
            let keeper_center = ctx.mapper.effective_center(keeper)?;
            let keeper_radius = ctx.mapper.radius(keeper)?;
            if (keeper_center - center).length() < (radius + keeper_radius) / 4.0 {
                merged_into = Some(keeper);
                break;
            }
        }

        match merged_into {
            Some(keeper) => {
                // Re-wire the loser's edges to the keeper, then drop it.
                for edge in ctx.mapper.node_edges(node)? {
                    ctx.mapper.remove_edges(&[edge.edge])?;
                    removed_edges.push(edge.edge);
                    if edge.other != keeper
                        && ctx
                            .mapper
                            .node_neighbors(keeper)?
                            .iter()
                            .all(|&neighbor| neighbor != edge.other)
                    {
                        created_edges.push(ctx.mapper.insert_edge(keeper, edge.other)?);
                    }
                }
                removed_nodes.extend(ctx.mapper.remove_nodes(&[node])?);
            }
            None => kept.push(node),
        }
    }

    // The parent settles on its survivors.
    let survivors = ctx.mapper.descendants(parent)?;
    if !survivors.is_empty() {
        let mut centroid = Vec3::ZERO;
        for &survivor in &survivors {
            centroid = centroid + ctx.mapper.effective_center(survivor)?;
        }
        let centroid = centroid / survivors.len() as f64;
        let mut radius: f64 = 0.0;
        for &survivor in &survivors {
            let center = ctx.mapper.effective_center(survivor)?;
            radius = radius.max((center - centroid).length());
        }
        ctx.mapper
            .set_node_space(parent, centroid, centroid, radius)?;
    }

    Ok(Action::Bulk(vec![
        parent_space_before,
        Action::RemoveEdges {
            edges: created_edges,
        },
        Action::UnremoveEdges {
            edges: removed_edges,
        },
        Action::Unremove {
            nodes: removed_nodes,
        },
    ]))
}
