// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stroke path: an ordered run of segments sharing an origin.

use crate::{Line3, Vec3};

/// An ordered sequence of connected segments produced by drag input.
///
/// Segments are stored relative to the origin, so translating the whole
/// path is a single vector update. Vertices are exposed in absolute
/// coordinates: the origin first, then each segment end in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    origin: Vec3,
    /// Segments with endpoints relative to `origin`. The first segment
    /// starts at the relative zero point; each segment starts where the
    /// previous one ended.
    lines: Vec<Line3>,
}

impl Path {
    /// Creates an empty path anchored at `origin`.
    #[must_use]
    pub const fn new(origin: Vec3) -> Self {
        Self {
            origin,
            lines: Vec::new(),
        }
    }

    /// Returns the origin in absolute coordinates.
    #[must_use]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if the path has no segments yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Moves the whole path by `offset`.
    ///
    /// Segments are origin-relative, so only the origin changes.
    pub fn translate(&mut self, offset: Vec3) {
        self.origin = self.origin + offset;
    }

    /// Applies `f` to every segment in place.
    pub fn map_lines<F>(&mut self, f: F)
    where
        F: Fn(Line3) -> Line3,
    {
        for line in &mut self.lines {
            *line = f(*line);
        }
    }

    /// Appends a vertex at the absolute point `vertex`.
    ///
    /// A vertex equal to the current last vertex is a zero-length move and
    /// is ignored.
    pub fn push_vertex(&mut self, vertex: Vec3) {
        let relative = vertex - self.origin;
        let last = self.last_vertex_relative();
        if relative == last {
            return;
        }
        self.lines.push(Line3::new(last, relative));
    }

    /// Removes and returns the most recent segment, in absolute coordinates.
    pub fn pop(&mut self) -> Option<Line3> {
        let origin = self.origin;
        self.lines.pop().map(|line| line + origin)
    }

    /// Returns the current last vertex in absolute coordinates.
    ///
    /// For an empty path this is the origin.
    #[must_use]
    pub fn last_vertex(&self) -> Vec3 {
        self.origin + self.last_vertex_relative()
    }

    /// Iterates the vertices in absolute coordinates, starting with the
    /// origin.
    pub fn vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        core::iter::once(self.origin).chain(self.lines.iter().map(|line| self.origin + line.b))
    }

    /// Iterates the segments in absolute coordinates.
    pub fn lines(&self) -> impl Iterator<Item = Line3> + '_ {
        self.lines.iter().map(|line| *line + self.origin)
    }

    /// Returns the centroid of all vertices (origin included).
    #[must_use]
    pub fn center(&self) -> Vec3 {
        let mut sum = Vec3::ZERO;
        let mut count = 0.0;
        for vertex in self.vertices() {
            sum = sum + vertex;
            count += 1.0;
        }
        sum / count
    }

    /// Returns the distance from the centroid to the farthest vertex.
    #[must_use]
    pub fn radius(&self) -> f64 {
        let center = self.center();
        self.vertices()
            .map(|vertex| (vertex - center).length())
            .fold(0.0, f64::max)
    }

    /// Splits segments in place until every segment is at most `radius`
    /// long.
    ///
    /// The split keeps segment order and connectivity; each overlong
    /// segment is halved at its midpoint until it fits. Runs as an explicit
    /// worklist so arbitrarily long strokes cannot exhaust the stack.
    pub fn bisect(&mut self, radius: f64) {
        if radius <= 0.0 {
            return;
        }

        let mut pending: Vec<Line3> = self.lines.drain(..).rev().collect();
        let mut done = Vec::with_capacity(pending.len());
        while let Some(line) = pending.pop() {
            if line.distance() <= radius {
                done.push(line);
            } else {
                let mid = line.midpoint();
                // The far half goes under the near half so output order is
                // preserved.
                pending.push(Line3::new(mid, line.b));
                pending.push(Line3::new(line.a, mid));
            }
        }
        self.lines = done;
    }

    /// Returns a new path containing only the most recent segment.
    ///
    /// The new path is anchored at the segment's start, so its vertex run
    /// is exactly (start, end). An empty path projects to an empty path at
    /// the same origin.
    #[must_use]
    pub fn last_line_path(&self) -> Self {
        match self.lines.last() {
            Some(last) => {
                let mut projected = Self::new(self.origin + last.a);
                projected
                    .lines
                    .push(Line3::new(Vec3::ZERO, last.b - last.a));
                projected
            }
            None => Self::new(self.origin),
        }
    }

    fn last_vertex_relative(&self) -> Vec3 {
        self.lines.last().map_or(Vec3::ZERO, |line| line.b)
    }
}
