use std::collections::VecDeque;

use hashbrown::HashSet;
use smallvec::SmallVec;

use super::handles::{FixedTriangleHandle, FixedVertexHandle, UndirectedEdge};
use super::math;
use super::mesh::Mesh;

/// Why an edge could not be recovered.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum RecoveryError {
    /// The edge crosses an edge that is already constrained.
    Intersects,
    /// The flip budget ran out.
    NotConverged,
}

/// Forces edges into a triangulation by flipping the edges they cross.
///
/// Every recovered edge is added to the set of constrained edges. Constrained edges are never
/// flipped again, neither by later recoveries nor by [legalize].
pub(crate) struct EdgeRecovery<'a> {
    mesh: &'a mut Mesh,
    constrained: &'a mut HashSet<UndirectedEdge>,
    max_attempts: usize,
    attempts: usize,
    flips: usize,
}

enum Walk {
    /// The edge already exists.
    Found,
    /// A vertex lies exactly on the segment, the edge must be split there.
    Split(FixedVertexHandle),
    /// The segment crosses these edges, ordered from start to end.
    Crossing(Vec<(FixedVertexHandle, FixedVertexHandle)>),
}

impl<'a> EdgeRecovery<'a> {
    /// `max_attempts` limits the number of flip attempts between two calls to
    /// [Self::reset_budget].
    pub fn new(
        mesh: &'a mut Mesh,
        constrained: &'a mut HashSet<UndirectedEdge>,
        max_attempts: usize,
    ) -> Self {
        EdgeRecovery {
            mesh,
            constrained,
            max_attempts,
            attempts: 0,
            flips: 0,
        }
    }

    /// Grants the full flip attempt budget again.
    pub fn reset_budget(&mut self) {
        self.attempts = 0;
    }

    /// The number of flips performed since this recovery was created.
    pub fn flips(&self) -> usize {
        self.flips
    }

    pub fn is_constrained(&self, from: FixedVertexHandle, to: FixedVertexHandle) -> bool {
        self.constrained.contains(&UndirectedEdge::new(from, to))
    }

    /// Makes `from - to` part of the triangulation and marks it as constrained.
    ///
    /// Vertices lying exactly on the segment split it into a chain of collinear edges.
    /// The edges that make up the segment are pushed into `pieces`.
    pub fn recover(
        &mut self,
        from: FixedVertexHandle,
        to: FixedVertexHandle,
        pieces: &mut Vec<UndirectedEdge>,
    ) -> Result<(), RecoveryError> {
        let mut todo: SmallVec<[(FixedVertexHandle, FixedVertexHandle); 4]> = SmallVec::new();
        todo.push((from, to));

        while let Some((from, to)) = todo.pop() {
            if from == to {
                continue;
            }
            match self.walk(from, to)? {
                Walk::Found => {}
                Walk::Split(vertex) => {
                    log::debug!("Splitting constraint at collinear vertex {:?}", vertex);
                    // Process `from - vertex` first
                    todo.push((vertex, to));
                    todo.push((from, vertex));
                    continue;
                }
                Walk::Crossing(crossed) => self.flip_crossed(from, to, crossed)?,
            }

            let edge = UndirectedEdge::new(from, to);
            self.constrained.insert(edge);
            pieces.push(edge);
        }
        Ok(())
    }

    /// Walks from `from` towards `to` and collects all crossed edges.
    fn walk(&self, from: FixedVertexHandle, to: FixedVertexHandle) -> Result<Walk, RecoveryError> {
        if self.mesh.find_edge(from, to).is_some() {
            return Ok(Walk::Found);
        }

        let start = self.mesh.position(from);
        let end = self.mesh.position(to);
        let ahead = |vertex: FixedVertexHandle| {
            let position = self.mesh.position(vertex);
            math::side_query(start, end, position).is_on_line()
                && position.sub(start).dot(end.sub(start)) > 0.0
        };

        // Find the triangle around `from` through which the segment leaves.
        //
        //        left
        //         |
        //  from --+--> to
        //         |
        //       right
        let mut first = None;
        for &triangle in self.mesh.incident_triangles(from) {
            let entry = self.mesh.triangle(triangle);
            let Some(index) = entry.vertices.iter().position(|v| *v == from) else {
                continue;
            };
            let (right, left) = entry.edge(index);
            if ahead(right) {
                return Ok(Walk::Split(right));
            }
            if ahead(left) {
                return Ok(Walk::Split(left));
            }
            let right_side = math::side_query(start, end, self.mesh.position(right));
            let left_side = math::side_query(start, end, self.mesh.position(left));
            if right_side.is_on_right_side() && left_side.is_on_left_side() {
                first = Some((triangle, index, right, left));
                break;
            }
        }

        let Some((mut triangle, mut index, mut right, mut left)) = first else {
            log::warn!("No triangle around {:?} faces {:?}", from, to);
            return Err(RecoveryError::NotConverged);
        };

        let mut crossed = Vec::new();
        loop {
            if self.is_constrained(right, left) {
                return Err(RecoveryError::Intersects);
            }
            crossed.push((right, left));

            let Some(next) = self.mesh.triangle(triangle).neighbors[index] else {
                return Err(RecoveryError::NotConverged);
            };
            let next_entry = self.mesh.triangle(next);
            let Some(next_index) = next_entry.opposite_index(right, left) else {
                return Err(RecoveryError::NotConverged);
            };
            let apex = next_entry.vertices[next_index];
            if apex == to {
                return Ok(Walk::Crossing(crossed));
            }

            let side = math::side_query(start, end, self.mesh.position(apex));
            if side.is_on_line() {
                return Ok(Walk::Split(apex));
            }

            // Continue through the edge of `next` that is still crossed
            let (new_right, new_left) = if side.is_on_left_side() {
                (right, apex)
            } else {
                (apex, left)
            };
            let Some(new_index) = next_entry.opposite_index(new_right, new_left) else {
                return Err(RecoveryError::NotConverged);
            };
            triangle = next;
            index = new_index;
            right = new_right;
            left = new_left;
        }
    }

    /// Flips crossed edges until `from - to` exists.
    ///
    /// Edges whose quad is not strictly convex cannot be flipped yet and are postponed.
    fn flip_crossed(
        &mut self,
        from: FixedVertexHandle,
        to: FixedVertexHandle,
        crossed: Vec<(FixedVertexHandle, FixedVertexHandle)>,
    ) -> Result<(), RecoveryError> {
        let start = self.mesh.position(from);
        let end = self.mesh.position(to);
        let mut queue: VecDeque<_> = crossed.into();

        while let Some((v0, v1)) = queue.pop_front() {
            if self.attempts >= self.max_attempts {
                return Err(RecoveryError::NotConverged);
            }
            self.attempts += 1;

            let Some((triangle, index)) = self.mesh.find_edge(v0, v1) else {
                debug_assert!(false, "Crossed edge vanished");
                continue;
            };
            let entry = self.mesh.triangle(triangle);
            let Some(other) = entry.neighbors[index] else {
                return Err(RecoveryError::NotConverged);
            };
            let apex = entry.vertices[index];
            let Some(other_index) = self.mesh.triangle(other).opposite_index(v0, v1) else {
                return Err(RecoveryError::NotConverged);
            };
            let other_apex = self.mesh.triangle(other).vertices[other_index];

            let p = self.mesh.position(apex);
            let q = self.mesh.position(other_apex);
            let is_convex =
                math::segments_cross(p, q, self.mesh.position(v0), self.mesh.position(v1));
            if !is_convex {
                queue.push_back((v0, v1));
                continue;
            }

            if self.mesh.flip(triangle, index).is_none() {
                return Err(RecoveryError::NotConverged);
            }
            self.flips += 1;

            if math::segments_cross(p, q, start, end) {
                queue.push_back((apex, other_apex));
            }
        }

        debug_assert!(self.mesh.find_edge(from, to).is_some());
        Ok(())
    }
}

/// Restores the Delaunay property for all edges that are not constrained (Lawson flips).
///
/// Only edges between two triangles accepted by `is_inner` are considered. Returns the number
/// of flips.
pub(crate) fn legalize(
    mesh: &mut Mesh,
    constrained: &HashSet<UndirectedEdge>,
    is_inner: impl Fn(FixedVertexHandle) -> bool,
) -> usize {
    let is_inner_triangle = |mesh: &Mesh, triangle: FixedTriangleHandle| {
        mesh.triangle(triangle).vertices.iter().all(|v| is_inner(*v))
    };

    let mut todo = Vec::new();
    for triangle in mesh.live_triangles() {
        if !is_inner_triangle(mesh, triangle) {
            continue;
        }
        let entry = mesh.triangle(triangle);
        for index in 0..3 {
            let (from, to) = entry.edge(index);
            // Every interior edge is seen from both sides, push it once
            if from < to {
                todo.push((from, to));
            }
        }
    }

    let mut flips = 0;
    while let Some((from, to)) = todo.pop() {
        if constrained.contains(&UndirectedEdge::new(from, to)) {
            continue;
        }
        let Some((triangle, index)) = mesh.find_edge(from, to) else {
            continue;
        };
        let entry = mesh.triangle(triangle);
        let Some(other) = entry.neighbors[index] else {
            continue;
        };
        if !is_inner_triangle(mesh, triangle) || !is_inner_triangle(mesh, other) {
            continue;
        }

        let Some(other_index) = mesh.triangle(other).opposite_index(from, to) else {
            continue;
        };
        let apex = entry.vertices[index];
        let other_apex = mesh.triangle(other).vertices[other_index];
        let [v0, v1, v2] = mesh.positions_of(triangle);
        let q = mesh.position(other_apex);
        if !math::contained_in_circumference(v0, v1, v2, q) {
            continue;
        }
        if !math::segments_cross(mesh.position(apex), q, mesh.position(from), mesh.position(to))
        {
            continue;
        }

        //          apex                 apex
        //         /    \               / | \
        //      from --- to    ->    from | to
        //         \    /               \ | /
        //        other_apex          other_apex
        if mesh.flip(triangle, index).is_some() {
            flips += 1;
            todo.push((apex, from));
            todo.push((to, apex));
            todo.push((from, other_apex));
            todo.push((other_apex, to));
        }
    }
    flips
}
