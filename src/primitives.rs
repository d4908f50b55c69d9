#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Point2, Point3};

/// An input or output vertex.
///
/// The flags are carried through the triangulation untouched, they are consumed by the
/// navigation graph builder.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Vertex {
    /// The vertex position. Only `x` and `y` take part in the triangulation.
    pub position: Point3,
    /// Whether the vertex belongs to collision geometry.
    pub collidable: bool,
    /// Whether the vertex may be hidden by the caller.
    pub hideable: bool,
}

impl Vertex {
    /// Creates a new vertex.
    pub fn new(position: Point3, collidable: bool, hideable: bool) -> Self {
        Vertex {
            position,
            collidable,
            hideable,
        }
    }
}

/// The circumscribed circle of a triangle, in the XY plane.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Circumcircle {
    /// The circle's center.
    pub center: Point2<f64>,
    /// The squared radius.
    pub radius_2: f64,
}

impl Circumcircle {
    /// Returns `true` if `point` lies inside or on this circle.
    ///
    /// Evaluated in plain floating point arithmetic, use
    /// [math::contained_in_closed_circumference](crate::math::contained_in_closed_circumference)
    /// for an exact answer.
    pub fn contains(&self, point: Point2<f64>) -> bool {
        point.distance_2(self.center) <= self.radius_2
    }
}

/// An output triangle.
///
/// Vertices are stored counter clockwise as indices into
/// [Triangulator::vertices](crate::Triangulator::vertices).
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Triangle {
    vertices: [usize; 3],
    neighbors: [Option<usize>; 3],
    circumcircle: Circumcircle,
    graph_node_index: u32,
}

impl Triangle {
    pub(crate) fn new(
        vertices: [usize; 3],
        neighbors: [Option<usize>; 3],
        circumcircle: Circumcircle,
    ) -> Self {
        Triangle {
            vertices,
            neighbors,
            circumcircle,
            graph_node_index: 0,
        }
    }

    /// The vertex indices in counter clockwise order.
    pub fn vertices(&self) -> [usize; 3] {
        self.vertices
    }

    /// Returns the indices of the adjacent triangles.
    ///
    /// `neighbors()[i]` shares the edge opposite of `vertices()[i]`. `None` marks a border
    /// edge.
    pub fn neighbors(&self) -> [Option<usize>; 3] {
        self.neighbors
    }

    pub fn circumcircle(&self) -> &Circumcircle {
        &self.circumcircle
    }

    /// An opaque slot owned by the navigation graph builder. Zero after triangulation.
    pub fn graph_node_index(&self) -> u32 {
        self.graph_node_index
    }

    pub fn set_graph_node_index(&mut self, index: u32) {
        self.graph_node_index = index;
    }

    /// Returns `true` if this triangle uses the given vertex.
    pub fn contains_vertex(&self, vertex: usize) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Reverses the vertex order, keeping neighbors attached to their edges.
    pub(crate) fn flip_orientation(&mut self) {
        self.vertices.swap(1, 2);
        self.neighbors.swap(1, 2);
    }
}

/// Summary of a successful [Triangulator::triangulate](crate::Triangulator::triangulate) run.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub struct TriangulationStats {
    /// Number of vertices inserted into the triangulation.
    pub num_vertices: usize,
    /// Number of output triangles.
    pub num_triangles: usize,
    /// Number of cut segments present in the output.
    pub num_cuts_enforced: usize,
    /// Number of cut segments ignored because they were degenerate or touched a dropped vertex.
    pub num_cuts_skipped: usize,
    /// Number of input vertices merged into an earlier vertex.
    pub num_merged_vertices: usize,
    /// Number of input vertices dropped because of invalid coordinates.
    pub num_dropped_vertices: usize,
    /// Number of edge flips performed to enforce edges and restore the Delaunay property.
    pub num_flips: usize,
}
