use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::config::TriangulatorConfig;
use crate::dedup::{self, VertexGrid};
use crate::math;
use crate::primitives::{Circumcircle, Triangle, TriangulationStats, Vertex};
use crate::triangulation_core::{
    convex_hull, create_seed_triangle, exclude_outer_regions, insert_vertex, legalize,
    remove_seed_triangles, EdgeRecovery, FixedVertexHandle, Mesh, RecoveryError,
};
use crate::{Point2, Point3, TriangulationError};

/// Builds a constrained Delaunay triangulation from vertices and cut segments.
///
/// Vertices and cut segments are registered first, [Triangulator::triangulate] then builds
/// the mesh in one go:
///  1. Vertices with invalid coordinates are dropped, vertices closer than the configured
///     epsilon are merged.
///  2. All vertices are inserted into a large enclosing triangle (Bowyer-Watson).
///  3. The edges of the convex hull and all cut segments are forced into the mesh by
///     flipping the edges they cross. Afterwards, every unconstrained edge is made
///     locally Delaunay again.
///  4. Triangles touching the enclosing triangle are removed. Optionally, all triangles
///     outside of closed cut loops are removed as well
///     (see [TriangulatorConfig::exclude_outer_regions]).
///
/// The result of the last successful run can be accessed with [Triangulator::triangles] and
/// [Triangulator::vertices]. Output vertex indices are identical to the indices returned by
/// [Triangulator::add_vertex].
///
/// # Example
///
/// ```
/// use nav_triangulator::{Point3, Triangulator};
///
/// # fn main() -> Result<(), nav_triangulator::TriangulationError> {
/// let mut triangulator = Triangulator::new();
/// triangulator.add_vertex(0.0, 0.0, 0.0, false, false);
/// triangulator.add_vertex(1.0, 0.0, 0.0, false, false);
/// triangulator.add_vertex(1.0, 1.0, 0.0, false, false);
/// triangulator.add_vertex(0.0, 1.0, 0.0, false, false);
///
/// // Force the diagonal into the mesh
/// triangulator.add_segment(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0));
///
/// let stats = triangulator.triangulate()?;
/// assert_eq!(stats.num_triangles, 2);
/// for triangle in triangulator.triangles() {
///     assert!(triangulator.is_anti_clockwise(triangle));
///     assert!(triangle.contains_vertex(0) && triangle.contains_vertex(2));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Triangulator {
    config: TriangulatorConfig,

    input: Vec<Vertex>,
    positions: Vec<Point2<f64>>,
    grid: VertexGrid,
    bounding_box: Option<(Point3, Point3)>,
    num_merged_on_add: usize,
    segments: Vec<[usize; 2]>,
    segment_cursor: usize,

    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    vertex_triangles: Vec<SmallVec<[usize; 8]>>,
}

impl Default for Triangulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Output of a successful run, published only once everything succeeded.
struct Build {
    triangles: Vec<Triangle>,
    vertex_triangles: Vec<SmallVec<[usize; 8]>>,
    stats: TriangulationStats,
}

impl Triangulator {
    /// Creates an empty triangulator with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TriangulatorConfig::default())
    }

    /// Creates an empty triangulator.
    pub fn with_config(config: TriangulatorConfig) -> Self {
        Triangulator {
            grid: VertexGrid::new(config.epsilon()),
            config,
            input: Vec::new(),
            positions: Vec::new(),
            bounding_box: None,
            num_merged_on_add: 0,
            segments: Vec::new(),
            segment_cursor: 0,
            vertices: Vec::new(),
            triangles: Vec::new(),
            vertex_triangles: Vec::new(),
        }
    }

    pub fn config(&self) -> &TriangulatorConfig {
        &self.config
    }

    /// Reserves capacity for at least `additional` more vertices.
    pub fn reserve(&mut self, additional: usize) {
        self.input.reserve(additional);
        self.positions.reserve(additional);
        self.grid.reserve(additional);
    }

    /// Registers a vertex and returns its index.
    ///
    /// If a vertex already exists closer than the configured epsilon in the XY plane, the index
    /// of the earliest such vertex is returned and nothing is added.
    ///
    /// Vertices with coordinates that cannot be triangulated (see
    /// [validate_coordinate](crate::math::validate_coordinate)) are accepted but ignored by
    /// [Triangulator::triangulate].
    pub fn add_vertex(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        collidable: bool,
        hideable: bool,
    ) -> usize {
        let position = Point2::new(x, y);
        let is_valid = math::validate_position(position).is_ok();

        if is_valid {
            if let Some(existing) = self.grid.find(&self.positions, position) {
                self.num_merged_on_add += 1;
                return existing;
            }
        }

        let index = self.input.len();
        let point = Point3::new(x, y, z);
        self.input.push(Vertex::new(point, collidable, hideable));
        self.positions.push(position);

        if is_valid {
            self.grid.insert(position, index);
            self.bounding_box = Some(match self.bounding_box {
                Some((min, max)) => (min.component_min(point), max.component_max(point)),
                None => (point, point),
            });
        }
        index
    }

    /// Registers a cut segment. The resulting mesh will contain an edge chain connecting both
    /// points.
    ///
    /// Both end points are added with [Triangulator::add_vertex] as collidable, non hideable
    /// vertices unless a vertex already exists at their location. Segments that collapse into
    /// a single vertex are ignored during triangulation.
    pub fn add_segment(&mut self, from: Point3, to: Point3) {
        let from = self.add_vertex(from.x, from.y, from.z, true, false);
        let to = self.add_vertex(to.x, to.y, to.z, true, false);
        self.segments.push([from, to]);
    }

    /// Registers a chain of cut segments through `points`.
    ///
    /// If `closed` is set and at least three points are given, the last point is connected to
    /// the first.
    pub fn add_polygon(&mut self, points: &[Point3], closed: bool) {
        for pair in points.windows(2) {
            self.add_segment(pair[0], pair[1]);
        }
        if closed && points.len() >= 3 {
            if let (Some(last), Some(first)) = (points.last(), points.first()) {
                self.add_segment(*last, *first);
            }
        }
    }

    /// Returns the next cut segment in insertion order and advances the segment cursor.
    ///
    /// Returns `None` once all segments have been returned. The cursor is reset by
    /// [Triangulator::reset_segment_cursor] and by every successful triangulation.
    pub fn next_segment(&mut self) -> Option<(Point3, Point3)> {
        let [from, to] = *self.segments.get(self.segment_cursor)?;
        self.segment_cursor += 1;
        Some((self.input[from].position, self.input[to].position))
    }

    pub fn reset_segment_cursor(&mut self) {
        self.segment_cursor = 0;
    }

    /// Iterates over all cut segments without touching the segment cursor.
    pub fn segments(&self) -> impl Iterator<Item = (Point3, Point3)> + '_ {
        self.segments
            .iter()
            .map(|[from, to]| (self.input[*from].position, self.input[*to].position))
    }

    pub fn num_input_vertices(&self) -> usize {
        self.input.len()
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Returns the smallest and largest corner of all valid registered vertices.
    pub fn bounding_box(&self) -> Option<(Point3, Point3)> {
        self.bounding_box
    }

    /// Returns `true` if a registered vertex lies within `tolerance` of `(x, y)`.
    ///
    /// This is a linear scan over all registered vertices, independent of the configured
    /// epsilon.
    pub fn does_vertex_exist_2d(&self, x: f64, y: f64, tolerance: f64) -> bool {
        let query = Point2::new(x, y);
        let tolerance_2 = tolerance * tolerance;
        self.positions
            .iter()
            .any(|position| position.distance_2(query) <= tolerance_2)
    }

    /// Removes all vertices, segments and the last result.
    pub fn clear(&mut self) {
        self.input.clear();
        self.positions.clear();
        self.grid.clear();
        self.bounding_box = None;
        self.num_merged_on_add = 0;
        self.segments.clear();
        self.segment_cursor = 0;
        self.vertices.clear();
        self.triangles.clear();
        self.vertex_triangles.clear();
    }

    /// The triangles of the last successful run.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Gives mutable access to the triangles of the last successful run.
    ///
    /// Only the graph node index of a triangle can be modified.
    pub fn triangles_mut(&mut self) -> &mut [Triangle] {
        &mut self.triangles
    }

    /// The vertices of the last successful run.
    ///
    /// Contains every vertex registered at that time, including vertices that were dropped
    /// and are not used by any triangle.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Sets the graph node index of a triangle. Returns `false` if the triangle doesn't exist.
    pub fn set_graph_node_index(&mut self, triangle: usize, index: u32) -> bool {
        match self.triangles.get_mut(triangle) {
            Some(triangle) => {
                triangle.set_graph_node_index(index);
                true
            }
            None => false,
        }
    }

    /// Returns the indices of all triangles using an output vertex.
    pub fn triangles_of_vertex(&self, vertex: usize) -> &[usize] {
        self.vertex_triangles
            .get(vertex)
            .map_or(&[], |triangles| triangles.as_slice())
    }

    /// Returns the index of a triangle containing `(x, y)`, borders included.
    pub fn locate(&self, x: f64, y: f64) -> Option<usize> {
        let query = Point2::new(x, y);
        self.triangles.iter().position(|triangle| {
            self.triangle_positions(triangle)
                .map_or(false, |positions| math::triangle_contains(positions, query))
        })
    }

    /// Returns `true` if a triangle's vertices are ordered counter clockwise in the XY plane.
    ///
    /// The orientation is evaluated exactly, so this agrees with the orientation tests used
    /// while building the mesh even for sliver triangles.
    ///
    /// Triangles that refer to vertices unknown to this triangulator are never counter
    /// clockwise.
    pub fn is_anti_clockwise(&self, triangle: &Triangle) -> bool {
        self.triangle_positions(triangle)
            .map_or(false, |[v0, v1, v2]| math::is_ordered_ccw(v0, v1, v2))
    }

    fn triangle_positions(&self, triangle: &Triangle) -> Option<[Point2<f64>; 3]> {
        let [v0, v1, v2] = triangle.vertices();
        Some([
            self.vertices.get(v0)?.position.xy(),
            self.vertices.get(v1)?.position.xy(),
            self.vertices.get(v2)?.position.xy(),
        ])
    }

    /// Triangulates all registered vertices and cut segments.
    ///
    /// On success, the new triangles and vertices replace the previous result. On failure the
    /// previous result stays untouched.
    ///
    /// # Errors
    ///
    /// * [TriangulationError::InsufficientVertices] if fewer than 3 distinct valid vertices
    ///   exist.
    /// * [TriangulationError::CollinearVertices] if all of them lie on a line.
    /// * [TriangulationError::IntersectingCuts] if two cut segments cross each other.
    /// * [TriangulationError::CutNotConverged] and [TriangulationError::HullNotConverged] if
    ///   an edge could not be enforced within
    ///   [TriangulatorConfig::max_flips_per_cut] flip attempts.
    ///
    /// With [TriangulatorConfig::exclude_outer_regions] enabled, only triangles inside closed
    /// cut loops are kept. If no cut lies on the convex hull, the walkable area must be
    /// outlined by its own cut loop: open walls alone yield an empty mesh, forbidden area
    /// loops alone keep only their interiors. Both cases are logged as a warning.
    pub fn triangulate(&mut self) -> Result<TriangulationStats, TriangulationError> {
        match self.build() {
            Ok(build) => {
                self.vertices = self.input.clone();
                self.triangles = build.triangles;
                self.vertex_triangles = build.vertex_triangles;
                self.segment_cursor = 0;
                log::debug!("Triangulation finished: {:?}", build.stats);
                Ok(build.stats)
            }
            Err(error) => {
                log::warn!("Triangulation failed: {}", error);
                Err(error)
            }
        }
    }

    fn build(&self) -> Result<Build, TriangulationError> {
        let epsilon = self.config.epsilon();
        let remap = dedup::build_remap(&self.positions, epsilon);
        let usable: Vec<_> = remap
            .representatives()
            .map(|index| (FixedVertexHandle::new(index), self.positions[index]))
            .collect();

        log::debug!(
            "Triangulating {} of {} vertices with {} cut segments",
            usable.len(),
            self.positions.len(),
            self.segments.len()
        );

        if usable.len() < 3 {
            return Err(TriangulationError::InsufficientVertices {
                usable: usable.len(),
            });
        }

        let hull = convex_hull(&usable);
        if hull.len() < 3 {
            return Err(TriangulationError::CollinearVertices);
        }

        // Mesh vertex handles are identical to input indices, the enclosing vertices follow.
        let num_input = self.positions.len();
        let mut mesh = Mesh::with_capacity(num_input + 3);
        for position in &self.positions {
            mesh.add_vertex(*position);
        }
        let (min, max) = bounds(&usable);
        create_seed_triangle(&mut mesh, min, max, self.config.super_triangle_margin());

        let mut inserted = vec![false; num_input];
        let mut num_dropped = remap.num_dropped;
        let mut hint = None;
        for &(vertex, _) in &usable {
            match insert_vertex(&mut mesh, vertex, hint) {
                Some(created) => {
                    hint = Some(created);
                    inserted[vertex.index()] = true;
                }
                None => {
                    log::warn!("Vertex {} could not be inserted", vertex.index());
                    num_dropped += 1;
                }
            }
        }
        let num_vertices = inserted.iter().filter(|is_inserted| **is_inserted).count();

        let mut constrained = HashSet::new();
        let mut cut_edges = HashSet::new();
        let mut num_cuts_enforced = 0;
        let mut num_cuts_skipped = 0;

        let mut recovery =
            EdgeRecovery::new(&mut mesh, &mut constrained, self.config.max_flips_per_cut());
        let mut pieces = Vec::new();
        let mut hull_edges = Vec::with_capacity(hull.len());

        for (index, from) in hull.iter().enumerate() {
            let to = hull[(index + 1) % hull.len()];
            recovery.reset_budget();
            recovery
                .recover(*from, to, &mut pieces)
                .map_err(|_| TriangulationError::HullNotConverged {
                    flips: recovery.flips(),
                })?;
        }
        hull_edges.append(&mut pieces);

        for (cut, &[from, to]) in self.segments.iter().enumerate() {
            let endpoints = (remap.canonical[from], remap.canonical[to]);
            let (Some(from), Some(to)) = endpoints else {
                log::warn!("Skipping cut segment {} with an invalid end point", cut);
                num_cuts_skipped += 1;
                continue;
            };
            if from == to || !inserted[from] || !inserted[to] {
                log::debug!("Skipping degenerate cut segment {}", cut);
                num_cuts_skipped += 1;
                continue;
            }

            let chain = split_cut(&usable, &inserted, from, to, epsilon);
            let flips_before = recovery.flips();
            recovery.reset_budget();
            pieces.clear();
            for pair in chain.windows(2) {
                recovery
                    .recover(pair[0], pair[1], &mut pieces)
                    .map_err(|error| match error {
                        RecoveryError::Intersects => TriangulationError::IntersectingCuts { cut },
                        RecoveryError::NotConverged => TriangulationError::CutNotConverged {
                            cut,
                            flips: recovery.flips() - flips_before,
                        },
                    })?;
            }
            cut_edges.extend(pieces.iter().copied());
            num_cuts_enforced += 1;
        }

        let mut num_flips = recovery.flips();
        num_flips += legalize(&mut mesh, &constrained, |v| v.index() < num_input);

        remove_seed_triangles(&mut mesh, |v| v.index() >= num_input);
        if self.config.excludes_outer_regions() {
            if !hull_edges.iter().any(|edge| cut_edges.contains(edge)) {
                log::warn!(
                    "No cut lies on the convex hull, only the inside of cut loops is kept"
                );
            }
            exclude_outer_regions(&mut mesh, &cut_edges);
            if mesh.num_triangles() == 0 {
                log::warn!("Excluding outer regions removed every triangle");
            }
        }

        let (triangles, vertex_triangles) = export(&mesh, num_input);
        let stats = TriangulationStats {
            num_vertices,
            num_triangles: triangles.len(),
            num_cuts_enforced,
            num_cuts_skipped,
            num_merged_vertices: self.num_merged_on_add + remap.num_merged,
            num_dropped_vertices: num_dropped,
            num_flips,
        };

        Ok(Build {
            triangles,
            vertex_triangles,
            stats,
        })
    }
}

fn bounds(vertices: &[(FixedVertexHandle, Point2<f64>)]) -> (Point2<f64>, Point2<f64>) {
    let mut min = Point2::new(f64::MAX, f64::MAX);
    let mut max = Point2::new(f64::MIN, f64::MIN);
    for (_, position) in vertices {
        min = Point2::new(min.x.min(position.x), min.y.min(position.y));
        max = Point2::new(max.x.max(position.x), max.y.max(position.y));
    }
    (min, max)
}

/// Returns the vertex chain a cut segment must follow.
///
/// Every inserted vertex within `epsilon` of the segment's interior becomes part of the
/// chain, ordered by its projection onto the segment.
fn split_cut(
    vertices: &[(FixedVertexHandle, Point2<f64>)],
    inserted: &[bool],
    from: usize,
    to: usize,
    epsilon: f64,
) -> Vec<FixedVertexHandle> {
    let start = vertices
        .iter()
        .find(|(vertex, _)| vertex.index() == from)
        .map(|(_, position)| *position);
    let end = vertices
        .iter()
        .find(|(vertex, _)| vertex.index() == to)
        .map(|(_, position)| *position);

    let mut chain = vec![FixedVertexHandle::new(from)];
    if let (Some(start), Some(end)) = (start, end) {
        let epsilon_2 = epsilon * epsilon;
        let mut between: Vec<(f64, FixedVertexHandle)> = vertices
            .iter()
            .filter(|(vertex, _)| {
                vertex.index() != from && vertex.index() != to && inserted[vertex.index()]
            })
            .filter_map(|(vertex, position)| {
                let projection = math::project_point(start, end, *position);
                let is_close = projection.is_strictly_inside_edge()
                    && math::distance_2(start, end, *position) <= epsilon_2;
                is_close.then(|| (projection.relative_position(), *vertex))
            })
            .collect();
        between.sort_by(|(t0, v0), (t1, v1)| t0.total_cmp(t1).then(v0.cmp(v1)));

        if !between.is_empty() {
            log::debug!(
                "Cut segment {} - {} passes {} vertices",
                from,
                to,
                between.len()
            );
        }
        chain.extend(between.into_iter().map(|(_, vertex)| vertex));
    }
    chain.push(FixedVertexHandle::new(to));
    chain
}

/// Converts the remaining mesh triangles into output triangles and per vertex incidence lists.
fn export(mesh: &Mesh, num_vertices: usize) -> (Vec<Triangle>, Vec<SmallVec<[usize; 8]>>) {
    let handles: Vec<_> = mesh.live_triangles().collect();
    let output_index: HashMap<_, _> = handles
        .iter()
        .enumerate()
        .map(|(index, handle)| (*handle, index))
        .collect();

    let mut triangles = Vec::with_capacity(handles.len());
    let mut vertex_triangles = vec![SmallVec::new(); num_vertices];
    for (index, handle) in handles.iter().enumerate() {
        let entry = mesh.triangle(*handle);
        let positions = mesh.positions_of(*handle);
        let (center, radius_2) = math::circumcenter(positions);
        let mut triangle = Triangle::new(
            entry.vertices.map(|v| v.index()),
            entry
                .neighbors
                .map(|neighbor| neighbor.and_then(|n| output_index.get(&n).copied())),
            Circumcircle { center, radius_2 },
        );

        let [p0, p1, p2] = positions;
        if math::side_query(p0, p1, p2).is_on_right_side() {
            log::warn!("Repairing orientation of triangle {}", index);
            triangle.flip_orientation();
        }

        for vertex in triangle.vertices() {
            vertex_triangles[vertex].push(index);
        }
        triangles.push(triangle);
    }
    (triangles, vertex_triangles)
}
