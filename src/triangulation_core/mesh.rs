use smallvec::SmallVec;

use super::handles::{FixedTriangleHandle, FixedVertexHandle};
use super::math;
use crate::Point2;

/// The circumcircle of a mesh triangle, cached when the triangle is created.
///
/// Only used to cheaply reject triangles far away from a query point. The final
/// decision is always made by the exact in-circle predicate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CachedCircle {
    pub center: Point2<f64>,
    pub radius_2: f64,
    reliable: bool,
}

impl CachedCircle {
    fn new(positions: [Point2<f64>; 3]) -> Self {
        let (center, radius_2) = math::circumcenter(positions);
        let [v0, v1, v2] = positions;
        let b = v1.sub(v0);
        let c = v2.sub(v0);
        let double_area = (b.x * c.y - b.y * c.x).abs();

        // For needle-like triangles the computed center may be far off, never reject those.
        let reliable = center.x.is_finite()
            && center.y.is_finite()
            && radius_2.is_finite()
            && double_area > 1.0e-6 * (b.length2() * c.length2()).sqrt();

        CachedCircle {
            center,
            radius_2,
            reliable,
        }
    }

    /// Returns `false` only if `point` is certainly outside of this circle.
    #[inline]
    pub fn may_contain(&self, point: Point2<f64>) -> bool {
        !self.reliable || point.distance_2(self.center) <= 4.0 * self.radius_2
    }
}

#[derive(Clone, Debug)]
pub(crate) struct TriangleEntry {
    /// Counter-clockwise vertices.
    pub vertices: [FixedVertexHandle; 3],
    /// `neighbors[i]` shares the edge opposite of `vertices[i]`.
    pub neighbors: [Option<FixedTriangleHandle>; 3],
    pub circle: CachedCircle,
    live: bool,
}

impl TriangleEntry {
    /// Returns the directed edge opposite of `vertices[index]`.
    #[inline]
    pub fn edge(&self, index: usize) -> (FixedVertexHandle, FixedVertexHandle) {
        (
            self.vertices[(index + 1) % 3],
            self.vertices[(index + 2) % 3],
        )
    }

    #[cfg(test)]
    pub fn contains_vertex(&self, vertex: FixedVertexHandle) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Returns the index of the vertex opposite of the undirected edge `a - b`.
    pub fn opposite_index(&self, a: FixedVertexHandle, b: FixedVertexHandle) -> Option<usize> {
        (0..3).find(|&index| {
            let (from, to) = self.edge(index);
            (from == a && to == b) || (from == b && to == a)
        })
    }
}

/// Index based triangle arena.
///
/// Vertices are never removed. Removed triangles leave a slot that is reused by the
/// next created triangle. Every vertex keeps the list of its incident triangles.
#[derive(Clone, Debug, Default)]
pub(crate) struct Mesh {
    positions: Vec<Point2<f64>>,
    incident: Vec<SmallVec<[FixedTriangleHandle; 8]>>,
    triangles: Vec<TriangleEntry>,
    free_list: Vec<FixedTriangleHandle>,
    num_live: usize,
}

impl Mesh {
    pub fn with_capacity(num_vertices: usize) -> Self {
        Mesh {
            positions: Vec::with_capacity(num_vertices),
            incident: Vec::with_capacity(num_vertices),
            triangles: Vec::with_capacity(num_vertices * 2 + 1),
            free_list: Vec::new(),
            num_live: 0,
        }
    }

    pub fn add_vertex(&mut self, position: Point2<f64>) -> FixedVertexHandle {
        let handle = FixedVertexHandle::new(self.positions.len());
        self.positions.push(position);
        self.incident.push(SmallVec::new());
        handle
    }

    #[cfg(test)]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.num_live
    }

    #[inline]
    pub fn position(&self, vertex: FixedVertexHandle) -> Point2<f64> {
        self.positions[vertex.index()]
    }

    #[inline]
    pub fn triangle(&self, triangle: FixedTriangleHandle) -> &TriangleEntry {
        &self.triangles[triangle.index()]
    }

    pub fn positions_of(&self, triangle: FixedTriangleHandle) -> [Point2<f64>; 3] {
        self.triangle(triangle).vertices.map(|v| self.position(v))
    }

    pub fn is_live(&self, triangle: FixedTriangleHandle) -> bool {
        self.triangles
            .get(triangle.index())
            .map_or(false, |entry| entry.live)
    }

    /// Iterates over all live triangles in slot order.
    pub fn live_triangles(&self) -> impl Iterator<Item = FixedTriangleHandle> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.live)
            .map(|(index, _)| FixedTriangleHandle::new(index))
    }

    pub fn incident_triangles(&self, vertex: FixedVertexHandle) -> &[FixedTriangleHandle] {
        &self.incident[vertex.index()]
    }

    pub fn create_triangle(&mut self, vertices: [FixedVertexHandle; 3]) -> FixedTriangleHandle {
        debug_assert!(vertices[0] != vertices[1] && vertices[1] != vertices[2]);
        let circle = CachedCircle::new(vertices.map(|v| self.position(v)));
        let entry = TriangleEntry {
            vertices,
            neighbors: [None; 3],
            circle,
            live: true,
        };

        let handle = if let Some(free) = self.free_list.pop() {
            self.triangles[free.index()] = entry;
            free
        } else {
            self.triangles.push(entry);
            FixedTriangleHandle::new(self.triangles.len() - 1)
        };

        self.attach(handle);
        self.num_live += 1;
        handle
    }

    /// Removes a triangle. Neighbors still referring to it must be relinked by the caller.
    pub fn remove_triangle(&mut self, triangle: FixedTriangleHandle) {
        debug_assert!(self.is_live(triangle));
        self.detach(triangle);
        let entry = &mut self.triangles[triangle.index()];
        entry.live = false;
        entry.neighbors = [None; 3];
        self.free_list.push(triangle);
        self.num_live -= 1;
    }

    /// Removes a batch of triangles and unlinks them from their remaining neighbors.
    pub fn remove_triangles(&mut self, doomed: &[FixedTriangleHandle]) {
        for &triangle in doomed {
            let neighbors = self.triangle(triangle).neighbors;
            for neighbor in neighbors.into_iter().flatten() {
                for slot in &mut self.triangles[neighbor.index()].neighbors {
                    if *slot == Some(triangle) {
                        *slot = None;
                    }
                }
            }
            self.remove_triangle(triangle);
        }
    }

    /// Sets the neighbor across edge `index` of `triangle` and updates the back reference of
    /// that neighbor.
    pub fn link(
        &mut self,
        triangle: FixedTriangleHandle,
        index: usize,
        neighbor: Option<FixedTriangleHandle>,
    ) {
        self.triangles[triangle.index()].neighbors[index] = neighbor;
        if let Some(neighbor) = neighbor {
            let (from, to) = self.triangle(triangle).edge(index);
            let back_index = self.triangle(neighbor).opposite_index(from, to);
            debug_assert!(back_index.is_some(), "Linked triangles must share an edge");
            if let Some(back_index) = back_index {
                self.triangles[neighbor.index()].neighbors[back_index] = Some(triangle);
            }
        }
    }

    fn replace_neighbor(
        &mut self,
        triangle: Option<FixedTriangleHandle>,
        old: FixedTriangleHandle,
        new: FixedTriangleHandle,
    ) {
        if let Some(triangle) = triangle {
            for neighbor in &mut self.triangles[triangle.index()].neighbors {
                if *neighbor == Some(old) {
                    *neighbor = Some(new);
                }
            }
        }
    }

    fn attach(&mut self, triangle: FixedTriangleHandle) {
        for vertex in self.triangles[triangle.index()].vertices {
            self.incident[vertex.index()].push(triangle);
        }
    }

    fn detach(&mut self, triangle: FixedTriangleHandle) {
        for vertex in self.triangles[triangle.index()].vertices {
            self.incident[vertex.index()].retain(|t| *t != triangle);
        }
    }

    /// Looks up a triangle containing the edge `a - b`.
    ///
    /// Returns the triangle and the index of the vertex opposite to the edge. If both
    /// triangles of the edge exist, the one containing the directed edge `a -> b` is returned.
    pub fn find_edge(
        &self,
        a: FixedVertexHandle,
        b: FixedVertexHandle,
    ) -> Option<(FixedTriangleHandle, usize)> {
        let mut fallback = None;
        for &triangle in self.incident_triangles(a) {
            let entry = self.triangle(triangle);
            if let Some(index) = entry.opposite_index(a, b) {
                if entry.edge(index) == (a, b) {
                    return Some((triangle, index));
                }
                fallback = Some((triangle, index));
            }
        }
        fallback
    }

    /// Flips the edge opposite of `vertices[index]` of `triangle`.
    ///
    /// The quad formed by both adjacent triangles must be strictly convex. Both triangle
    /// slots are reused, their handles are returned. Returns `None` if the edge lies on the
    /// mesh border.
    pub fn flip(
        &mut self,
        triangle: FixedTriangleHandle,
        index: usize,
    ) -> Option<[FixedTriangleHandle; 2]> {
        //          a                    a
        //        /   \                / | \
        //       /  t  \              /  |  \
        //      b ----- c     ->     b t | u c
        //       \  u  /              \  |  /
        //        \   /                \ | /
        //          d                    d
        let t = triangle;
        let entry = self.triangle(t).clone();
        let u = entry.neighbors[index]?;

        let a = entry.vertices[index];
        let b = entry.vertices[(index + 1) % 3];
        let c = entry.vertices[(index + 2) % 3];

        let other = self.triangle(u).clone();
        let j = other.opposite_index(b, c)?;
        let d = other.vertices[j];
        debug_assert_eq!(other.vertices[(j + 1) % 3], c);
        debug_assert_eq!(other.vertices[(j + 2) % 3], b);

        let t_ab = entry.neighbors[(index + 2) % 3];
        let t_ca = entry.neighbors[(index + 1) % 3];
        let u_bd = other.neighbors[(j + 1) % 3];
        let u_dc = other.neighbors[(j + 2) % 3];

        self.detach(t);
        self.detach(u);

        let t_vertices = [a, b, d];
        let u_vertices = [a, d, c];
        let t_circle = CachedCircle::new(t_vertices.map(|v| self.position(v)));
        let u_circle = CachedCircle::new(u_vertices.map(|v| self.position(v)));

        let t_entry = &mut self.triangles[t.index()];
        t_entry.vertices = t_vertices;
        t_entry.neighbors = [u_bd, Some(u), t_ab];
        t_entry.circle = t_circle;

        let u_entry = &mut self.triangles[u.index()];
        u_entry.vertices = u_vertices;
        u_entry.neighbors = [u_dc, t_ca, Some(t)];
        u_entry.circle = u_circle;

        self.replace_neighbor(u_bd, u, t);
        self.replace_neighbor(t_ca, t, u);

        self.attach(t);
        self.attach(u);
        Some([t, u])
    }

    /// Finds a triangle containing `point` by walking from `hint` towards it.
    ///
    /// Points on an edge or vertex count as contained. Returns `None` if the point lies
    /// outside of the mesh.
    pub fn locate(
        &self,
        point: Point2<f64>,
        hint: Option<FixedTriangleHandle>,
    ) -> Option<FixedTriangleHandle> {
        let start = hint
            .filter(|t| self.is_live(*t))
            .or_else(|| self.live_triangles().next())?;

        let mut current = start;
        for step in 0..self.num_live + 3 {
            let positions = self.positions_of(current);
            let entry = self.triangle(current);

            // Rotating the first tested edge prevents the walk from cycling forever
            let crossed = (0..3).map(|offset| (offset + step) % 3).find(|&i| {
                let from = positions[(i + 1) % 3];
                let to = positions[(i + 2) % 3];
                math::side_query(from, to, point).is_on_right_side()
            });

            match crossed {
                None => return Some(current),
                Some(i) => match entry.neighbors[i] {
                    Some(next) => current = next,
                    None => return None,
                },
            }
        }

        log::debug!("Walk did not terminate, falling back to linear search");
        self.live_triangles()
            .find(|t| math::triangle_contains(self.positions_of(*t), point))
    }

    #[cfg(test)]
    pub fn sanity_check(&self) {
        let mut num_live = 0;
        for (index, entry) in self.triangles.iter().enumerate() {
            if !entry.live {
                continue;
            }
            num_live += 1;
            let handle = FixedTriangleHandle::new(index);
            let [p0, p1, p2] = self.positions_of(handle);
            assert!(math::is_ordered_ccw(p0, p1, p2));

            for (i, neighbor) in entry.neighbors.iter().enumerate() {
                if let Some(neighbor) = neighbor {
                    assert!(self.is_live(*neighbor));
                    let (from, to) = entry.edge(i);
                    let back = self.triangle(*neighbor).opposite_index(from, to).unwrap();
                    assert_eq!(self.triangle(*neighbor).neighbors[back], Some(handle));
                }
            }

            for vertex in entry.vertices {
                assert!(self.incident_triangles(vertex).contains(&handle));
            }
        }
        assert_eq!(num_live, self.num_live);

        for (index, incident) in self.incident.iter().enumerate() {
            let vertex = FixedVertexHandle::new(index);
            for triangle in incident {
                assert!(self.is_live(*triangle));
                assert!(self.triangle(*triangle).contains_vertex(vertex));
            }
        }
    }
}
