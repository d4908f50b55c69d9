use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use super::handles::{FixedTriangleHandle, FixedVertexHandle};
use super::math;
use super::mesh::Mesh;
use crate::Point2;

struct CavityEdge {
    from: FixedVertexHandle,
    to: FixedVertexHandle,
    outer: Option<FixedTriangleHandle>,
    owner: FixedTriangleHandle,
}

/// Adds three synthetic vertices forming a triangle that encloses the box `min - max` with
/// plenty of room and returns them.
///
/// ```text
///               s2
///              /  \
///             /    \
///            / +--+ \
///           /  |  |  \
///          /   +--+   \
///        s0 ---------- s1
/// ```
pub(crate) fn create_seed_triangle(
    mesh: &mut Mesh,
    min: Point2<f64>,
    max: Point2<f64>,
    margin: f64,
) -> [FixedVertexHandle; 3] {
    let center = Point2::new((min.x + max.x) * 0.5, (min.y + max.y) * 0.5);
    let mut extent = (max.x - min.x).max(max.y - min.y);
    if !(extent > 0.0) {
        extent = 1.0;
    }
    let m = extent * margin;

    let s0 = mesh.add_vertex(Point2::new(center.x - 2.0 * m, center.y - m));
    let s1 = mesh.add_vertex(Point2::new(center.x + 2.0 * m, center.y - m));
    let s2 = mesh.add_vertex(Point2::new(center.x, center.y + 2.0 * m));
    mesh.create_triangle([s0, s1, s2]);
    [s0, s1, s2]
}

fn circumcircle_contains(mesh: &Mesh, triangle: FixedTriangleHandle, position: Point2<f64>) -> bool {
    if !mesh.triangle(triangle).circle.may_contain(position) {
        return false;
    }
    let [v0, v1, v2] = mesh.positions_of(triangle);
    math::contained_in_closed_circumference(v0, v1, v2, position)
}

fn cavity_boundary(
    mesh: &Mesh,
    cavity: &[FixedTriangleHandle],
    in_cavity: &HashSet<FixedTriangleHandle>,
) -> Vec<CavityEdge> {
    let mut result = Vec::with_capacity(cavity.len() + 2);
    for &owner in cavity {
        let entry = mesh.triangle(owner);
        for index in 0..3 {
            let outer = entry.neighbors[index];
            if outer.map_or(true, |outer| !in_cavity.contains(&outer)) {
                let (from, to) = entry.edge(index);
                result.push(CavityEdge {
                    from,
                    to,
                    outer,
                    owner,
                });
            }
        }
    }
    result
}

/// Inserts a vertex that is already part of the mesh's vertex list into the triangulation
/// (Bowyer-Watson).
///
/// All triangles whose circumcircle contains the vertex are removed and the resulting
/// cavity is re-triangulated by connecting its border to the new vertex. A vertex exactly
/// on a circumcircle counts as inside.
///
/// Returns one of the created triangles, usable as hint for the next insertion, or `None`
/// if the vertex could not be inserted (it lies outside of the mesh or on an existing vertex).
pub(crate) fn insert_vertex(
    mesh: &mut Mesh,
    vertex: FixedVertexHandle,
    hint: Option<FixedTriangleHandle>,
) -> Option<FixedTriangleHandle> {
    let position = mesh.position(vertex);
    let start = mesh.locate(position, hint)?;

    if mesh
        .triangle(start)
        .vertices
        .iter()
        .any(|v| mesh.position(*v) == position)
    {
        log::debug!("Vertex {:?} coincides with an existing vertex", vertex);
        return None;
    }

    let mut cavity = vec![start];
    let mut in_cavity = HashSet::new();
    in_cavity.insert(start);

    let mut todo: SmallVec<[FixedTriangleHandle; 16]> = SmallVec::new();
    todo.push(start);
    while let Some(current) = todo.pop() {
        for neighbor in mesh.triangle(current).neighbors.into_iter().flatten() {
            if in_cavity.contains(&neighbor) {
                continue;
            }
            if circumcircle_contains(mesh, neighbor, position) {
                in_cavity.insert(neighbor);
                cavity.push(neighbor);
                todo.push(neighbor);
            }
        }
    }

    // The cavity must be star shaped as seen from the new vertex. Exact predicates should
    // guarantee this, shrink the cavity if they did not.
    let boundary = loop {
        let boundary = cavity_boundary(mesh, &cavity, &in_cavity);
        let offending = boundary.iter().find(|edge| {
            !math::is_ordered_ccw(mesh.position(edge.from), mesh.position(edge.to), position)
        });

        match offending {
            None => break boundary,
            Some(edge) if edge.owner == start => {
                log::warn!("Vertex {:?} lies on the border of the mesh", vertex);
                return None;
            }
            Some(edge) => {
                let owner = edge.owner;
                log::debug!("Shrinking non star shaped cavity at {:?}", owner);
                in_cavity.remove(&owner);
                cavity.retain(|t| *t != owner);
            }
        }
    };

    for &triangle in &cavity {
        mesh.remove_triangle(triangle);
    }

    let mut created: SmallVec<[(FixedTriangleHandle, FixedVertexHandle); 16]> = SmallVec::new();
    let mut by_start = HashMap::with_capacity(boundary.len());
    for edge in &boundary {
        let triangle = mesh.create_triangle([edge.from, edge.to, vertex]);
        mesh.link(triangle, 2, edge.outer);
        let previous = by_start.insert(edge.from, triangle);
        debug_assert!(previous.is_none(), "Cavity border must be a simple loop");
        created.push((triangle, edge.to));
    }

    // [from, to, vertex] shares the edge (to, vertex) with the triangle starting at `to`
    for &(triangle, to) in &created {
        if let Some(&next) = by_start.get(&to) {
            mesh.link(triangle, 0, Some(next));
        }
    }

    created.last().map(|(triangle, _)| *triangle)
}

#[cfg(test)]
mod test {
    use super::{create_seed_triangle, insert_vertex};
    use crate::test_utilities::{random_points_with_seed, SEED};
    use crate::triangulation_core::math;
    use crate::triangulation_core::mesh::Mesh;
    use crate::Point2;

    fn triangulate(points: &[Point2<f64>]) -> Mesh {
        let mut mesh = Mesh::with_capacity(points.len() + 3);
        let vertices: Vec<_> = points.iter().map(|p| mesh.add_vertex(*p)).collect();
        create_seed_triangle(
            &mut mesh,
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, 1.0),
            16.0,
        );
        let mut hint = None;
        for vertex in vertices {
            hint = insert_vertex(&mut mesh, vertex, hint).or(hint);
        }
        mesh
    }

    #[test]
    fn test_insert_single_vertex() {
        let mesh = triangulate(&[Point2::new(0.0, 0.0)]);
        mesh.sanity_check();
        assert_eq!(mesh.num_triangles(), 3);
    }

    #[test]
    fn test_insert_duplicate_vertex() {
        let mesh = triangulate(&[Point2::new(0.5, 0.5), Point2::new(0.5, 0.5)]);
        mesh.sanity_check();
        assert_eq!(mesh.num_triangles(), 3);
    }

    #[test]
    fn test_insert_cocircular_vertices() {
        let mesh = triangulate(&[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.5, 0.5),
        ]);
        mesh.sanity_check();
        // 8 vertices with 3 of them on the hull
        assert_eq!(mesh.num_triangles(), 2 * 8 - 2 - 3);
    }

    #[test]
    fn test_insert_random_vertices_is_delaunay() {
        let points = random_points_with_seed(200, SEED);
        let mesh = triangulate(&points);
        mesh.sanity_check();
        assert_eq!(mesh.num_triangles(), 2 * (points.len() + 3) - 2 - 3);

        for triangle in mesh.live_triangles() {
            let [v0, v1, v2] = mesh.positions_of(triangle);
            for point in &points {
                assert!(!math::contained_in_circumference(v0, v1, v2, *point));
            }
        }
    }
}
