use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use super::handles::{FixedTriangleHandle, FixedVertexHandle, UndirectedEdge};
use super::mesh::Mesh;

/// Removes every triangle that uses one of the synthetic enclosing vertices.
///
/// Returns the number of removed triangles.
pub(crate) fn remove_seed_triangles(
    mesh: &mut Mesh,
    is_seed: impl Fn(FixedVertexHandle) -> bool,
) -> usize {
    let doomed: Vec<_> = mesh
        .live_triangles()
        .filter(|t| mesh.triangle(*t).vertices.iter().any(|v| is_seed(*v)))
        .collect();
    mesh.remove_triangles(&doomed);
    doomed.len()
}

/// Assigns each triangle the number of cuts that must be crossed to reach it from outside
/// of the mesh.
///
/// Leaving the mesh through a border edge that is a cut counts as one crossing.
pub(crate) fn cut_depths(
    mesh: &Mesh,
    cuts: &HashSet<UndirectedEdge>,
) -> HashMap<FixedTriangleHandle, usize> {
    let is_cut = |from, to| cuts.contains(&UndirectedEdge::new(from, to));

    let mut depths = HashMap::with_capacity(mesh.num_triangles());
    let mut queue = VecDeque::new();

    for triangle in mesh.live_triangles() {
        let entry = mesh.triangle(triangle);
        let depth = (0..3)
            .filter(|&index| entry.neighbors[index].is_none())
            .map(|index| {
                let (from, to) = entry.edge(index);
                usize::from(is_cut(from, to))
            })
            .min();
        if let Some(depth) = depth {
            depths.insert(triangle, depth);
            if depth == 0 {
                queue.push_front((triangle, depth));
            } else {
                queue.push_back((triangle, depth));
            }
        }
    }

    // 0-1 breadth first search, crossing a cut costs one.
    while let Some((triangle, depth)) = queue.pop_front() {
        if depths.get(&triangle).map_or(false, |known| *known < depth) {
            continue;
        }
        let entry = mesh.triangle(triangle);
        for index in 0..3 {
            let Some(neighbor) = entry.neighbors[index] else {
                continue;
            };
            let (from, to) = entry.edge(index);
            let crosses = is_cut(from, to);
            let next_depth = depth + usize::from(crosses);
            if depths.get(&neighbor).map_or(true, |known| next_depth < *known) {
                depths.insert(neighbor, next_depth);
                if crosses {
                    queue.push_back((neighbor, next_depth));
                } else {
                    queue.push_front((neighbor, next_depth));
                }
            }
        }
    }
    depths
}

/// Removes all triangles that lie outside of closed cut loops.
///
/// Triangles with an even cut depth are outside. A loop nested inside another loop cuts a
/// hole into it, a loop nested inside that hole is an island again.
///
/// Returns the number of removed triangles.
pub(crate) fn exclude_outer_regions(mesh: &mut Mesh, cuts: &HashSet<UndirectedEdge>) -> usize {
    let depths = cut_depths(mesh, cuts);
    let doomed: Vec<_> = mesh
        .live_triangles()
        .filter(|t| depths.get(t).map_or(true, |depth| depth % 2 == 0))
        .collect();
    mesh.remove_triangles(&doomed);
    log::debug!("Excluded {} triangles outside of cut loops", doomed.len());
    doomed.len()
}

#[cfg(test)]
mod test {
    use hashbrown::HashSet;

    use super::{cut_depths, exclude_outer_regions, remove_seed_triangles};
    use crate::triangulation_core::constraints::EdgeRecovery;
    use crate::triangulation_core::handles::UndirectedEdge;
    use crate::triangulation_core::insertion::{create_seed_triangle, insert_vertex};
    use crate::triangulation_core::mesh::Mesh;
    use crate::Point2;

    /// Two nested squares whose outlines are optionally registered as cuts.
    fn nested_squares(cut_outer: bool, cut_inner: bool) -> (Mesh, HashSet<UndirectedEdge>) {
        let points = [
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
            Point2::new(-0.4, -0.4),
            Point2::new(0.4, -0.4),
            Point2::new(0.4, 0.4),
            Point2::new(-0.4, 0.4),
        ];
        let mut mesh = Mesh::with_capacity(points.len() + 3);
        let vertices: Vec<_> = points.iter().map(|p| mesh.add_vertex(*p)).collect();
        create_seed_triangle(&mut mesh, points[0], points[2], 16.0);
        let mut hint = None;
        for vertex in &vertices {
            hint = insert_vertex(&mut mesh, *vertex, hint).or(hint);
        }

        let mut constrained = HashSet::new();
        let mut cuts = Vec::new();
        let mut hull = Vec::new();
        let mut recovery = EdgeRecovery::new(&mut mesh, &mut constrained, 1000);
        for i in 0..4 {
            let outer = (vertices[i], vertices[(i + 1) % 4]);
            let inner = (vertices[4 + i], vertices[4 + (i + 1) % 4]);
            let target = if cut_outer { &mut cuts } else { &mut hull };
            recovery.recover(outer.0, outer.1, target).unwrap();
            if cut_inner {
                recovery.recover(inner.0, inner.1, &mut cuts).unwrap();
            }
        }

        remove_seed_triangles(&mut mesh, |v| v.index() >= points.len());
        (mesh, cuts.into_iter().collect())
    }

    #[test]
    fn test_remove_seed_triangles() {
        let (mesh, _) = nested_squares(false, false);
        mesh.sanity_check();
        // 8 vertices, 4 of them on the hull
        assert_eq!(mesh.num_triangles(), 2 * 8 - 2 - 4);
    }

    #[test]
    fn test_cut_depths() {
        let (mesh, cuts) = nested_squares(true, true);
        let depths = cut_depths(&mesh, &cuts);
        assert_eq!(depths.len(), mesh.num_triangles());
        assert_eq!(depths.values().filter(|d| **d == 2).count(), 2);
        assert_eq!(depths.values().filter(|d| **d == 1).count(), 8);
    }

    #[test]
    fn test_exclude_hole() {
        let (mut mesh, cuts) = nested_squares(true, true);
        let removed = exclude_outer_regions(&mut mesh, &cuts);
        mesh.sanity_check();
        assert_eq!(removed, 2);
        assert_eq!(mesh.num_triangles(), 8);
    }

    #[test]
    fn test_exclude_island() {
        let (mut mesh, cuts) = nested_squares(false, true);
        let removed = exclude_outer_regions(&mut mesh, &cuts);
        mesh.sanity_check();
        assert_eq!(removed, 8);
        assert_eq!(mesh.num_triangles(), 2);
    }

    #[test]
    fn test_exclude_without_loops_removes_everything() {
        let (mut mesh, cuts) = nested_squares(false, false);
        assert!(cuts.is_empty());
        exclude_outer_regions(&mut mesh, &cuts);
        assert_eq!(mesh.num_triangles(), 0);
    }
}
