use super::handles::FixedVertexHandle;
use super::math;
use crate::Point2;

/// Calculates the convex hull of a vertex set (Andrew's monotone chain).
///
/// The hull is returned in counter clockwise order, starting at the lexicographically
/// smallest vertex. Vertices lying on a hull edge are not part of the result. Returns fewer
/// than three vertices if all input vertices are collinear.
pub(crate) fn convex_hull(
    vertices: &[(FixedVertexHandle, Point2<f64>)],
) -> Vec<FixedVertexHandle> {
    let mut sorted = vertices.to_vec();
    sorted.sort_by(|(_, p0), (_, p1)| {
        p0.x.total_cmp(&p1.x).then_with(|| p0.y.total_cmp(&p1.y))
    });
    sorted.dedup_by(|(_, p0), (_, p1)| p0 == p1);

    if sorted.len() < 3 {
        return sorted.into_iter().map(|(vertex, _)| vertex).collect();
    }

    let mut hull: Vec<(FixedVertexHandle, Point2<f64>)> = Vec::with_capacity(sorted.len() + 1);

    // Lower hull, left to right
    for &entry in &sorted {
        while hull.len() >= 2 && !turns_left(&hull, entry.1) {
            hull.pop();
        }
        hull.push(entry);
    }

    // Upper hull, right to left
    let lower_len = hull.len() + 1;
    for &entry in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len && !turns_left(&hull, entry.1) {
            hull.pop();
        }
        hull.push(entry);
    }

    // The first vertex was added twice
    hull.pop();
    hull.into_iter().map(|(vertex, _)| vertex).collect()
}

fn turns_left(hull: &[(FixedVertexHandle, Point2<f64>)], next: Point2<f64>) -> bool {
    let (_, last) = hull[hull.len() - 1];
    let (_, before_last) = hull[hull.len() - 2];
    math::is_ordered_ccw(before_last, last, next)
}

#[cfg(test)]
mod test {
    use super::convex_hull;
    use crate::test_utilities::{random_points_with_seed, SEED};
    use crate::triangulation_core::handles::FixedVertexHandle;
    use crate::triangulation_core::math;
    use crate::Point2;

    fn with_handles(points: &[Point2<f64>]) -> Vec<(FixedVertexHandle, Point2<f64>)> {
        points
            .iter()
            .enumerate()
            .map(|(index, p)| (FixedVertexHandle::new(index), *p))
            .collect()
    }

    fn indices(hull: Vec<FixedVertexHandle>) -> Vec<usize> {
        hull.into_iter().map(|v| v.index()).collect()
    }

    #[test]
    fn test_square_with_inner_and_edge_points() {
        let points = [
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.5, 0.5),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 0.0),
            Point2::new(0.0, 1.0),
        ];
        let hull = convex_hull(&with_handles(&points));
        assert_eq!(indices(hull), vec![1, 3, 0, 5]);
    }

    #[test]
    fn test_collinear_points() {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(1.0, 1.0),
        ];
        let hull = convex_hull(&with_handles(&points));
        assert!(hull.len() < 3);
    }

    #[test]
    fn test_random_points() {
        let points = random_points_with_seed(300, SEED);
        let hull = convex_hull(&with_handles(&points));
        assert!(hull.len() >= 3);

        for (index, from) in hull.iter().enumerate() {
            let to = hull[(index + 1) % hull.len()];
            let from = points[from.index()];
            let to = points[to.index()];
            for point in &points {
                assert!(math::side_query(from, to, *point).is_on_left_side_or_on_line());
            }
        }
    }
}
