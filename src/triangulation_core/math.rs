use crate::{CoordNum, InvalidCoordinate, LineSideInfo, Point2};
use num_traits::Float;

/// Indicates a point's projected position relative to a segment.
pub struct PointProjection<S> {
    factor: S,
    length_2: S,
}

/// The smallest allowed coordinate value greater than zero that can be triangulated.
/// This value is equal to 2<sup>-142</sup>.
///
/// The *absolute value* of any vertex coordinate must be either zero or greater
/// than or equal to this value, otherwise the exact predicates may underflow.
///
/// *See also [validate_coordinate], [MAX_ALLOWED_VALUE]*

// These bounds come from Shewchuk's analysis of the adaptive predicates: inputs with
// exponents in the range -[142, 201] will neither overflow nor underflow.
pub const MIN_ALLOWED_VALUE: f64 = 1.793662034335766e-43; // 1.0 * 2^-142

/// The largest allowed coordinate value that can be triangulated.
/// This value is equal to 2<sup>201</sup>.
///
/// *See also [validate_coordinate], [MIN_ALLOWED_VALUE]*
pub const MAX_ALLOWED_VALUE: f64 = 3.2138760885179806e60; // 1.0 * 2^201

/// Checks if a coordinate value is suitable for triangulation.
///
/// Will return an error if and only if
///  - The absolute value of the coordinate is too small (See [MIN_ALLOWED_VALUE])
///  - The absolute value of the coordinate is too large (See [MAX_ALLOWED_VALUE])
///  - The coordinate is NaN (not a number)
///
/// Passing in any non-finite number (e.g. `f64::NEG_INFINITY`) will
/// result in `Err(InvalidCoordinate::TooLarge)`.
///
/// Vertices failing this check are accepted by
/// [Triangulator::add_vertex](crate::Triangulator::add_vertex) but never reach the mesh.
pub fn validate_coordinate<S: CoordNum>(value: S) -> Result<(), InvalidCoordinate> {
    let as_f64: f64 = value.into();
    if as_f64.is_nan() {
        Err(InvalidCoordinate::NAN)
    } else if as_f64.abs() < MIN_ALLOWED_VALUE && as_f64 != 0.0 {
        Err(InvalidCoordinate::TooSmall)
    } else if as_f64.abs() > MAX_ALLOWED_VALUE {
        Err(InvalidCoordinate::TooLarge)
    } else {
        Ok(())
    }
}

/// Checks both plane coordinates of a position, see [validate_coordinate].
pub fn validate_position<S: CoordNum>(position: Point2<S>) -> Result<(), InvalidCoordinate> {
    validate_coordinate(position.x)?;
    validate_coordinate(position.y)?;
    Ok(())
}

impl<S: CoordNum> PointProjection<S> {
    fn new(factor: S, length_2: S) -> Self {
        Self { factor, length_2 }
    }

    /// Returns `true` if a point's projection is located before the segment start.
    pub fn is_before_edge(&self) -> bool {
        self.factor < S::zero()
    }

    /// Returns `true` if a point's projection is located behind the segment end.
    pub fn is_behind_edge(&self) -> bool {
        self.factor > self.length_2
    }

    /// Returns `true` if a point's projection is located on the segment, end points included.
    pub fn is_on_edge(&self) -> bool {
        !self.is_before_edge() && !self.is_behind_edge()
    }

    /// Returns `true` if a point's projection lies strictly between both end points.
    pub fn is_strictly_inside_edge(&self) -> bool {
        self.factor > S::zero() && self.factor < self.length_2
    }
}

impl<S: CoordNum + Float> PointProjection<S> {
    /// Returns the relative position of the projected point along the segment.
    ///
    /// `0.0` corresponds to the segment start, `1.0` to its end. Values outside of this
    /// range indicate a projection before or behind the segment.
    pub fn relative_position(&self) -> S {
        self.factor / self.length_2
    }
}

pub fn nearest_point<S>(p1: Point2<S>, p2: Point2<S>, query_point: Point2<S>) -> Point2<S>
where
    S: CoordNum + Float,
{
    let dir = p2.sub(p1);
    let s = project_point(p1, p2, query_point);
    if s.is_on_edge() {
        let relative_position = s.relative_position();
        p1.add(dir.mul(relative_position))
    } else if s.is_before_edge() {
        p1
    } else {
        p2
    }
}

pub fn project_point<S>(p1: Point2<S>, p2: Point2<S>, query_point: Point2<S>) -> PointProjection<S>
where
    S: CoordNum,
{
    let dir = p2.sub(p1);
    PointProjection::new(query_point.sub(p1).dot(dir), dir.length2())
}

/// Squared distance between a query point and the segment `p1 -> p2`.
pub fn distance_2<S>(p1: Point2<S>, p2: Point2<S>, query_point: Point2<S>) -> S
where
    S: CoordNum + Float,
{
    let nn = nearest_point(p1, p2, query_point);
    query_point.sub(nn).length2()
}

fn to_robust_coord<S: CoordNum>(point: Point2<S>) -> robust::Coord<S> {
    robust::Coord {
        x: point.x,
        y: point.y,
    }
}

/// Returns `true` if `p` lies strictly inside the circumcircle of the ccw triangle `v1, v2, v3`.
pub fn contained_in_circumference<S>(
    v1: Point2<S>,
    v2: Point2<S>,
    v3: Point2<S>,
    p: Point2<S>,
) -> bool
where
    S: CoordNum,
{
    incircle_determinant(v1, v2, v3, p) < 0.0
}

/// Like [contained_in_circumference], but a point exactly on the circle counts as inside.
pub fn contained_in_closed_circumference<S>(
    v1: Point2<S>,
    v2: Point2<S>,
    v3: Point2<S>,
    p: Point2<S>,
) -> bool
where
    S: CoordNum,
{
    incircle_determinant(v1, v2, v3, p) <= 0.0
}

fn incircle_determinant<S: CoordNum>(v1: Point2<S>, v2: Point2<S>, v3: Point2<S>, p: Point2<S>) -> f64 {
    let v1 = to_robust_coord(v1);
    let v2 = to_robust_coord(v2);
    let v3 = to_robust_coord(v3);
    let p = to_robust_coord(p);

    // incircle expects all vertices to be ordered CW for right handed systems.
    // The public interface expects the points to be ordered ccw.
    robust::incircle(v3, v2, v1, p)
}

/// Returns `true` if the three points form a strictly counter-clockwise triangle.
///
/// This is the sign of twice the signed triangle area, evaluated exactly.
pub fn is_ordered_ccw<S>(p1: Point2<S>, p2: Point2<S>, p3: Point2<S>) -> bool
where
    S: CoordNum,
{
    side_query(p1, p2, p3).is_on_left_side()
}

pub fn side_query<S>(p1: Point2<S>, p2: Point2<S>, query_point: Point2<S>) -> LineSideInfo
where
    S: CoordNum,
{
    let p1 = to_robust_coord(p1);
    let p2 = to_robust_coord(p2);
    let query_point = to_robust_coord(query_point);

    let result = robust::orient2d(p1, p2, query_point);
    LineSideInfo::from_determinant(result)
}

/// Returns `true` if the segments `from0 -> to0` and `from1 -> to1` cross at a single point
/// that is interior to both of them.
///
/// Touching end points and collinear overlaps do not count as a crossing.
pub(crate) fn segments_cross<S>(
    from0: Point2<S>,
    to0: Point2<S>,
    from1: Point2<S>,
    to1: Point2<S>,
) -> bool
where
    S: CoordNum,
{
    let other_from = side_query(from0, to0, from1);
    let other_to = side_query(from0, to0, to1);
    if other_from.is_on_line() || other_to.is_on_line() || other_from == other_to {
        return false;
    }
    let self_from = side_query(from1, to1, from0);
    let self_to = side_query(from1, to1, to0);
    !self_from.is_on_line() && !self_to.is_on_line() && self_from != self_to
}

/// Returns the circumcenter and the squared circumradius of a triangle.
///
/// The result is not finite for collinear input.
pub fn circumcenter<S>(positions: [Point2<S>; 3]) -> (Point2<S>, S)
where
    S: CoordNum + Float,
{
    let [v0, v1, v2] = positions;
    let b = v1.sub(v0);
    let c = v2.sub(v0);

    let one = S::one();
    let two = one + one;
    let d = two * (b.x * c.y - c.x * b.y);
    let len_b = b.dot(b);
    let len_c = c.dot(c);
    let d_inv: S = one / d;

    let x = (len_b * c.y - len_c * b.y) * d_inv;
    let y = (-len_b * c.x + len_c * b.x) * d_inv;
    let result = Point2::new(x, y);
    (result.add(v0), x * x + y * y)
}

/// Twice the signed area of a triangle. Positive for ccw triangles.
///
/// Unlike [side_query], this is evaluated with plain floating point arithmetic.
pub fn signed_double_area<S>(positions: [Point2<S>; 3]) -> S
where
    S: CoordNum,
{
    let [v0, v1, v2] = positions;
    let b = v1.sub(v0);
    let c = v2.sub(v0);
    b.x * c.y - b.y * c.x
}

pub fn triangle_area<S>(positions: [Point2<S>; 3]) -> S
where
    S: CoordNum,
{
    signed_double_area(positions).abs() * <S as From<f32>>::from(0.5)
}

/// Returns `true` if `query_point` lies inside or on the border of the ccw triangle.
pub fn triangle_contains<S>(positions: [Point2<S>; 3], query_point: Point2<S>) -> bool
where
    S: CoordNum,
{
    let [v0, v1, v2] = positions;
    side_query(v0, v1, query_point).is_on_left_side_or_on_line()
        && side_query(v1, v2, query_point).is_on_left_side_or_on_line()
        && side_query(v2, v0, query_point).is_on_left_side_or_on_line()
}

#[cfg(test)]
mod test {
    use super::validate_coordinate;
    use crate::{InvalidCoordinate, Point2};
    use approx::assert_relative_eq;

    #[test]
    fn test_validate_coordinate() {
        use InvalidCoordinate::*;
        assert_eq!(validate_coordinate(f64::NAN), Err(NAN));
        let max_value = super::MAX_ALLOWED_VALUE;

        assert_eq!(validate_coordinate(f64::INFINITY), Err(TooLarge));
        assert_eq!(validate_coordinate(f64::NEG_INFINITY), Err(TooLarge));
        assert_eq!(validate_coordinate(max_value * 2.0), Err(TooLarge));

        let min_value = super::MIN_ALLOWED_VALUE;
        assert_eq!(validate_coordinate(min_value / 2.0), Err(TooSmall));

        assert_eq!(validate_coordinate(f32::MIN_POSITIVE), Ok(()));
        assert_eq!(validate_coordinate(f32::MAX), Ok(()));
        assert_eq!(validate_coordinate(min_value), Ok(()));
        assert_eq!(validate_coordinate(0.0), Ok(()));
    }

    #[test]
    fn test_values_next_to_min_value() {
        use float_next_after::NextAfter;

        for number_under_test in [
            0.0.next_after(f64::NEG_INFINITY),
            0.0.next_after(f64::INFINITY),
            super::MIN_ALLOWED_VALUE.next_after(f64::NEG_INFINITY),
            (-super::MIN_ALLOWED_VALUE).next_after(f64::INFINITY),
        ] {
            assert_eq!(
                validate_coordinate(number_under_test),
                Err(InvalidCoordinate::TooSmall)
            );
        }
    }

    #[test]
    fn check_min_value() {
        let mut expected = 1.0f64;
        for _ in 0..142 {
            expected *= 0.5;
        }

        assert_eq!(super::MIN_ALLOWED_VALUE, expected);
    }

    #[test]
    fn check_max_value() {
        let mut expected = 1.0f64;
        for _ in 0..201 {
            expected *= 2.0;
        }

        assert_eq!(super::MAX_ALLOWED_VALUE, expected);
    }

    #[test]
    fn test_edge_distance() {
        use super::distance_2;
        let p1 = Point2::new(0.0, 0.0);
        let p2 = Point2::new(1.0, 1.0);
        assert_relative_eq!(distance_2(p1, p2, Point2::new(1.0, 0.0)), 0.5);
        assert_relative_eq!(distance_2(p1, p2, Point2::new(0.0, 1.)), 0.5);
        assert_relative_eq!(distance_2(p1, p2, Point2::new(-1.0, -1.0)), 2.0);
        assert_relative_eq!(distance_2(p1, p2, Point2::new(2.0, 2.0)), 2.0);
    }

    #[test]
    fn test_projection() {
        use super::project_point;
        let p1 = Point2::new(0.0, 0.0);
        let p2 = Point2::new(2.0, 0.0);
        assert!(project_point(p1, p2, Point2::new(1.0, 3.0)).is_strictly_inside_edge());
        assert!(project_point(p1, p2, p2).is_on_edge());
        assert!(!project_point(p1, p2, p2).is_strictly_inside_edge());
        assert!(project_point(p1, p2, Point2::new(-0.5, 0.0)).is_before_edge());
        assert!(project_point(p1, p2, Point2::new(2.5, 0.0)).is_behind_edge());
        assert_relative_eq!(
            project_point(p1, p2, Point2::new(0.5, 1.0)).relative_position(),
            0.25
        );
    }

    #[test]
    fn test_edge_side() {
        use super::side_query;

        let p1 = Point2::new(0.0, 0.0);
        let p2 = Point2::new(1.0, 1.0);

        assert!(side_query(p1, p2, Point2::new(1.0, 0.0)).is_on_right_side());
        assert!(side_query(p1, p2, Point2::new(0.0, 1.0)).is_on_left_side());
        assert!(side_query(p1, p2, Point2::new(0.5, 0.5)).is_on_line());
    }

    #[test]
    fn test_segments_cross() {
        use super::segments_cross;

        let (f0, t0) = (Point2::new(0., 0.), Point2::new(5., 5.0));
        let (f1, t1) = (Point2::new(-1.5, 1.), Point2::new(1.0, -1.5));
        let (f2, t2) = (Point2::new(0.5, 4.), Point2::new(0.5, -4.));

        assert!(!segments_cross(f0, t0, f1, t1));
        assert!(!segments_cross(f1, t1, f0, t0));
        assert!(segments_cross(f0, t0, f2, t2));
        assert!(segments_cross(f2, t2, f0, t0));
        assert!(segments_cross(f1, t1, f2, t2));

        // Touching end points are no crossing
        let (f3, t3) = (Point2::new(0.0, 0.0), Point2::new(-2.0, 3.0));
        assert!(!segments_cross(f0, t0, f3, t3));

        // An end point lying on the other segment is no crossing either
        let (f4, t4) = (Point2::new(1.0, 1.0), Point2::new(3.0, -1.0));
        assert!(!segments_cross(f0, t0, f4, t4));

        // Collinear overlaps
        let (f5, t5) = (Point2::new(1.0, 1.0), Point2::new(7.0, 7.0));
        assert!(!segments_cross(f0, t0, f5, t5));
    }

    #[test]
    fn test_area_and_orientation() {
        use super::{is_ordered_ccw, signed_double_area, triangle_area};
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 0.0);
        let c = Point2::new(0.0, 1.0);
        assert!(is_ordered_ccw(a, b, c));
        assert!(!is_ordered_ccw(a, c, b));
        assert!(!is_ordered_ccw(a, b, Point2::new(4.0, 0.0)));
        assert_relative_eq!(signed_double_area([a, b, c]), 2.0);
        assert_relative_eq!(signed_double_area([a, c, b]), -2.0);
        assert_relative_eq!(triangle_area([a, c, b]), 1.0);
    }

    #[test]
    fn test_triangle_contains() {
        use super::triangle_contains;
        let t = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(triangle_contains(t, Point2::new(0.25, 0.25)));
        assert!(triangle_contains(t, Point2::new(0.5, 0.5)));
        assert!(triangle_contains(t, Point2::new(0.0, 0.0)));
        assert!(!triangle_contains(t, Point2::new(0.6, 0.6)));
        assert!(!triangle_contains(t, Point2::new(-0.1, 0.5)));
    }

    #[test]
    fn test_circumcenter() {
        use super::circumcenter;
        let (center, radius2) = circumcenter([
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(0.0, 2.0),
        ]);
        assert_relative_eq!(center.x, 1.0);
        assert_relative_eq!(center.y, 1.0);
        assert_relative_eq!(radius2, 2.0);

        let (_, degenerate): (_, f64) = circumcenter([
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ]);
        assert!(!degenerate.is_finite());
    }

    #[test]
    fn test_contained_in_circumference() {
        use super::{contained_in_circumference, contained_in_closed_circumference};

        let (a1, a2, a3) = (3f64, 2f64, 1f64);
        let offset = Point2::new(0.5, 0.7);
        let v1 = Point2::new(a1.sin(), a1.cos()).mul(2.).add(offset);
        let v2 = Point2::new(a2.sin(), a2.cos()).mul(2.).add(offset);
        let v3 = Point2::new(a3.sin(), a3.cos()).mul(2.).add(offset);
        assert!(super::side_query(v1, v2, v3).is_on_left_side());
        assert!(contained_in_circumference(v1, v2, v3, offset));
        let shrunk = (v1.sub(offset)).mul(0.9).add(offset);
        assert!(contained_in_circumference(v1, v2, v3, shrunk));
        let expanded = (v1.sub(offset)).mul(1.1).add(offset);
        assert!(!contained_in_circumference(v1, v2, v3, expanded));

        // Co-circular points of the unit square
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(1.0, 1.0);
        let d = Point2::new(0.0, 1.0);
        assert!(!contained_in_circumference(a, b, c, d));
        assert!(contained_in_closed_circumference(a, b, c, d));
        assert!(!contained_in_closed_circumference(a, b, c, Point2::new(2.0, 2.0)));
    }
}
