use num_traits::{Num, Signed};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A coordinate type usable with the geometric helpers of this crate.
///
/// All predicates are evaluated after converting into `f64`. The triangulator itself
/// stores `f64` coordinates; `f32` is supported for callers that keep their level data
/// in single precision.
pub trait CoordNum:
    Num + PartialOrd + Into<f64> + From<f32> + Copy + Signed + std::fmt::Debug
{
}

impl<T> CoordNum for T where
    T: Num + PartialOrd + Into<f64> + From<f32> + Copy + Signed + std::fmt::Debug
{
}

/// A two dimensional point in the triangulation plane.
#[derive(Debug, PartialEq, Eq, PartialOrd, Clone, Copy, Default, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Point2<S> {
    /// The point's x coordinate
    pub x: S,
    /// The point's y coordinate
    pub y: S,
}

impl<S> Point2<S> {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: S, y: S) -> Self {
        Point2 { x, y }
    }
}

impl<S: CoordNum> Point2<S> {
    /// Returns the squared distance of this point and another point.
    #[inline]
    pub fn distance_2(&self, other: Self) -> S {
        self.sub(other).length2()
    }

    pub(crate) fn mul(&self, factor: S) -> Self {
        Point2 {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub(crate) fn add(&self, other: Self) -> Self {
        Point2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub(crate) fn length2(&self) -> S {
        self.x * self.x + self.y * self.y
    }

    pub(crate) fn sub(&self, other: Self) -> Self {
        Point2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub(crate) fn dot(&self, other: Self) -> S {
        self.x * other.x + self.y * other.y
    }
}

impl<S: CoordNum> From<Point2<S>> for [S; 2] {
    #[inline]
    fn from(point: Point2<S>) -> Self {
        [point.x, point.y]
    }
}

impl<S: CoordNum> From<[S; 2]> for Point2<S> {
    #[inline]
    fn from(source: [S; 2]) -> Self {
        Self::new(source[0], source[1])
    }
}

impl<S: CoordNum> From<(S, S)> for Point2<S> {
    #[inline]
    fn from(source: (S, S)) -> Self {
        Self::new(source.0, source.1)
    }
}

/// A level-space position.
///
/// Only `x` and `y` take part in the triangulation, `z` is carried along so that the
/// navigation graph can assign heights afterwards.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Point3 {
    /// The point's x coordinate
    pub x: f64,
    /// The point's y coordinate
    pub y: f64,
    /// The point's height
    pub z: f64,
}

impl Point3 {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Point3 { x, y, z }
    }

    /// Projects this point onto the triangulation plane.
    #[inline]
    pub fn xy(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub(crate) fn component_min(&self, other: Self) -> Self {
        Point3::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    pub(crate) fn component_max(&self, other: Self) -> Self {
        Point3::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }
}

impl From<[f64; 3]> for Point3 {
    #[inline]
    fn from(source: [f64; 3]) -> Self {
        Self::new(source[0], source[1], source[2])
    }
}

impl From<(f64, f64, f64)> for Point3 {
    #[inline]
    fn from(source: (f64, f64, f64)) -> Self {
        Self::new(source.0, source.1, source.2)
    }
}

#[cfg(test)]
mod test {
    use super::{Point2, Point3};

    #[test]
    fn test_bounding_corners() {
        let a = Point3::new(1.0, -2.0, 5.0);
        let b = Point3::new(-1.0, 3.0, 0.5);
        assert_eq!(a.component_min(b), Point3::new(-1.0, -2.0, 0.5));
        assert_eq!(a.component_max(b), Point3::new(1.0, 3.0, 5.0));
        assert_eq!(a.xy(), Point2::new(1.0, -2.0));
    }

    #[test]
    fn test_distance() {
        let p = Point2::new(1.0f32, 1.0);
        assert_eq!(p.distance_2(Point2::new(4.0, 5.0)), 25.0);
    }
}
