use std::{error::Error, fmt::Display};

/// Describes why a coordinate cannot take part in a triangulation.
///
/// Vertices can be checked for validity by using [crate::math::validate_position].
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Debug, Hash)]
pub enum InvalidCoordinate {
    /// A coordinate value was too small.
    ///
    /// The absolute value of any vertex coordinate must either be zero or
    /// greater than or equal to [crate::math::MIN_ALLOWED_VALUE].
    TooSmall,

    /// A coordinate value was too large.
    ///
    /// The absolute value of any vertex coordinate must be less than or equal to
    /// [crate::math::MAX_ALLOWED_VALUE].
    TooLarge,

    /// A coordinate value was NaN.
    NAN,
}

impl Display for InvalidCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Debug>::fmt(self, f)
    }
}

impl Error for InvalidCoordinate {}

/// The error type returned by [Triangulator::triangulate](crate::Triangulator::triangulate).
///
/// A failed run never touches the previously published triangles and vertices.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum TriangulationError {
    /// Fewer than three distinct, valid vertices remained after deduplication.
    InsufficientVertices {
        /// The number of usable vertices.
        usable: usize,
    },

    /// All usable vertices lie on a single line, no triangle can be formed.
    CollinearVertices,

    /// A cut segment crosses another cut segment at an interior point.
    ///
    /// Cut segments may touch at their end points but must not cross each other.
    IntersectingCuts {
        /// Insertion index of the cut that could not be enforced.
        cut: usize,
    },

    /// Enforcing a cut segment did not converge within the configured flip budget.
    ///
    /// *See [TriangulatorConfig::with_max_flips_per_cut](crate::TriangulatorConfig::with_max_flips_per_cut)*
    CutNotConverged {
        /// Insertion index of the cut that could not be enforced.
        cut: usize,
        /// The number of edge flips performed before giving up.
        flips: usize,
    },

    /// An edge of the convex hull could not be recovered within the configured flip budget.
    HullNotConverged {
        /// The number of edge flips performed before giving up.
        flips: usize,
    },
}

impl Display for TriangulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriangulationError::InsufficientVertices { usable } => write!(
                f,
                "at least 3 distinct vertices are required, found {}",
                usable
            ),
            TriangulationError::CollinearVertices => {
                write!(f, "all vertices are collinear")
            }
            TriangulationError::IntersectingCuts { cut } => {
                write!(f, "cut segment {} intersects another cut segment", cut)
            }
            TriangulationError::CutNotConverged { cut, flips } => write!(
                f,
                "cut segment {} could not be enforced after {} edge flips",
                cut, flips
            ),
            TriangulationError::HullNotConverged { flips } => write!(
                f,
                "convex hull could not be recovered after {} edge flips",
                flips
            ),
        }
    }
}

impl Error for TriangulationError {}

#[cfg(test)]
mod test {
    use super::{InvalidCoordinate, TriangulationError};

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", InvalidCoordinate::NAN), "NAN");
        assert_eq!(
            TriangulationError::InsufficientVertices { usable: 2 }.to_string(),
            "at least 3 distinct vertices are required, found 2"
        );
        assert_eq!(
            TriangulationError::CutNotConverged { cut: 4, flips: 10 }.to_string(),
            "cut segment 4 could not be enforced after 10 edge flips"
        );
        assert_eq!(
            TriangulationError::HullNotConverged { flips: 3 }.to_string(),
            "convex hull could not be recovered after 3 edge flips"
        );
    }
}
