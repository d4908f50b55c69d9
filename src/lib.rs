//! Constrained Delaunay triangulation for navigation mesh generation.
//!
//! A [Triangulator] collects level vertices and *cut segments* (walls, outlines of forbidden
//! areas) and turns them into a triangle mesh that
//!  * covers the convex hull of all vertices,
//!  * contains every cut segment as a chain of edges,
//!  * is Delaunay everywhere except where a cut segment prevents it.
//!
//! Triangles outside of closed cut loops can optionally be removed, see
//! [TriangulatorConfig::exclude_outer_regions].
//!
//! All geometric decisions use the exact predicates of the `robust` crate. Near duplicates
//! are merged with a configurable epsilon before triangulating, two runs over the same input
//! always yield the same mesh.
//!
//! # Example
//!
//! ```
//! use nav_triangulator::{Point3, Triangulator, TriangulatorConfig};
//!
//! # fn main() -> Result<(), nav_triangulator::TriangulationError> {
//! let config = TriangulatorConfig::new().exclude_outer_regions(true);
//! let mut triangulator = Triangulator::with_config(config);
//!
//! // Walkable area
//! let outline = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
//! triangulator.add_polygon(&outline.map(|(x, y)| Point3::new(x, y, 0.0)), true);
//!
//! // A pillar in the middle
//! let pillar = [(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0)];
//! triangulator.add_polygon(&pillar.map(|(x, y)| Point3::new(x, y, 0.0)), true);
//!
//! let stats = triangulator.triangulate()?;
//! assert_eq!(stats.num_cuts_enforced, 8);
//! assert_eq!(triangulator.triangles().len(), 8);
//! assert_eq!(triangulator.locate(5.0, 5.0), None);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod config;
mod dedup;
mod error;
mod point;
mod primitives;
mod triangulation_core;
mod triangulator;

#[cfg(test)]
mod test_utilities;

pub use triangulation_core::math;

pub use crate::config::{TriangulatorConfig, DEFAULT_EPSILON, DEFAULT_MAX_FLIPS_PER_CUT};
pub use crate::error::{InvalidCoordinate, TriangulationError};
pub use crate::point::{CoordNum, Point2, Point3};
pub use crate::primitives::{Circumcircle, Triangle, TriangulationStats, Vertex};
pub use crate::triangulation_core::LineSideInfo;
pub use crate::triangulator::Triangulator;
