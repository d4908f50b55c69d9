mod constraints;
mod handles;
mod hull;
mod insertion;
mod line_side_info;
mod mesh;
mod regions;

pub mod math;

pub use line_side_info::LineSideInfo;

pub(crate) use constraints::{legalize, EdgeRecovery, RecoveryError};
pub(crate) use handles::FixedVertexHandle;
pub(crate) use hull::convex_hull;
pub(crate) use insertion::{create_seed_triangle, insert_vertex};
pub(crate) use mesh::Mesh;
pub(crate) use regions::{exclude_outer_regions, remove_seed_triangles};
