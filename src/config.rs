#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The default XY distance below which two vertices are considered identical.
pub const DEFAULT_EPSILON: f64 = 0.001;

/// The default number of edge flip attempts a single cut segment may use before giving up.
pub const DEFAULT_MAX_FLIPS_PER_CUT: usize = 10_000;

/// Controls how a [Triangulator](crate::Triangulator) builds its mesh.
///
/// The following parameters will be used by `Self::default` and [Self::new]:
/// * `epsilon`: [DEFAULT_EPSILON]
/// * `max_flips_per_cut`: [DEFAULT_MAX_FLIPS_PER_CUT]
/// * `exclude_outer_regions`: false
/// * `super_triangle_margin`: 16 times the bounding box extent
///
/// # Example
///
/// ```
/// use nav_triangulator::{Triangulator, TriangulatorConfig};
///
/// let config = TriangulatorConfig::new()
///     .with_epsilon(0.01)
///     .with_max_flips_per_cut(500)
///     .exclude_outer_regions(true);
///
/// let triangulator = Triangulator::with_config(config);
/// assert_eq!(triangulator.config().epsilon(), 0.01);
/// ```
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct TriangulatorConfig {
    epsilon: f64,
    max_flips_per_cut: usize,
    exclude_outer_regions: bool,
    super_triangle_margin: f64,
}

impl Default for TriangulatorConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            max_flips_per_cut: DEFAULT_MAX_FLIPS_PER_CUT,
            exclude_outer_regions: false,
            super_triangle_margin: 16.0,
        }
    }
}

impl TriangulatorConfig {
    /// Creates a new set of `TriangulatorConfig`.
    ///
    /// Refer to the [struct definition](Self) for more information.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the XY distance below which two vertices are merged.
    ///
    /// The same tolerance decides whether a vertex lying next to a cut segment splits it
    /// into a collinear chain. Negative or non-finite values are ignored.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        if epsilon.is_finite() && epsilon >= 0.0 {
            self.epsilon = epsilon;
        }
        self
    }

    /// Limits the number of edge flip attempts used to enforce a single cut segment.
    ///
    /// Crossed edges whose quad is not convex yet count as an attempt too. The same limit
    /// applies to every edge of the convex hull.
    ///
    /// Running out of attempts makes [triangulate](crate::Triangulator::triangulate) fail with
    /// [TriangulationError::CutNotConverged](crate::TriangulationError::CutNotConverged).
    pub fn with_max_flips_per_cut(mut self, max_flips_per_cut: usize) -> Self {
        self.max_flips_per_cut = max_flips_per_cut;
        self
    }

    /// Removes every triangle that lies outside of closed cut loops.
    ///
    /// Triangles are classified by peeling layers off the mesh: everything reachable from the
    /// convex hull without crossing a cut is outside, the next layer is inside, the layer after
    /// that is outside again and so on. Forbidden areas nested inside a boundary outline thus
    /// become holes. Without any closed loop, every triangle is considered outside.
    pub fn exclude_outer_regions(mut self, exclude: bool) -> Self {
        self.exclude_outer_regions = exclude;
        self
    }

    /// Sets how far the synthetic enclosing triangle extends beyond the input, as a multiple
    /// of the larger bounding box side. Values below 2 are raised to 2.
    pub fn with_super_triangle_margin(mut self, margin: f64) -> Self {
        if margin.is_finite() {
            self.super_triangle_margin = margin.max(2.0);
        }
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn max_flips_per_cut(&self) -> usize {
        self.max_flips_per_cut
    }

    pub fn excludes_outer_regions(&self) -> bool {
        self.exclude_outer_regions
    }

    pub fn super_triangle_margin(&self) -> f64 {
        self.super_triangle_margin
    }
}

#[cfg(test)]
mod test {
    use super::{TriangulatorConfig, DEFAULT_EPSILON};

    #[test]
    fn test_defaults() {
        let config = TriangulatorConfig::new();
        assert_eq!(config.epsilon(), DEFAULT_EPSILON);
        assert!(!config.excludes_outer_regions());
        assert_eq!(config, TriangulatorConfig::default());
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let config = TriangulatorConfig::new()
            .with_epsilon(-1.0)
            .with_epsilon(f64::NAN)
            .with_super_triangle_margin(0.5);
        assert_eq!(config.epsilon(), DEFAULT_EPSILON);
        assert_eq!(config.super_triangle_margin(), 2.0);
    }
}
