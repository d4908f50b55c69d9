use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::math;
use crate::Point2;

/// Uniform hash grid used to find vertices within `epsilon` of a position.
///
/// The cell size equals `epsilon`, so all candidates lie in the 3x3 block of cells around
/// the queried position.
#[derive(Clone, Debug)]
pub(crate) struct VertexGrid {
    epsilon: f64,
    cell_size: f64,
    cells: HashMap<(i64, i64), SmallVec<[usize; 4]>>,
}

impl VertexGrid {
    pub fn new(epsilon: f64) -> Self {
        VertexGrid {
            epsilon,
            cell_size: if epsilon > 0.0 { epsilon } else { 1.0 },
            cells: HashMap::new(),
        }
    }

    fn cell(&self, position: Point2<f64>) -> (i64, i64) {
        // Saturating float casts keep huge coordinates in the outermost cells
        (
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
        )
    }

    /// Returns the smallest index of all registered vertices closer than `epsilon` to
    /// `position`. Identical positions always match, even for a zero epsilon.
    pub fn find(&self, positions: &[Point2<f64>], position: Point2<f64>) -> Option<usize> {
        let (cx, cy) = self.cell(position);
        let epsilon_2 = self.epsilon * self.epsilon;
        let mut result: Option<usize> = None;
        for x in cx.saturating_sub(1)..=cx.saturating_add(1) {
            for y in cy.saturating_sub(1)..=cy.saturating_add(1) {
                let Some(cell) = self.cells.get(&(x, y)) else {
                    continue;
                };
                for &index in cell {
                    let distance_2 = positions[index].distance_2(position);
                    let is_equal = distance_2 < epsilon_2 || distance_2 == 0.0;
                    if is_equal && result.map_or(true, |best| index < best)
                    {
                        result = Some(index);
                    }
                }
            }
        }
        result
    }

    pub fn insert(&mut self, position: Point2<f64>, index: usize) {
        let cell = self.cell(position);
        self.cells.entry(cell).or_default().push(index);
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.cells.reserve(additional);
    }
}

/// Maps every input vertex to the vertex that represents it in the triangulation.
#[derive(Clone, Debug, Default)]
pub(crate) struct Remap {
    /// `None` for vertices that cannot be triangulated.
    pub canonical: Vec<Option<usize>>,
    pub num_merged: usize,
    pub num_dropped: usize,
}

impl Remap {
    /// Iterates over all vertices that represent themselves.
    pub fn representatives(&self) -> impl Iterator<Item = usize> + '_ {
        self.canonical
            .iter()
            .enumerate()
            .filter(|(index, canonical)| **canonical == Some(*index))
            .map(|(index, _)| index)
    }
}

/// Drops vertices with invalid coordinates and merges vertices closer than `epsilon`.
///
/// Each vertex is merged into the earliest valid vertex within `epsilon`. The result does
/// not depend on anything but the input order.
pub(crate) fn build_remap(positions: &[Point2<f64>], epsilon: f64) -> Remap {
    let mut grid = VertexGrid::new(epsilon);
    grid.reserve(positions.len());
    let mut remap = Remap {
        canonical: Vec::with_capacity(positions.len()),
        ..Default::default()
    };

    for (index, position) in positions.iter().enumerate() {
        if let Err(error) = math::validate_position(*position) {
            log::warn!(
                "Dropping vertex {} at ({}, {}): {}",
                index,
                position.x,
                position.y,
                error
            );
            remap.num_dropped += 1;
            remap.canonical.push(None);
            continue;
        }

        match grid.find(positions, *position) {
            Some(existing) => {
                remap.num_merged += 1;
                remap.canonical.push(Some(existing));
            }
            None => {
                grid.insert(*position, index);
                remap.canonical.push(Some(index));
            }
        }
    }
    remap
}

#[cfg(test)]
mod test {
    use super::{build_remap, VertexGrid};
    use crate::Point2;

    #[test]
    fn test_grid_finds_neighbors_across_cells() {
        let positions = vec![Point2::new(0.0995, 0.0), Point2::new(5.0, 5.0)];
        let mut grid = VertexGrid::new(0.1);
        for (index, position) in positions.iter().enumerate() {
            grid.insert(*position, index);
        }

        assert_eq!(grid.find(&positions, Point2::new(0.1005, 0.0)), Some(0));
        assert_eq!(grid.find(&positions, Point2::new(0.25, 0.0)), None);
        assert_eq!(grid.find(&positions, Point2::new(5.05, 5.0)), Some(1));
        assert_eq!(grid.find(&positions, Point2::new(-5.0, 5.0)), None);
    }

    #[test]
    fn test_grid_prefers_earliest_index() {
        let positions = vec![Point2::new(0.15, 0.0), Point2::new(0.05, 0.0)];
        let mut grid = VertexGrid::new(0.1);
        grid.insert(positions[1], 1);
        grid.insert(positions[0], 0);
        assert_eq!(grid.find(&positions, Point2::new(0.1, 0.0)), Some(0));
    }

    #[test]
    fn test_vertices_exactly_epsilon_apart_stay_separate() {
        let positions = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.001, 0.0),
            Point2::new(0.0, 0.000999),
        ];
        let remap = build_remap(&positions, 0.001);
        assert_eq!(remap.canonical, vec![Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_zero_epsilon_only_merges_identical_positions() {
        let positions = vec![
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 1.0 + f64::EPSILON),
            Point2::new(1.0, 1.0),
        ];
        let remap = build_remap(&positions, 0.0);
        assert_eq!(remap.canonical, vec![Some(0), Some(1), Some(0)]);
        assert_eq!(remap.num_merged, 1);
    }

    #[test]
    fn test_remap_drops_invalid_vertices() {
        let positions = vec![
            Point2::new(f64::NAN, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(f64::INFINITY, 0.0),
            Point2::new(0.0005, 0.0),
            Point2::new(1.0, 0.0),
        ];
        let remap = build_remap(&positions, 0.001);
        assert_eq!(
            remap.canonical,
            vec![None, Some(1), None, Some(1), Some(4)]
        );
        assert_eq!(remap.num_dropped, 2);
        assert_eq!(remap.num_merged, 1);
        assert_eq!(remap.representatives().collect::<Vec<_>>(), vec![1, 4]);
    }

    #[test]
    fn test_remap_is_idempotent() {
        let positions: Vec<_> = (0..50)
            .map(|i| Point2::new((i % 7) as f64 * 0.0004, (i / 7) as f64))
            .collect();
        let first = build_remap(&positions, 0.001);
        let survivors: Vec<_> = first.representatives().map(|i| positions[i]).collect();
        let second = build_remap(&survivors, 0.001);
        assert_eq!(second.num_merged, 0);
        assert_eq!(second.representatives().count(), survivors.len());
    }
}
