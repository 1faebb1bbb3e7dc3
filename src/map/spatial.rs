use crate::geo::Bounds;
use std::collections::HashMap;

/// Bounding-box grid over map regions.
///
/// Each region is inserted into every cell its bbox overlaps, so queries
/// never miss a region but may return ones whose geometry turns out not to
/// intersect. Callers confirm with an exact test.
pub struct RegionGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl RegionGrid {
    /// Cells per side of the data extent
    const TARGET_CELLS: f64 = 64.0;

    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size: if cell_size > 0.0 { cell_size } else { 1.0 },
        }
    }

    /// Cell size giving roughly `TARGET_CELLS` cells across the wider side
    /// of `extent`.
    pub fn cell_size_for(extent: Option<&Bounds>) -> f64 {
        extent
            .map(|b| (b.max_lon - b.min_lon).max(b.max_lat - b.min_lat) / Self::TARGET_CELLS)
            .filter(|s| *s > 0.0)
            .unwrap_or(1.0)
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    pub fn insert(&mut self, idx: usize, bounds: &Bounds) {
        let min_cell = self.to_cell(bounds.min_lon, bounds.min_lat);
        let max_cell = self.to_cell(bounds.max_lon, bounds.max_lat);
        for y in min_cell.1..=max_cell.1 {
            for x in min_cell.0..=max_cell.0 {
                self.cells.entry((x, y)).or_default().push(idx);
            }
        }
    }

    /// Sorted, deduplicated candidate indices overlapping `bounds`.
    /// A view wider than the grid is worth scanning in full instead.
    pub fn query_bounds(&self, bounds: &Bounds, results: &mut Vec<usize>) {
        let min_cell = self.to_cell(bounds.min_lon, bounds.min_lat);
        let max_cell = self.to_cell(bounds.max_lon, bounds.max_lat);
        let span = (max_cell.0 as i64 - min_cell.0 as i64 + 1) * (max_cell.1 as i64 - min_cell.1 as i64 + 1);

        results.clear();
        if span > self.cells.len() as i64 {
            for indices in self.cells.values() {
                results.extend_from_slice(indices);
            }
        } else {
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    if let Some(indices) = self.cells.get(&(x, y)) {
                        results.extend_from_slice(indices);
                    }
                }
            }
        }
        results.sort_unstable();
        results.dedup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lon: f64, lat: f64, size: f64) -> Bounds {
        Bounds {
            min_lon: lon,
            min_lat: lat,
            max_lon: lon + size,
            max_lat: lat + size,
        }
    }

    #[test]
    fn test_point_query() {
        let mut grid = RegionGrid::new(1.0);
        grid.insert(0, &square(0.0, 0.0, 0.5));
        grid.insert(1, &square(0.2, 0.2, 2.0));
        let mut out = Vec::new();
        grid.query_bounds(&Bounds::from_point(0.1, 0.1), &mut out);
        assert_eq!(out, vec![0, 1]);
        grid.query_bounds(&Bounds::from_point(1.5, 1.5), &mut out);
        assert_eq!(out, vec![1]);
        grid.query_bounds(&Bounds::from_point(-5.0, -5.0), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_bounds_query_dedups() {
        let mut grid = RegionGrid::new(1.0);
        grid.insert(7, &square(0.0, 0.0, 3.0));
        grid.insert(3, &square(10.0, 10.0, 0.5));
        let mut out = Vec::new();
        grid.query_bounds(&square(0.5, 0.5, 1.0), &mut out);
        assert_eq!(out, vec![7]);
        grid.query_bounds(&square(-100.0, -100.0, 200.0), &mut out);
        assert_eq!(out, vec![3, 7]);
    }

    #[test]
    fn test_cell_size_for() {
        assert_eq!(RegionGrid::cell_size_for(None), 1.0);
        assert_eq!(RegionGrid::cell_size_for(Some(&square(0.0, 0.0, 6.4))), 0.1);
        assert_eq!(RegionGrid::cell_size_for(Some(&Bounds::from_point(1.0, 1.0))), 1.0);
    }
}
