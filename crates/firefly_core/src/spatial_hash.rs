use firefly_data::Vec2;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "rayon")]
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

#[derive(Clone, Debug, Default)]
/// Uniform grid over agent positions, rebuilt once per tick.
///
/// Uses the offset-array layout (compressed sparse rows):
/// `cell_offsets[i]..cell_offsets[i + 1]` indexes into `entity_indices` for
/// all entities in cell `i`. Queries only visit the cells overlapping the
/// query square, so neighbourhood lookups cost O(local density).
///
/// Positions outside the arena (agents drifting through the wrap padding)
/// are clamped into the border cells so they stay visible to queries.
///
/// # Examples
/// ```
/// use firefly_core::spatial_hash::SpatialHash;
/// use firefly_data::Vec2;
///
/// let mut spatial = SpatialHash::new(50.0, 400.0, 300.0);
/// spatial.build(&[Vec2::new(15.0, 15.0), Vec2::new(25.0, 25.0), Vec2::new(385.0, 285.0)]);
///
/// let mut nearby = Vec::new();
/// spatial.query_into(15.0, 15.0, 20.0, &mut nearby);
/// assert_eq!(nearby.len(), 2);
/// ```
pub struct SpatialHash {
    pub cell_size: f64,
    pub width: f64,
    pub height: f64,
    pub cols: usize,
    pub rows: usize,
    pub cell_offsets: Vec<usize>,
    pub entity_indices: Vec<usize>,
}

impl SpatialHash {
    pub fn new(cell_size: f64, width: f64, height: f64) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((height / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            width,
            height,
            cols,
            rows,
            cell_offsets: vec![0; cols * rows + 1],
            entity_indices: Vec::new(),
        }
    }

    /// Cell index for a world coordinate, clamped to the grid. `None` for non-finite input.
    #[inline]
    pub fn get_cell_idx(&self, x: f64, y: f64) -> Option<usize> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let cx = self.clamp_col((x / self.cell_size).floor());
        let cy = self.clamp_row((y / self.cell_size).floor());
        Some(cy * self.cols + cx)
    }

    #[inline]
    fn clamp_col(&self, c: f64) -> usize {
        c.clamp(0.0, (self.cols - 1) as f64) as usize
    }

    #[inline]
    fn clamp_row(&self, r: f64) -> usize {
        r.clamp(0.0, (self.rows - 1) as f64) as usize
    }

    fn count_cells(&self, positions: &[Vec2]) -> Vec<usize> {
        let cell_count = self.cols * self.rows;
        #[cfg(feature = "rayon")]
        {
            let atomic_counts: Vec<AtomicUsize> =
                (0..cell_count).map(|_| AtomicUsize::new(0)).collect();
            positions.par_iter().for_each(|p| {
                if let Some(idx) = self.get_cell_idx(p.x, p.y) {
                    atomic_counts[idx].fetch_add(1, AtomicOrdering::Relaxed);
                }
            });
            atomic_counts.into_iter().map(|a| a.into_inner()).collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            let mut counts = vec![0; cell_count];
            for p in positions {
                if let Some(idx) = self.get_cell_idx(p.x, p.y) {
                    counts[idx] += 1;
                }
            }
            counts
        }
    }

    /// Rebuilds the index. Entity `i` is `positions[i]`.
    pub fn build(&mut self, positions: &[Vec2]) {
        let cell_count = self.cols * self.rows;
        let counts = self.count_cells(positions);

        self.cell_offsets.resize(cell_count + 1, 0);
        let mut total = 0;
        for (i, &count) in counts.iter().enumerate() {
            self.cell_offsets[i] = total;
            total += count;
        }
        self.cell_offsets[cell_count] = total;

        self.entity_indices.clear();
        self.entity_indices.resize(total, 0);
        let mut cursor = self.cell_offsets[..cell_count].to_vec();
        for (entity_idx, p) in positions.iter().enumerate() {
            if let Some(cell_idx) = self.get_cell_idx(p.x, p.y) {
                self.entity_indices[cursor[cell_idx]] = entity_idx;
                cursor[cell_idx] += 1;
            }
        }
    }

    /// Inclusive cell range covering the square of half-width `radius` around `(x, y)`.
    fn cell_range(&self, x: f64, y: f64, radius: f64) -> Option<(usize, usize, usize, usize)> {
        if !x.is_finite() || !y.is_finite() || !radius.is_finite() || radius < 0.0 {
            return None;
        }
        let min_cx = self.clamp_col(((x - radius) / self.cell_size).floor());
        let max_cx = self.clamp_col(((x + radius) / self.cell_size).floor());
        let min_cy = self.clamp_row(((y - radius) / self.cell_size).floor());
        let max_cy = self.clamp_row(((y + radius) / self.cell_size).floor());
        Some((min_cx, max_cx, min_cy, max_cy))
    }

    /// Calls `callback` for every entity in the cells overlapping the query square.
    /// Callers filter by exact distance.
    pub fn query_callback<F>(&self, x: f64, y: f64, radius: f64, mut callback: F)
    where
        F: FnMut(usize),
    {
        let Some((min_cx, max_cx, min_cy, max_cy)) = self.cell_range(x, y, radius) else {
            return;
        };
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                let cell_idx = cy * self.cols + cx;
                let start = self.cell_offsets[cell_idx];
                let end = self.cell_offsets[cell_idx + 1];
                for &entity_idx in &self.entity_indices[start..end] {
                    callback(entity_idx);
                }
            }
        }
    }

    /// Upper bound on entities near a point: the population of the overlapping cells.
    pub fn count_nearby(&self, x: f64, y: f64, radius: f64) -> usize {
        let Some((min_cx, max_cx, min_cy, max_cy)) = self.cell_range(x, y, radius) else {
            return 0;
        };
        let mut count = 0;
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                let cell_idx = cy * self.cols + cx;
                count += self.cell_offsets[cell_idx + 1] - self.cell_offsets[cell_idx];
            }
        }
        count
    }

    #[inline]
    pub fn query_into(&self, x: f64, y: f64, radius: f64, result: &mut Vec<usize>) {
        result.clear();
        let Some((min_cx, max_cx, min_cy, max_cy)) = self.cell_range(x, y, radius) else {
            return;
        };
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                let cell_idx = cy * self.cols + cx;
                let start = self.cell_offsets[cell_idx];
                let end = self.cell_offsets[cell_idx + 1];
                result.extend_from_slice(&self.entity_indices[start..end]);
            }
        }
    }
}
