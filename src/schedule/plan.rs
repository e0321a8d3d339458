//! Symbolic factorization plan
//!
//! Both schedulers run the same right-looking k-loop; what differs is only
//! the synchronization discipline. The loop's structure (which panel cells
//! exist at iteration k, which trailing cells get updated, and which of
//! those are fill-in) depends on the structural pattern alone, never on
//! numeric values. The plan captures that structure once so the barrier
//! and dependency schedulers consume an identical work list.

use crate::grid::BlockGrid;

/// One trailing-update target at a given iteration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrailingUpdate {
    /// Row of the target cell (and of the row-panel operand at (i, k)).
    pub i: usize,
    /// Column of the target cell (and of the column-panel operand at (k, j)).
    pub j: usize,
    /// Whether (i, j) was absent before this iteration and must be filled in.
    pub fill: bool,
}

/// Work list for one iteration of the outer k-loop.
#[derive(Debug, Clone)]
pub(crate) struct Iteration {
    /// Outer iteration index; the diagonal task factorizes (k, k).
    pub k: usize,
    /// Columns j > k with (k, j) present: one `fwd` task each.
    pub panel_cols: Vec<usize>,
    /// Rows i > k with (i, k) present: one `bdiv` task each.
    pub panel_rows: Vec<usize>,
    /// Cross product of the panels: one `bmod` task each, in (i, j) order.
    pub updates: Vec<TrailingUpdate>,
}

/// Compute the full symbolic plan for a grid's structural pattern.
///
/// Simulates fill-in over the k-loop on a presence bitmap, so the returned
/// iterations already account for cells that become present mid-algorithm.
/// The grid itself is not modified.
pub(crate) fn build(grid: &BlockGrid) -> Vec<Iteration> {
    let n = grid.blocks();
    let mut present = vec![false; n * n];
    for (i, j) in grid.present_cells() {
        present[i * n + j] = true;
    }

    let mut iterations = Vec::with_capacity(n);
    for k in 0..n {
        let panel_cols: Vec<usize> = ((k + 1)..n).filter(|&j| present[k * n + j]).collect();
        let panel_rows: Vec<usize> = ((k + 1)..n).filter(|&i| present[i * n + k]).collect();

        let mut updates = Vec::with_capacity(panel_rows.len() * panel_cols.len());
        for &i in &panel_rows {
            for &j in &panel_cols {
                let fill = !present[i * n + j];
                present[i * n + j] = true;
                updates.push(TrailingUpdate { i, j, fill });
            }
        }

        iterations.push(Iteration {
            k,
            panel_cols,
            panel_rows,
            updates,
        });
    }
    iterations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matgen;

    #[test]
    fn test_plan_covers_every_iteration() {
        let grid = matgen::generate(8, 2, matgen::DEFAULT_SEED).unwrap();
        let plan = build(&grid);
        assert_eq!(plan.len(), 8);
        for (k, iter) in plan.iter().enumerate() {
            assert_eq!(iter.k, k);
            assert!(iter.panel_cols.iter().all(|&j| j > k));
            assert!(iter.panel_rows.iter().all(|&i| i > k));
            assert_eq!(iter.updates.len(), iter.panel_rows.len() * iter.panel_cols.len());
        }
    }

    #[test]
    fn test_fill_marked_once() {
        let grid = matgen::generate(16, 2, matgen::DEFAULT_SEED).unwrap();
        let plan = build(&grid);
        let n = grid.blocks();
        let mut seen = vec![false; n * n];
        for (i, j) in grid.present_cells() {
            seen[i * n + j] = true;
        }
        for iter in &plan {
            for u in &iter.updates {
                assert_eq!(u.fill, !seen[u.i * n + u.j], "fill flag at ({}, {})", u.i, u.j);
                seen[u.i * n + u.j] = true;
            }
        }
    }
}
