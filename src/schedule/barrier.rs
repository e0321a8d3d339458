//! Phase-synchronized schedule
//!
//! Expands every step of the k-loop into a batch of independent tasks and
//! joins the whole batch before the next step starts: fork-join with a
//! single level of parallelism per phase. Tasks within one phase touch
//! pairwise disjoint cells, so the batches need no further coordination.

use crate::error::Result;
use crate::grid::{BlockGrid, BlockHandle};
use crate::kernels;

use super::plan::Iteration;

enum PanelTask {
    /// `fwd` on the column-panel block at (k, j).
    Fwd { col: BlockHandle },
    /// `bdiv` on the row-panel block at (i, k).
    Bdiv { row: BlockHandle },
}

struct TrailingTask {
    row: BlockHandle,
    col: BlockHandle,
    target: BlockHandle,
}

/// Execute the plan with a barrier between dependent phases.
pub(crate) fn run(grid: &mut BlockGrid, plan: &[Iteration]) -> Result<()> {
    for iteration in plan {
        let k = iteration.k;

        // Step 1: factorize the diagonal on the coordinating thread. The
        // panel batch below only reads it.
        kernels::lu0(grid.block_mut(k, k).expect("diagonal block must be present"));

        // Steps 2 + 3: fwd and bdiv tasks are mutually independent (each
        // writes its own panel cell) and run as one batch.
        let diag = grid.handle(k, k).expect("diagonal block must be present");
        let panel: Vec<PanelTask> = iteration
            .panel_cols
            .iter()
            .map(|&j| PanelTask::Fwd {
                col: grid.handle(k, j).expect("panel column present per plan"),
            })
            .chain(iteration.panel_rows.iter().map(|&i| PanelTask::Bdiv {
                row: grid.handle(i, k).expect("panel row present per plan"),
            }))
            .collect();
        {
            let cells = grid.cell_access();
            let run_task = |task: &PanelTask| {
                // Safety: each task writes a distinct panel cell and only
                // reads the diagonal, which no task in this batch writes.
                unsafe {
                    match task {
                        PanelTask::Fwd { col } => {
                            kernels::fwd(cells.block(diag), cells.block_mut(*col))
                        }
                        PanelTask::Bdiv { row } => {
                            kernels::bdiv(cells.block(diag), cells.block_mut(*row))
                        }
                    }
                }
            };
            #[cfg(feature = "rayon")]
            {
                use rayon::prelude::*;
                panel.par_iter().for_each(run_task);
            }
            #[cfg(not(feature = "rayon"))]
            panel.iter().for_each(run_task);
        }
        // Implicit join: the panel batch has fully completed here.

        // Fill-in for this iteration's trailing updates, allocated under
        // exclusive access before any update task runs.
        for update in &iteration.updates {
            if update.fill {
                grid.ensure_block(update.i, update.j)?;
            }
        }

        // Step 4: trailing updates; each (i, j) target is produced by
        // exactly one task, panels are read-only.
        let trailing: Vec<TrailingTask> = iteration
            .updates
            .iter()
            .map(|u| TrailingTask {
                row: grid.handle(u.i, k).expect("panel row present per plan"),
                col: grid.handle(k, u.j).expect("panel column present per plan"),
                target: grid.handle(u.i, u.j).expect("target allocated above"),
            })
            .collect();
        {
            let cells = grid.cell_access();
            let run_task = |task: &TrailingTask| {
                // Safety: targets are pairwise distinct; row/col operands are
                // only read in this phase.
                unsafe {
                    kernels::bmod(
                        cells.block(task.row),
                        cells.block(task.col),
                        cells.block_mut(task.target),
                    )
                }
            };
            #[cfg(feature = "rayon")]
            {
                use rayon::prelude::*;
                trailing.par_iter().for_each(run_task);
            }
            #[cfg(not(feature = "rayon"))]
            trailing.iter().for_each(run_task);
        }
        // The join above is conservative: nothing else in iteration k reads
        // the trailing results, only iteration k+1 does. It stays anyway;
        // whole-iteration fork-join granularity is part of this schedule's
        // contract.
    }
    Ok(())
}
