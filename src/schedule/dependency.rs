//! Dependency-tracked schedule
//!
//! Every task declares its read and write sets as *grid coordinates*, not
//! block addresses: a `bmod` target may not exist when the task is
//! declared, and the coordinate is what identifies the cell regardless of
//! which arena slot ends up holding it. Ordering is inferred entirely from
//! those declarations: a write on (i, j) is ordered after every previously
//! declared read or write on (i, j), and a read after the cell's last
//! writer. Dependent tasks therefore execute in the same order as under the
//! barrier schedule, while independent tasks from different iterations may
//! overlap.
//!
//! The graph is built in one symbolic pass (which also allocates fill-in,
//! under exclusive grid access) and then executed by decrementing atomic
//! in-degree counters; a task becomes ready when its counter reaches zero.
//! The graph is acyclic by construction, so a task that never becomes ready
//! is a scheduling bug, asserted after execution rather than handled.

use std::sync::atomic::{AtomicU32, Ordering};

use smallvec::SmallVec;

use crate::error::Result;
use crate::grid::{BlockGrid, BlockHandle, CellAccess};
use crate::kernels;

use super::plan::Iteration;

type TaskId = u32;

enum TaskKind {
    Lu0 {
        diag: BlockHandle,
    },
    Fwd {
        diag: BlockHandle,
        col: BlockHandle,
    },
    Bdiv {
        diag: BlockHandle,
        row: BlockHandle,
    },
    Bmod {
        row: BlockHandle,
        col: BlockHandle,
        target: BlockHandle,
    },
}

struct Task {
    kind: TaskKind,
    /// Unmet dependency count; the task is ready at zero.
    pending: AtomicU32,
    successors: SmallVec<[TaskId; 4]>,
}

/// Per-coordinate access history during graph construction.
#[derive(Default, Clone)]
struct CellState {
    last_writer: Option<TaskId>,
    /// Readers declared since the last write; a later writer must wait for
    /// them (write-after-read).
    readers: Vec<TaskId>,
}

/// Task DAG over grid coordinates.
pub(crate) struct TaskGraph {
    tasks: Vec<Task>,
    roots: Vec<TaskId>,
}

struct Builder {
    n: usize,
    tasks: Vec<Task>,
    dep_edges: usize,
    states: Vec<CellState>,
}

impl Builder {
    fn new(n: usize) -> Self {
        Self {
            n,
            tasks: Vec::new(),
            dep_edges: 0,
            states: vec![CellState::default(); n * n],
        }
    }

    /// Declare a task with its coordinate access sets and wire its edges.
    ///
    /// `reads` are read-only cells; `write` is the inout cell the kernel
    /// mutates. Declaration order is program order of the k-loop, which is
    /// what gives dependent tasks the same total order as the barrier
    /// schedule.
    fn declare(&mut self, kind: TaskKind, reads: &[(usize, usize)], write: (usize, usize)) {
        debug_assert!(
            !reads.contains(&write),
            "a task's write cell belongs in the write set only"
        );
        let id = self.tasks.len() as TaskId;
        let mut deps: SmallVec<[TaskId; 8]> = SmallVec::new();

        for &(i, j) in reads {
            let state = &mut self.states[i * self.n + j];
            if let Some(writer) = state.last_writer {
                deps.push(writer);
            }
            state.readers.push(id);
        }

        let state = &mut self.states[write.0 * self.n + write.1];
        if let Some(writer) = state.last_writer {
            deps.push(writer);
        }
        deps.extend(state.readers.drain(..));
        state.last_writer = Some(id);

        deps.sort_unstable();
        deps.dedup();
        for &dep in &deps {
            self.tasks[dep as usize].successors.push(id);
        }
        self.dep_edges += deps.len();

        self.tasks.push(Task {
            kind,
            pending: AtomicU32::new(deps.len() as u32),
            successors: SmallVec::new(),
        });
    }

    fn finish(self) -> TaskGraph {
        let roots = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.pending.load(Ordering::Relaxed) == 0)
            .map(|(id, _)| id as TaskId)
            .collect();
        log::debug!(
            "task graph: {} tasks, {} dependency edges",
            self.tasks.len(),
            self.dep_edges
        );
        TaskGraph {
            tasks: self.tasks,
            roots,
        }
    }
}

impl TaskGraph {
    /// Build the graph for a plan, allocating fill-in as tasks are declared.
    ///
    /// Fill-in happens here, on the declaring thread with `&mut` access,
    /// before the corresponding update task exists. Handles resolved
    /// afterwards are stable because the arena only grows.
    pub(crate) fn build(grid: &mut BlockGrid, plan: &[Iteration]) -> Result<TaskGraph> {
        let mut builder = Builder::new(grid.blocks());
        for iteration in plan {
            let k = iteration.k;
            let diag = grid.handle(k, k).expect("diagonal block must be present");
            builder.declare(TaskKind::Lu0 { diag }, &[], (k, k));

            for &j in &iteration.panel_cols {
                let col = grid.handle(k, j).expect("panel column present per plan");
                builder.declare(TaskKind::Fwd { diag, col }, &[(k, k)], (k, j));
            }
            for &i in &iteration.panel_rows {
                let row = grid.handle(i, k).expect("panel row present per plan");
                builder.declare(TaskKind::Bdiv { diag, row }, &[(k, k)], (i, k));
            }
            for update in &iteration.updates {
                let (i, j) = (update.i, update.j);
                let target = if update.fill {
                    grid.ensure_block(i, j)?
                } else {
                    grid.handle(i, j).expect("target present per plan")
                };
                let row = grid.handle(i, k).expect("panel row present per plan");
                let col = grid.handle(k, j).expect("panel column present per plan");
                builder.declare(
                    TaskKind::Bmod { row, col, target },
                    &[(i, k), (k, j)],
                    (i, j),
                );
            }
        }
        Ok(builder.finish())
    }

    /// Number of declared tasks.
    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    fn run_kernel(&self, id: TaskId, cells: &CellAccess<'_>) {
        // Safety: the dependency edges serialize every pair of tasks with a
        // conflicting access to the same cell, so at this moment no other
        // running task touches the blocks below.
        unsafe {
            match &self.tasks[id as usize].kind {
                TaskKind::Lu0 { diag } => kernels::lu0(cells.block_mut(*diag)),
                TaskKind::Fwd { diag, col } => kernels::fwd(cells.block(*diag), cells.block_mut(*col)),
                TaskKind::Bdiv { diag, row } => kernels::bdiv(cells.block(*diag), cells.block_mut(*row)),
                TaskKind::Bmod { row, col, target } => kernels::bmod(
                    cells.block(*row),
                    cells.block(*col),
                    cells.block_mut(*target),
                ),
            }
        }
    }

    /// Execute every task, respecting the dependency edges.
    ///
    /// Returns the number of tasks that ran; anything short of [`len`]
    /// would mean a task's dependencies never fired, which the acyclic
    /// construction rules out.
    ///
    /// [`len`]: TaskGraph::len
    #[cfg(feature = "rayon")]
    pub(crate) fn execute(&self, cells: &CellAccess<'_>) -> usize {
        use std::sync::atomic::AtomicUsize;

        let executed = AtomicUsize::new(0);
        rayon::scope(|scope| {
            for &root in &self.roots {
                spawn_task(scope, self, cells, &executed, root);
            }
        });
        executed.load(Ordering::Relaxed)
    }

    /// Serial execution: tasks run in declaration order as their
    /// dependencies resolve, which is exactly program order of the k-loop.
    #[cfg(not(feature = "rayon"))]
    pub(crate) fn execute(&self, cells: &CellAccess<'_>) -> usize {
        let mut ready: Vec<TaskId> = self.roots.clone();
        let mut executed = 0;
        let mut cursor = 0;
        while cursor < ready.len() {
            let id = ready[cursor];
            cursor += 1;
            self.run_kernel(id, cells);
            executed += 1;
            for &succ in &self.tasks[id as usize].successors {
                if self.tasks[succ as usize].pending.fetch_sub(1, Ordering::Relaxed) == 1 {
                    ready.push(succ);
                }
            }
        }
        executed
    }
}

#[cfg(feature = "rayon")]
fn spawn_task<'s>(
    scope: &rayon::Scope<'s>,
    graph: &'s TaskGraph,
    cells: &'s CellAccess<'s>,
    executed: &'s std::sync::atomic::AtomicUsize,
    id: TaskId,
) {
    scope.spawn(move |scope| {
        graph.run_kernel(id, cells);
        executed.fetch_add(1, Ordering::Relaxed);
        for &succ in &graph.tasks[id as usize].successors {
            // The last dependency to finish releases the successor.
            if graph.tasks[succ as usize].pending.fetch_sub(1, Ordering::AcqRel) == 1 {
                spawn_task(scope, graph, cells, executed, succ);
            }
        }
    });
}

/// Execute the plan under dependency tracking.
pub(crate) fn run(grid: &mut BlockGrid, plan: &[Iteration]) -> Result<()> {
    let graph = TaskGraph::build(grid, plan)?;
    let total = graph.len();
    let executed = {
        let cells = grid.cell_access();
        graph.execute(&cells)
    };
    assert_eq!(
        executed, total,
        "task graph stalled: {} of {} tasks ran",
        executed, total
    );
    Ok(())
}
