//! Sparse grid of dense blocks
//!
//! A [`BlockGrid`] is an N×N grid of optional [`Block`]s. Blocks live in an
//! arena; the grid itself is a flat table of arena indices with a sentinel
//! for structurally absent cells, so presence checks are O(1) and absent
//! cells carry no allocation.
//!
//! Absence is a *structural* zero: algebraically a zero block, but never
//! dereferenced. A trailing update targeting an absent cell must first
//! allocate it through [`BlockGrid::ensure_block`] ("fill-in"). Fill-in is
//! monotonic: once a cell is allocated it is never removed, and arena
//! indices stay valid for the life of the grid.

use crate::block::Block;
use crate::error::{Error, Result};

/// Sentinel arena index marking a structurally absent cell.
const ABSENT: usize = usize::MAX;

/// Stable handle to an allocated block inside a [`BlockGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle(pub(crate) usize);

/// N×N grid of optional dense blocks backed by an arena.
#[derive(Debug, Clone)]
pub struct BlockGrid {
    blocks: usize,
    block_size: usize,
    cells: Vec<usize>,
    arena: Vec<Block>,
}

impl BlockGrid {
    /// Create an empty grid of `blocks` × `blocks` cells of `block_size` ×
    /// `block_size` blocks. No blocks are allocated yet.
    pub fn new(blocks: usize, block_size: usize) -> Result<Self> {
        if blocks == 0 || block_size == 0 {
            return Err(Error::InvalidConfig {
                reason: format!(
                    "grid needs at least 1 block of at least 1 element, got {} blocks of {}",
                    blocks, block_size
                ),
            });
        }
        let numcells = blocks.checked_mul(blocks).ok_or(Error::Allocation {
            what: "grid cell table",
            bytes: usize::MAX,
        })?;
        let mut cells = Vec::new();
        cells.try_reserve_exact(numcells).map_err(|_| Error::Allocation {
            what: "grid cell table",
            bytes: numcells.saturating_mul(std::mem::size_of::<usize>()),
        })?;
        cells.resize(numcells, ABSENT);
        Ok(Self {
            blocks,
            block_size,
            cells,
            arena: Vec::new(),
        })
    }

    /// Number of blocks per grid dimension.
    #[inline]
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Side length of each block.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of allocated blocks (initial structure plus fill-in).
    #[inline]
    pub fn allocated(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    fn cell(&self, i: usize, j: usize) -> usize {
        self.cells[i * self.blocks + j]
    }

    /// Whether cell (i, j) holds an allocated block.
    #[inline]
    pub fn is_present(&self, i: usize, j: usize) -> bool {
        self.cell(i, j) != ABSENT
    }

    /// Handle of the block at (i, j), if allocated.
    #[inline]
    pub fn handle(&self, i: usize, j: usize) -> Option<BlockHandle> {
        match self.cell(i, j) {
            ABSENT => None,
            idx => Some(BlockHandle(idx)),
        }
    }

    /// Shared reference to the block at (i, j), if allocated.
    #[inline]
    pub fn block(&self, i: usize, j: usize) -> Option<&Block> {
        self.handle(i, j).map(|h| &self.arena[h.0])
    }

    /// Mutable reference to the block at (i, j), if allocated.
    #[inline]
    pub fn block_mut(&mut self, i: usize, j: usize) -> Option<&mut Block> {
        match self.cell(i, j) {
            ABSENT => None,
            idx => Some(&mut self.arena[idx]),
        }
    }

    /// Allocate a zeroed block at (i, j) if the cell is still absent.
    ///
    /// This is the fill-in operation. It requires exclusive access to the
    /// grid, which makes the check-and-allocate step race-free by
    /// construction: two producers cannot hold `&mut BlockGrid` at once.
    pub fn ensure_block(&mut self, i: usize, j: usize) -> Result<BlockHandle> {
        let cell = i * self.blocks + j;
        if self.cells[cell] != ABSENT {
            return Ok(BlockHandle(self.cells[cell]));
        }
        let block = Block::zeros(self.block_size)?;
        self.arena.try_reserve(1).map_err(|_| Error::Allocation {
            what: "block arena",
            bytes: std::mem::size_of::<Block>(),
        })?;
        let idx = self.arena.len();
        self.arena.push(block);
        self.cells[cell] = idx;
        Ok(BlockHandle(idx))
    }

    /// Mutable references to N pairwise distinct cells at once.
    ///
    /// Returns `None` if any coordinate is absent or duplicated. This is
    /// the safe multi-cell accessor used by the sequential reference; the
    /// schedulers use [`CellAccess`] instead.
    pub fn disjoint_mut<const N: usize>(
        &mut self,
        coords: [(usize, usize); N],
    ) -> Option<[&mut Block; N]> {
        let mut indices = [0usize; N];
        for (slot, &(i, j)) in indices.iter_mut().zip(coords.iter()) {
            match self.cell(i, j) {
                ABSENT => return None,
                idx => *slot = idx,
            }
        }
        self.arena.get_disjoint_mut(indices).ok()
    }

    /// Coordinates of all allocated cells, row-major.
    pub fn present_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.blocks;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != ABSENT)
            .map(move |(idx, _)| (idx / n, idx % n))
    }

    /// Raw view over the arena for disjoint concurrent cell access.
    ///
    /// The borrow keeps the grid (and thus the arena) frozen: no fill-in can
    /// happen while a [`CellAccess`] is alive, so the underlying storage
    /// never moves.
    pub(crate) fn cell_access(&mut self) -> CellAccess<'_> {
        CellAccess {
            base: self.arena.as_mut_ptr(),
            len: self.arena.len(),
            _grid: std::marker::PhantomData,
        }
    }
}

/// Shared view over a grid's arena handing out per-cell references.
///
/// The schedulers guarantee that no two concurrently running tasks touch the
/// same cell; this view is how that partitioning is expressed to the borrow
/// checker. Every access method is unsafe and carries that contract.
pub(crate) struct CellAccess<'a> {
    base: *mut Block,
    len: usize,
    _grid: std::marker::PhantomData<&'a mut BlockGrid>,
}

// Cells are disjoint under the schedulers' task structure; the raw pointer
// itself is only a capability, never aliased storage.
unsafe impl Send for CellAccess<'_> {}
unsafe impl Sync for CellAccess<'_> {}

impl CellAccess<'_> {
    /// Shared reference to the block behind `handle`.
    ///
    /// # Safety
    /// No concurrently running task may hold a mutable reference to the
    /// same block.
    #[inline]
    pub unsafe fn block(&self, handle: BlockHandle) -> &Block {
        debug_assert!(handle.0 < self.len);
        &*self.base.add(handle.0)
    }

    /// Mutable reference to the block behind `handle`.
    ///
    /// # Safety
    /// No concurrently running task may access the same block at all.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn block_mut(&self, handle: BlockHandle) -> &mut Block {
        debug_assert!(handle.0 < self.len);
        &mut *self.base.add(handle.0)
    }
}
