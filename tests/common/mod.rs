//! Common test utilities
#![allow(dead_code)]

use sparselu::error::Result;
use sparselu::grid::BlockGrid;
use sparselu::{matgen, verify};

/// Generate the reference scenario's initial grid.
pub fn initial_grid(blocks: usize, block_size: usize) -> BlockGrid {
    matgen::generate(blocks, block_size, matgen::DEFAULT_SEED).expect("generation succeeds")
}

/// Generate and sequentially factorize a grid for use as the reference.
pub fn factorized_reference(blocks: usize, block_size: usize) -> Result<BlockGrid> {
    let mut grid = matgen::generate(blocks, block_size, matgen::DEFAULT_SEED)?;
    verify::reference_factorize(&mut grid)?;
    Ok(grid)
}

/// Assert two grids are element-wise identical (RMS exactly zero).
pub fn assert_identical(a: &BlockGrid, b: &BlockGrid, msg: &str) {
    assert!(verify::same_fill_set(a, b), "{}: fill sets differ", msg);
    let v = verify::compare(a, b, verify::DEFAULT_TOLERANCE);
    assert_eq!(v.rms, 0.0, "{}: RMS error {}", msg, v.rms);
    assert!(v.compared > 0, "{}: nothing compared", msg);
}
