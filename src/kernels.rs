//! Dense block kernels
//!
//! The four block-local routines of right-looking LU factorization. Each
//! operates on one to three blocks of equal size and knows nothing about
//! the grid. Loop order matches the reference elimination exactly so that
//! sequential and scheduled runs produce bit-identical results.
//!
//! `lu0` is only ever invoked on a structurally present diagonal block, and
//! the generator's pattern keeps every diagonal cell present, so a
//! divide-by-structural-zero cannot occur by construction. No pivoting is
//! performed (reference algorithm).

use crate::block::Block;

/// In-place dense LU factorization without pivoting of a diagonal block.
///
/// On return the block holds L (unit diagonal, implicit) below the diagonal
/// and U on and above it.
pub fn lu0(diag: &mut Block) {
    let b = diag.size();
    for k in 0..b {
        let pivot = diag[(k, k)];
        for i in (k + 1)..b {
            diag[(i, k)] /= pivot;
            let mult = diag[(i, k)];
            for j in (k + 1)..b {
                diag[(i, j)] -= mult * diag[(k, j)];
            }
        }
    }
}

/// Forward elimination of a column-panel block using the factorized
/// diagonal's L factor: `col ← L⁻¹ · col`.
pub fn fwd(diag: &Block, col: &mut Block) {
    debug_assert_eq!(diag.size(), col.size());
    let b = col.size();
    for j in 0..b {
        for k in 0..b {
            let upper = col[(k, j)];
            for i in (k + 1)..b {
                col[(i, j)] -= diag[(i, k)] * upper;
            }
        }
    }
}

/// Back-division of a row-panel block against the factorized diagonal:
/// `row ← row · U⁻¹`, solved implicitly by substitution against the stored
/// factors.
pub fn bdiv(diag: &Block, row: &mut Block) {
    debug_assert_eq!(diag.size(), row.size());
    let b = row.size();
    for i in 0..b {
        for k in 0..b {
            row[(i, k)] /= diag[(k, k)];
            let mult = row[(i, k)];
            for j in (k + 1)..b {
                row[(i, j)] -= mult * diag[(k, j)];
            }
        }
    }
}

/// Rank-B trailing update: `target ← target − row · col`.
///
/// This is the only kernel whose target can be a filled-in cell; the caller
/// must have allocated it (zeroed) before dispatch.
pub fn bmod(row: &Block, col: &Block, target: &mut Block) {
    debug_assert_eq!(row.size(), col.size());
    debug_assert_eq!(row.size(), target.size());
    let b = target.size();
    for i in 0..b {
        for j in 0..b {
            let mut acc = target[(i, j)];
            for k in 0..b {
                acc -= row[(i, k)] * col[(k, j)];
            }
            target[(i, j)] = acc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    fn block_from(values: &[f32], size: usize) -> Result<Block> {
        let mut b = Block::zeros(size)?;
        b.as_mut_slice().copy_from_slice(values);
        Ok(b)
    }

    /// Multiply the L and U factors stored packed in `lu`.
    fn reconstruct(lu: &Block) -> Block {
        let b = lu.size();
        let mut out = Block::zeros(b).unwrap();
        for i in 0..b {
            for j in 0..b {
                let mut sum = 0.0;
                for k in 0..=i.min(j) {
                    let l = if k == i { 1.0 } else { lu[(i, k)] };
                    sum += l * lu[(k, j)];
                }
                out[(i, j)] = sum;
            }
        }
        out
    }

    #[test]
    fn test_lu0_reconstructs_input() {
        let a = block_from(&[4.0, 3.0, 2.0, 6.0, 3.0, 1.0, 2.0, 5.0, 7.0], 3).unwrap();
        let mut lu = a.clone();
        lu0(&mut lu);
        let back = reconstruct(&lu);
        for (x, y) in a.as_slice().iter().zip(back.as_slice()) {
            assert!((x - y).abs() < 1e-4, "{} vs {}", x, y);
        }
    }

    #[test]
    fn test_bdiv_solves_row_system() {
        // After bdiv, row · U = original row (with U from the factorized diag).
        let diag_src = block_from(&[4.0, 3.0, 6.0, 3.0], 2).unwrap();
        let mut diag = diag_src.clone();
        lu0(&mut diag);

        let row_src = block_from(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        let mut row = row_src.clone();
        bdiv(&diag, &mut row);

        // U is the upper triangle of the factorized diagonal.
        let b = 2;
        for i in 0..b {
            for j in 0..b {
                let mut sum = 0.0;
                for k in 0..=j {
                    sum += row[(i, k)] * diag[(k, j)];
                }
                assert!(
                    (sum - row_src[(i, j)]).abs() < 1e-5,
                    "({}, {}): {} vs {}",
                    i,
                    j,
                    sum,
                    row_src[(i, j)]
                );
            }
        }
    }

    #[test]
    fn test_fwd_solves_column_system() {
        // After fwd, L · col = original col (unit-diagonal L from the diag).
        let mut diag = block_from(&[4.0, 3.0, 6.0, 3.0], 2).unwrap();
        lu0(&mut diag);

        let col_src = block_from(&[5.0, 1.0, 2.0, 8.0], 2).unwrap();
        let mut col = col_src.clone();
        fwd(&diag, &mut col);

        let b = 2;
        for i in 0..b {
            for j in 0..b {
                let mut sum = col[(i, j)];
                for k in 0..i {
                    sum += diag[(i, k)] * col[(k, j)];
                }
                assert!((sum - col_src[(i, j)]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_bmod_subtracts_product() {
        let row = block_from(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        let col = block_from(&[5.0, 6.0, 7.0, 8.0], 2).unwrap();
        let mut target = block_from(&[100.0, 100.0, 100.0, 100.0], 2).unwrap();
        bmod(&row, &col, &mut target);
        // row · col = [[19, 22], [43, 50]]
        assert_eq!(target.as_slice(), &[81.0, 78.0, 57.0, 50.0]);
    }
}
