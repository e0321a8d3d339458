//! Error types for sparselu

use thiserror::Error;

/// Result type alias using sparselu's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or factorizing a block grid
#[derive(Error, Debug)]
pub enum Error {
    /// A block or grid allocation could not be satisfied
    ///
    /// Allocation failure is fatal and never retried; the binary maps it to
    /// its own exit status so a truncated run is distinguishable from a
    /// numerical failure.
    #[error("Allocation failed: could not reserve {bytes} bytes for {what}")]
    Allocation {
        /// What was being allocated
        what: &'static str,
        /// Requested size in bytes
        bytes: usize,
    },

    /// Invalid grid or block dimensions
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected
        reason: String,
    },

    /// The factorized grid did not match the sequential reference
    #[error("Verification failed: RMS error {rms:.3e} exceeds tolerance {tolerance:.3e}")]
    VerificationMismatch {
        /// Root-mean-square error over all compared elements
        rms: f64,
        /// Tolerance the error was compared against
        tolerance: f64,
    },
}

impl Error {
    /// Process exit status for this error.
    ///
    /// Allocation failure exits with the distinct status 101; a
    /// verification mismatch exits 1, a rejected configuration 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Allocation { .. } => 101,
            Error::VerificationMismatch { .. } => 1,
            Error::InvalidConfig { .. } => 2,
        }
    }
}
