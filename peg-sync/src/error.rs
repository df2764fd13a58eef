//! Sync engine error module.

use peg_assets::ConversionError;
use peg_chain::Bytes32;

/// Errors reaching the upstream node or interpreting what it returned.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Transport-level request failure.
    #[error("server request failed. {0}")]
    RequestFailed(Box<dyn std::error::Error + Send + Sync + 'static>),
    /// Directory block not found at the requested height.
    #[error("directory block {0} not found")]
    DBlockNotFound(u32),
    /// Entry block not found for the requested KeyMR.
    #[error("entry block {0} not found")]
    EBlockNotFound(Bytes32),
    /// Entry not found for the requested hash.
    #[error("entry {0} not found")]
    EntryNotFound(Bytes32),
    /// Factoid block not found at the requested height.
    #[error("factoid block {0} not found")]
    FBlockNotFound(u32),
    /// Factoid transaction not found for the requested ID.
    #[error("factoid transaction {0} not found")]
    FactoidTransactionNotFound(Bytes32),
}

/// Top level error enumerating any error that may occur during sync.
#[derive(Debug, thiserror::Error)]
pub enum SyncError<E>
where
    E: std::fmt::Debug + std::fmt::Display,
{
    /// Server error.
    #[error("server error. {0}")]
    ServerError(#[from] ServerError),
    /// Oracle grader error.
    #[error("grader error. {0}")]
    GraderError(Box<dyn std::error::Error + Send + Sync + 'static>),
    /// Conversion math error.
    #[error("conversion error. {0}")]
    ConversionError(#[from] ConversionError),
    /// A conversion-bearing batch reached the applier without a rate vector.
    #[error("rates must exist to apply a batch containing conversions")]
    MissingConversionRates,
    /// Store error.
    #[error("store error. {0}")]
    StoreError(E),
    /// A height's transaction could not be rolled back; the engine cannot
    /// continue safely and re-entry from durable state is required.
    #[error("failed to roll back height {height}. {error}")]
    RollbackFailed {
        /// Height whose transaction was being rolled back.
        height: u32,
        /// Underlying store error.
        error: E,
    },
    /// Cancellation was observed.
    #[error("sync cancelled")]
    Cancelled,
}
