//! Durable ledger records and the store seams the engine writes through.

use peg_assets::TransactionBatch;
use peg_chain::Bytes32;

pub mod traits;

/// The single persisted record tracking how far the ledger has been derived.
///
/// Monotonic non-decreasing across commits; the in-memory copy held by the
/// sync loop is the authoritative write-side value and is rehydrated from the
/// store at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCursor {
    /// Height of the last directory block whose effects are committed.
    pub synced_height: u32,
}

/// A conversion-bearing batch parked until a rate epoch later than its entry
/// height exists.
#[derive(Debug, Clone)]
pub struct HeldBatch {
    /// The parked batch.
    pub batch: TransactionBatch,
    /// Height whose transaction sub-chain carried the batch.
    pub entered_height: u32,
    /// KeyMR of the carrying entry block, kept for audit.
    pub source_key_mr: Bytes32,
}

/// Recoverable debit failure: the account cannot cover the amount.
///
/// Never rolls a block back; the batch that triggered it is dropped and the
/// height continues.
#[derive(Debug, thiserror::Error)]
#[error("insufficient balance")]
pub struct InsufficientBalance;
