//! Traits for interfacing the balance/metadata store with the sync engine.
//!
//! The store is relational and transactional; the engine never sees how it is
//! laid out. Every mutation of one height happens through a single
//! [`LedgerTransaction`] whose lifetime is scoped to that height: the engine
//! either commits it or rolls it back on every exit path, and dropping an
//! uncommitted transaction must behave like a rollback.

use peg_assets::{PegTicker, RateVector, TransactionBatch};
use peg_chain::{Address, Bytes32, EBlock};

use crate::grader::GradedOracleBlock;
use crate::ledger::{HeldBatch, InsufficientBalance, SyncCursor};

/// Trait for interfacing the ledger store with the sync engine.
pub trait LedgerStore {
    /// Errors associated with the store backend.
    type Error: std::error::Error + std::fmt::Debug + std::fmt::Display + Send + Sync + 'static;

    /// Per-height transaction handle.
    type Transaction<'a>: LedgerTransaction<Error = Self::Error>
    where
        Self: 'a;

    /// Begins a new store transaction.
    fn begin(&mut self) -> Result<Self::Transaction<'_>, Self::Error>;

    /// Returns the persisted sync cursor, or `None` for a fresh store.
    ///
    /// Read once at startup to rehydrate the write-side cursor.
    fn synced_cursor(&self) -> Result<Option<SyncCursor>, Self::Error>;
}

/// One height's transaction against the ledger store.
///
/// Dropping the handle without committing rolls the transaction back; the
/// explicit [`rollback`](LedgerTransaction::rollback) exists so rollback
/// faults are observable, because they are the one failure the engine cannot
/// recover from in-process.
pub trait LedgerTransaction {
    /// Errors associated with the store backend.
    type Error: std::error::Error + std::fmt::Debug + std::fmt::Display + Send + Sync + 'static;

    /// Makes every mutation of this transaction durable.
    fn commit(self) -> Result<(), Self::Error>;

    /// Discards every mutation of this transaction.
    fn rollback(self) -> Result<(), Self::Error>;

    /// Persists the sync cursor.
    fn insert_synced(&mut self, cursor: SyncCursor) -> Result<(), Self::Error>;

    /// Persists the grading artifacts of one oracle block.
    fn insert_graded_block(
        &mut self,
        eblock: &EBlock,
        graded: &GradedOracleBlock,
    ) -> Result<(), Self::Error>;

    /// Records `rates` as the rate epoch defined at `height`.
    ///
    /// At most one rate vector exists per height, written only when the
    /// height had winners.
    fn insert_rates(&mut self, height: u32, rates: &RateVector) -> Result<(), Self::Error>;

    /// Returns the most recent rate epoch strictly below `height`, with the
    /// height that defined it.
    fn most_recent_rates_before(
        &mut self,
        height: u32,
    ) -> Result<Option<(RateVector, u32)>, Self::Error>;

    /// Returns the rate vector in effect for deferred execution at `height`:
    /// the most recently finalized epoch at or below it.
    fn pending_rates(&mut self, height: u32) -> Result<Option<RateVector>, Self::Error>;

    /// Returns every held batch whose entry height is `height`, in insertion
    /// order.
    fn batches_in_holding_at(&mut self, height: u32) -> Result<Vec<HeldBatch>, Self::Error>;

    /// Parks a conversion-bearing batch until the next rate epoch, returning
    /// the row ID.
    fn insert_batch_holding(
        &mut self,
        batch: &TransactionBatch,
        entered_height: u32,
        source_key_mr: Bytes32,
    ) -> Result<i64, Self::Error>;

    /// Whether the batch hash has already been applied.
    fn is_replay_transaction(&mut self, batch_hash: &Bytes32) -> Result<bool, Self::Error>;

    /// Debits `amount` of `ticker` from `address`, returning the address row
    /// ID.
    ///
    /// The inner error is the recoverable [`InsufficientBalance`]; the outer
    /// error is a store fault. The balance is untouched in both error cases.
    fn sub_from_balance(
        &mut self,
        address: &Address,
        ticker: PegTicker,
        amount: u64,
    ) -> Result<Result<i64, InsufficientBalance>, Self::Error>;

    /// Credits `amount` of `ticker` to `address`, returning the address row
    /// ID.
    fn add_to_balance(
        &mut self,
        address: &Address,
        ticker: PegTicker,
        amount: u64,
    ) -> Result<i64, Self::Error>;

    /// Appends an audit row relating an address to one transaction of a
    /// batch. Relation rows double as the batch's replay mark.
    fn insert_transaction_relation(
        &mut self,
        address_id: i64,
        batch_hash: &Bytes32,
        tx_index: u64,
        is_output: bool,
        is_conversion: bool,
    ) -> Result<(), Self::Error>;
}
