//! Applying transaction batches to the ledger.

use peg_assets::{convert, RateVector, TransactionBatch};
use peg_chain::EBlock;

use crate::error::SyncError;
use crate::ledger::traits::LedgerTransaction;
use crate::ledger::InsufficientBalance;

/// How a batch application ended. Underfunded batches are dropped, never
/// rolled back to.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum BatchOutcome {
    /// Every transaction in the batch applied.
    Executed,
    /// The batch hit an underfunded debit and was abandoned.
    InsufficientBalance,
}

/// Applies one height's transaction sub-chain block.
///
/// Conversion-bearing batches are parked in holding for a future rate epoch;
/// everything else applies immediately. Malformed entries, invalid batches,
/// replays and underfunded batches are skipped without disturbing the block.
pub(super) fn apply_transaction_eblock<T>(
    dbtx: &mut T,
    eblock: &EBlock,
) -> Result<(), SyncError<T::Error>>
where
    T: LedgerTransaction,
{
    for entry in &eblock.entries {
        let batch = match TransactionBatch::from_entry(entry) {
            Ok(batch) => batch,
            Err(_) => continue, // badly formatted entry
        };
        if batch.validate().is_err() {
            continue;
        }
        tracing::trace!(
            height = eblock.height,
            entry_hash = %batch.hash,
            txs = batch.transactions.len(),
            "transaction batch found"
        );

        if dbtx
            .is_replay_transaction(&batch.hash)
            .map_err(SyncError::StoreError)?
        {
            continue;
        }

        // A batch containing conversions must be put into holding and
        // executed in a future block, so a submitter who already knows the
        // height's rates cannot trade against them.
        if batch.has_conversions() {
            dbtx.insert_batch_holding(&batch, eblock.height, eblock.key_mr)
                .map_err(SyncError::StoreError)?;
            continue;
        }

        if apply_transaction_batch(dbtx, &batch, None, eblock.height)?
            == BatchOutcome::InsufficientBalance
        {
            tracing::trace!(
                height = eblock.height,
                entry_hash = %batch.hash,
                "underfunded batch dropped"
            );
        }
    }

    Ok(())
}

/// Applies every transaction of `batch` in order.
///
/// `rates` must be present when the batch contains conversions. A conversion
/// leg the oracle did not quote (zero rate on either side) keeps its debit
/// and credits nothing. An underfunded debit abandons the batch with
/// [`BatchOutcome::InsufficientBalance`]; effects of the batch's earlier
/// transactions remain in `dbtx`, exactly as the store applied them.
pub(crate) fn apply_transaction_batch<T>(
    dbtx: &mut T,
    batch: &TransactionBatch,
    rates: Option<&RateVector>,
    current_height: u32,
) -> Result<BatchOutcome, SyncError<T::Error>>
where
    T: LedgerTransaction,
{
    for (index, tx) in batch.transactions.iter().enumerate() {
        let input_id = match dbtx
            .sub_from_balance(&tx.input.address, tx.input.ticker, tx.input.amount)
            .map_err(SyncError::StoreError)?
        {
            Ok(input_id) => input_id,
            Err(InsufficientBalance) => return Ok(BatchOutcome::InsufficientBalance),
        };
        dbtx.insert_transaction_relation(input_id, &batch.hash, index as u64, false, tx.is_conversion())
            .map_err(SyncError::StoreError)?;

        if let Some(target) = tx.conversion {
            let rates = rates
                .filter(|rates| !rates.is_empty())
                .ok_or(SyncError::MissingConversionRates)?;
            let from_rate = rates.get(&tx.input.ticker).copied().unwrap_or(0);
            let to_rate = rates.get(&target).copied().unwrap_or(0);
            // A zero rate means the oracle did not quote the asset this
            // epoch. The debit stands; the output is nothing.
            if from_rate == 0 || to_rate == 0 {
                continue;
            }

            let output = convert(tx.input.amount, from_rate, to_rate)?;
            dbtx.add_to_balance(&tx.input.address, target, output)
                .map_err(SyncError::StoreError)?;
        } else {
            for transfer in &tx.transfers {
                let output_id = dbtx
                    .add_to_balance(&transfer.address, tx.input.ticker, transfer.amount)
                    .map_err(SyncError::StoreError)?;
                dbtx.insert_transaction_relation(output_id, &batch.hash, index as u64, true, false)
                    .map_err(SyncError::StoreError)?;
            }
        }
    }

    tracing::trace!(
        height = current_height,
        entry_hash = %batch.hash,
        conversions = batch.has_conversions(),
        txs = batch.transactions.len(),
        "transaction batch applied"
    );

    Ok(BatchOutcome::Executed)
}
