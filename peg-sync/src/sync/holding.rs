//! Deferred execution of conversion-bearing batches.
//!
//! A conversion priced in the same block that introduced its rates would let
//! a submitter trade against an oracle result they have already seen. Any
//! batch with at least one conversion therefore enters a durable holding
//! queue tagged with its entry height, and executes only once a later block
//! finalizes a new rate epoch.

use crate::error::SyncError;
use crate::ledger::traits::LedgerTransaction;
use crate::sync::transactions::{self, BatchOutcome};

/// Drains every held batch that entered since the previous rate epoch,
/// pricing conversions with the rates now in effect.
///
/// Invoked only on heights that recorded a rate epoch. Every entry height in
/// `[previous_epoch, current_height)` is visited; batches that went stale in
/// holding, replays and underfunded batches are dropped individually and the
/// drain continues.
pub(super) fn apply_batches_in_holding<T>(
    dbtx: &mut T,
    current_height: u32,
) -> Result<(), SyncError<T::Error>>
where
    T: LedgerTransaction,
{
    // When this height defines the first epoch ever, everything parked below
    // it is eligible.
    let epoch_height = dbtx
        .most_recent_rates_before(current_height)
        .map_err(SyncError::StoreError)?
        .map_or(0, |(_, epoch_height)| epoch_height);
    let Some(rates) = dbtx
        .pending_rates(current_height)
        .map_err(SyncError::StoreError)?
    else {
        return Ok(());
    };

    for height in epoch_height..current_height {
        let held = dbtx
            .batches_in_holding_at(height)
            .map_err(SyncError::StoreError)?;
        for held_batch in held {
            let batch = held_batch.batch;
            // The timestamp window may have lapsed while the batch sat in
            // holding.
            if batch.validate().is_err() {
                continue;
            }
            if dbtx
                .is_replay_transaction(&batch.hash)
                .map_err(SyncError::StoreError)?
            {
                continue;
            }

            if transactions::apply_transaction_batch(dbtx, &batch, Some(&rates), current_height)?
                == BatchOutcome::InsufficientBalance
            {
                tracing::trace!(
                    height = current_height,
                    entry_hash = %batch.hash,
                    "underfunded batch dropped from holding"
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use peg_assets::{PegTicker, Transaction, TransactionBatch, TxInput};
    use peg_chain::{Address, Bytes32};

    use crate::ledger::traits::{LedgerStore, LedgerTransaction};
    use crate::testutils::{rate_vector, unix_now, MemoryLedger};

    use super::*;

    fn conversion_batch(
        hash_byte: u8,
        owner: Address,
        amount: u64,
        timestamp: u64,
    ) -> TransactionBatch {
        TransactionBatch {
            hash: Bytes32::new([hash_byte; 32]),
            timestamp,
            transactions: vec![Transaction {
                input: TxInput {
                    address: owner,
                    ticker: PegTicker::PUsd,
                    amount,
                },
                conversion: Some(PegTicker::Peg),
                transfers: Vec::new(),
            }],
        }
    }

    #[test]
    fn drains_every_height_since_the_previous_epoch() {
        let mut ledger = MemoryLedger::new();
        let alice = Address::new([1; 32]);
        let bob = Address::new([2; 32]);
        ledger.credit(&alice, PegTicker::PUsd, 1_000);
        // bob is unfunded on purpose.

        let now = unix_now();
        let mut dbtx = ledger.begin().unwrap();
        dbtx.insert_rates(5, &rate_vector(&[(PegTicker::PUsd, 10), (PegTicker::Peg, 25)]))
            .unwrap();
        dbtx.insert_batch_holding(
            &conversion_batch(0xAA, bob, 500, now),
            5,
            Bytes32::new([0; 32]),
        )
        .unwrap();
        dbtx.insert_batch_holding(
            &conversion_batch(0xBB, alice, 1_000, now),
            6,
            Bytes32::new([0; 32]),
        )
        .unwrap();
        dbtx.insert_rates(7, &rate_vector(&[(PegTicker::PUsd, 10), (PegTicker::Peg, 20)]))
            .unwrap();
        dbtx.commit().unwrap();

        let mut dbtx = ledger.begin().unwrap();
        apply_batches_in_holding(&mut dbtx, 7).unwrap();
        dbtx.commit().unwrap();

        // bob's underfunded batch was dropped; alice's, which entered a later
        // height of the same window, still executed at the height-7 rates.
        assert_eq!(ledger.balance(&alice, PegTicker::PUsd), 0);
        assert_eq!(ledger.balance(&alice, PegTicker::Peg), 500);
        assert_eq!(ledger.balance(&bob, PegTicker::Peg), 0);
        assert!(ledger.is_applied(&Bytes32::new([0xBB; 32])));
        assert!(!ledger.is_applied(&Bytes32::new([0xAA; 32])));
    }

    #[test]
    fn first_epoch_drains_everything_parked_below_it() {
        let mut ledger = MemoryLedger::new();
        let alice = Address::new([1; 32]);
        ledger.credit(&alice, PegTicker::PUsd, 1_000);

        let mut dbtx = ledger.begin().unwrap();
        dbtx.insert_batch_holding(
            &conversion_batch(0xAA, alice, 1_000, unix_now()),
            6,
            Bytes32::new([0; 32]),
        )
        .unwrap();
        dbtx.insert_rates(7, &rate_vector(&[(PegTicker::PUsd, 10), (PegTicker::Peg, 20)]))
            .unwrap();
        dbtx.commit().unwrap();

        // Height 7 defines the first epoch ever; the window reaches down to
        // genesis so nothing is stranded.
        let mut dbtx = ledger.begin().unwrap();
        apply_batches_in_holding(&mut dbtx, 7).unwrap();
        dbtx.commit().unwrap();

        assert_eq!(ledger.balance(&alice, PegTicker::PUsd), 0);
        assert_eq!(ledger.balance(&alice, PegTicker::Peg), 500);
        assert!(ledger.is_applied(&Bytes32::new([0xAA; 32])));
    }

    #[test]
    fn stale_batches_expire_in_holding() {
        let mut ledger = MemoryLedger::new();
        let alice = Address::new([1; 32]);
        ledger.credit(&alice, PegTicker::PUsd, 1_000);

        let stale = unix_now() - 3 * peg_assets::transaction::TIMESTAMP_WINDOW_SECS;
        let mut dbtx = ledger.begin().unwrap();
        dbtx.insert_rates(5, &rate_vector(&[(PegTicker::PUsd, 10), (PegTicker::Peg, 20)]))
            .unwrap();
        dbtx.insert_batch_holding(
            &conversion_batch(0xAA, alice, 1_000, stale),
            6,
            Bytes32::new([0; 32]),
        )
        .unwrap();
        dbtx.insert_rates(7, &rate_vector(&[(PegTicker::PUsd, 10), (PegTicker::Peg, 20)]))
            .unwrap();
        dbtx.commit().unwrap();

        let mut dbtx = ledger.begin().unwrap();
        apply_batches_in_holding(&mut dbtx, 7).unwrap();
        dbtx.commit().unwrap();

        assert_eq!(ledger.balance(&alice, PegTicker::PUsd), 1_000);
        assert_eq!(ledger.balance(&alice, PegTicker::Peg), 0);
        assert!(!ledger.is_applied(&Bytes32::new([0xAA; 32])));
    }

    #[test]
    fn replayed_batches_are_skipped() {
        let mut ledger = MemoryLedger::new();
        let alice = Address::new([1; 32]);
        ledger.credit(&alice, PegTicker::PUsd, 2_000);

        let mut dbtx = ledger.begin().unwrap();
        dbtx.insert_rates(6, &rate_vector(&[(PegTicker::PUsd, 10), (PegTicker::Peg, 20)]))
            .unwrap();
        dbtx.insert_batch_holding(
            &conversion_batch(0xAA, alice, 1_000, unix_now()),
            6,
            Bytes32::new([0; 32]),
        )
        .unwrap();
        dbtx.insert_rates(8, &rate_vector(&[(PegTicker::PUsd, 10), (PegTicker::Peg, 20)]))
            .unwrap();
        dbtx.commit().unwrap();

        let mut dbtx = ledger.begin().unwrap();
        apply_batches_in_holding(&mut dbtx, 8).unwrap();
        dbtx.commit().unwrap();
        assert_eq!(ledger.balance(&alice, PegTicker::Peg), 500);

        // A second drain over the same window finds the replay mark.
        let mut dbtx = ledger.begin().unwrap();
        apply_batches_in_holding(&mut dbtx, 8).unwrap();
        dbtx.commit().unwrap();

        assert_eq!(ledger.balance(&alice, PegTicker::PUsd), 1_000);
        assert_eq!(ledger.balance(&alice, PegTicker::Peg), 500);
    }
}
