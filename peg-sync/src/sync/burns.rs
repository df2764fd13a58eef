//! Native-asset burn ingestion.

use std::sync::atomic::AtomicBool;

use peg_assets::PegTicker;
use peg_chain::{DBlock, FactoidIo, FactoidTransaction, BURN_ADDRESS};

use crate::client::ChainClient;
use crate::error::SyncError;
use crate::ledger::traits::LedgerTransaction;

/// Scans the height's factoid block and credits every cross-chain burn with
/// pFCT.
///
/// Credits land after the holding drain and the height's own transfers, so
/// bridged funds are spendable only from the next block.
pub(super) async fn apply_factoid_block<C, T>(
    client: &C,
    dbtx: &mut T,
    dblock: &DBlock,
    shutdown: &AtomicBool,
) -> Result<(), SyncError<T::Error>>
where
    C: ChainClient + ?Sized,
    T: LedgerTransaction,
{
    let fblock = client.fblock(dblock.height).await?;

    let mut burns: Vec<FactoidIo> = Vec::new();
    let mut total_burned = 0u64;
    for id in &fblock.transactions {
        if super::is_done(shutdown) {
            return Err(SyncError::Cancelled);
        }

        let transaction = client.factoid_transaction(*id).await?;
        if let Some(input) = as_burn(&transaction) {
            total_burned += input.amount;
            burns.push(input.clone());
        }
    }

    if total_burned > 0 {
        tracing::debug!(
            height = dblock.height,
            amount = total_burned,
            quantity = burns.len(),
            "native asset burned"
        );
    }

    // A burn input's native address doubles as the credited sidechain
    // account.
    for input in burns {
        dbtx.add_to_balance(&input.address, PegTicker::PFct, input.amount)
            .map_err(SyncError::StoreError)?;
    }

    Ok(())
}

/// Returns the burn input if `transaction` matches the burn pattern exactly:
/// a single native input, no native outputs, and a single zero-amount
/// entry-credit output paying the burn sentinel.
fn as_burn(transaction: &FactoidTransaction) -> Option<&FactoidIo> {
    if transaction.ec_outputs.len() != 1
        || transaction.fct_inputs.len() != 1
        || !transaction.fct_outputs.is_empty()
    {
        return None;
    }

    let output = &transaction.ec_outputs[0];
    if output.address != BURN_ADDRESS || output.amount != 0 {
        return None;
    }

    Some(&transaction.fct_inputs[0])
}
