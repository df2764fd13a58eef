//! Oracle reward payout.

use peg_assets::PegTicker;
use peg_chain::Address;

use crate::error::SyncError;
use crate::grader::GradedOracleBlock;
use crate::ledger::traits::LedgerTransaction;

/// Mints PEG to every winner of the graded oracle block.
///
/// Runs last in the pipeline so rewards minted at height H are spendable only
/// from H+1. A winner whose declared address does not parse forfeits the
/// reward.
pub(super) fn apply_graded_oracle_block<T>(
    dbtx: &mut T,
    graded: &GradedOracleBlock,
) -> Result<(), SyncError<T::Error>>
where
    T: LedgerTransaction,
{
    for winner in graded.winners() {
        let address: Address = match winner.address.parse() {
            Ok(address) => address,
            Err(error) => {
                tracing::warn!(
                    entry_hash = %winner.entry_hash,
                    %error,
                    "failed to reward winner"
                );
                continue;
            }
        };

        dbtx.add_to_balance(&address, PegTicker::Peg, winner.payout)
            .map_err(SyncError::StoreError)?;
    }

    Ok(())
}
