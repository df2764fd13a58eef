//! Entrypoint for the sync engine: the outer directory-block loop and the
//! per-height pipeline.

use std::sync::atomic::{self, AtomicBool, AtomicU32};
use std::sync::Arc;
use std::time::{Duration, Instant};

use peg_chain::{EBlock, EBlockRef, ORACLE_CHAIN, TRANSACTION_CHAIN};

use crate::client::{fetch, ChainClient};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::grader::OracleGrader;
use crate::ledger::traits::{LedgerStore, LedgerTransaction};
use crate::ledger::SyncCursor;

pub(crate) mod burns;
pub(crate) mod holding;
pub(crate) mod rewards;
pub(crate) mod transactions;

const SYNC_STATS_INTERVAL: u32 = 50;

/// Drives the ledger forward until `shutdown` is set.
///
/// Polls the upstream tip and replays every missing directory block in order,
/// each height inside its own store transaction with all-or-nothing
/// semantics. `synced` is updated after every commit and is the read-side
/// view of the cursor for status surfaces; the write-side cursor is
/// rehydrated from the store before the first poll.
///
/// Returns `Ok(())` once cancellation is observed. The only error returned is
/// a rollback fault, after which the process should exit and re-enter from
/// durable state.
pub async fn sync<C, G, S>(
    client: Arc<C>,
    grader: &G,
    store: &mut S,
    shutdown: Arc<AtomicBool>,
    synced: Arc<AtomicU32>,
    config: SyncConfig,
) -> Result<(), SyncError<S::Error>>
where
    C: ChainClient + ?Sized,
    G: OracleGrader,
    S: LedgerStore,
{
    let mut cursor = store
        .synced_cursor()
        .map_err(SyncError::StoreError)?
        .unwrap_or(SyncCursor { synced_height: 0 });
    synced.store(cursor.synced_height, atomic::Ordering::Release);
    tracing::info!(height = cursor.synced_height, "starting sync");

    'outer: loop {
        if is_done(&shutdown) {
            return Ok(());
        }

        let heights = match client.heights().await {
            Ok(heights) => heights,
            Err(error) => {
                tracing::error!(%error, "failed to fetch heights");
                tokio::time::sleep(config.retry_period).await;
                continue;
            }
        };

        if cursor.synced_height >= heights.directory_block {
            // Synced, or the upstream rebooted onto a shorter chain. Wait
            // either way; the next poll reports where it actually is.
            tokio::time::sleep(config.retry_period).await;
            continue;
        }

        let mut total = Duration::ZERO;
        let mut iterations = 0u32;
        let begin = Instant::now();

        while cursor.synced_height < heights.directory_block {
            if is_done(&shutdown) {
                return Ok(());
            }
            let target = cursor.synced_height + 1;

            let start = Instant::now();
            let mut dbtx = match store.begin() {
                Ok(dbtx) => dbtx,
                Err(error) => {
                    tracing::error!(height = target, %error, "failed to start transaction");
                    tokio::time::sleep(config.retry_period).await;
                    continue;
                }
            };

            match sync_block(&*client, grader, &mut dbtx, target, &shutdown).await {
                Ok(()) => {}
                Err(SyncError::Cancelled) => {
                    roll_back(dbtx, target)?;
                    return Ok(());
                }
                Err(error) => {
                    tracing::error!(height = target, %error, "failed to sync height");
                    roll_back(dbtx, target)?;
                    tokio::time::sleep(config.retry_period).await;
                    // Back out to the outer loop so a rebooted upstream with a
                    // different chain gets a fresh heights response first.
                    continue 'outer;
                }
            }

            cursor.synced_height = target;
            if let Err(error) = dbtx.insert_synced(cursor) {
                cursor.synced_height = target - 1;
                tracing::error!(height = target, %error, "unable to update synced metadata");
                roll_back(dbtx, target)?;
                tokio::time::sleep(config.retry_period).await;
                continue 'outer;
            }
            if let Err(error) = dbtx.commit() {
                cursor.synced_height = target - 1;
                tracing::error!(height = target, %error, "unable to commit height");
                tokio::time::sleep(config.retry_period).await;
                continue 'outer;
            }
            synced.store(cursor.synced_height, atomic::Ordering::Release);

            let elapsed = start.elapsed();
            tracing::debug!(height = cursor.synced_height, ?elapsed, "synced");

            iterations += 1;
            total += elapsed;
            if iterations % SYNC_STATS_INTERVAL == 0 {
                let average = total / iterations;
                let left = average * (heights.directory_block - cursor.synced_height);
                tracing::info!(
                    height = cursor.synced_height,
                    ?average,
                    ?left,
                    syncing_to = heights.directory_block,
                    elapsed = ?begin.elapsed(),
                    "sync stats"
                );
            }
        }
    }
}

/// Applies the full effects of directory block `height` inside `dbtx`.
///
/// On success every mutation of the height sits in `dbtx` awaiting the
/// caller's cursor bump and commit. On error the caller must roll `dbtx`
/// back; nothing from the height may survive.
async fn sync_block<C, G, T>(
    client: &C,
    grader: &G,
    dbtx: &mut T,
    height: u32,
    shutdown: &AtomicBool,
) -> Result<(), SyncError<T::Error>>
where
    C: ChainClient + ?Sized,
    G: OracleGrader,
    T: LedgerTransaction,
{
    if is_done(shutdown) {
        return Err(SyncError::Cancelled);
    }

    let dblock = client.dblock(height).await?;

    // Gather both sub-chain blocks up front, payloads included.
    let oracle_eblock = fetch_sub_chain(client, dblock.eblock(ORACLE_CHAIN)).await?;
    let transaction_eblock = fetch_sub_chain(client, dblock.eblock(TRANSACTION_CHAIN)).await?;

    let graded = grader
        .grade(height, oracle_eblock.as_ref())
        .map_err(|error| SyncError::GraderError(Box::new(error)))?;

    if let Some(graded) = &graded {
        let eblock = oracle_eblock
            .as_ref()
            .expect("a graded block implies an oracle sub-chain block");
        dbtx.insert_graded_block(eblock, graded)
            .map_err(SyncError::StoreError)?;
        match graded.winners().first() {
            Some(winner) => {
                dbtx.insert_rates(height, winner.ordered_asset_rates())
                    .map_err(SyncError::StoreError)?;
            }
            None => tracing::trace!(height, "no winners"),
        }
    }

    // From here the database updates happen in a fixed order.

    // 1) Drain holding. Conversions only ever execute here, one rate epoch
    //    after the block that carried them.
    if graded
        .as_ref()
        .is_some_and(|graded| !graded.winners().is_empty())
    {
        holding::apply_batches_in_holding(dbtx, height)?;
    }

    // 2) Apply this height's transaction sub-chain. New conversions go to
    //    holding; transfer sets apply immediately.
    if let Some(eblock) = &transaction_eblock {
        transactions::apply_transaction_eblock(dbtx, eblock)?;
    }

    // 3) Native burns. Minted pFCT is spendable from the next block.
    burns::apply_factoid_block(client, dbtx, &dblock, shutdown).await?;

    // 4) Oracle rewards. Minted PEG is spendable from the next block.
    if let Some(graded) = &graded {
        rewards::apply_graded_oracle_block(dbtx, graded)?;
    }

    Ok(())
}

/// Fetches the referenced sub-chain block and all of its entry payloads.
async fn fetch_sub_chain<C, E>(
    client: &C,
    eblock_ref: Option<&EBlockRef>,
) -> Result<Option<EBlock>, SyncError<E>>
where
    C: ChainClient + ?Sized,
    E: std::fmt::Debug + std::fmt::Display,
{
    let Some(eblock_ref) = eblock_ref else {
        return Ok(None);
    };

    let mut eblock = client.eblock(eblock_ref.key_mr).await?;
    fetch::fetch_entry_payloads(client, &mut eblock).await?;

    Ok(Some(eblock))
}

fn roll_back<T>(dbtx: T, height: u32) -> Result<(), SyncError<T::Error>>
where
    T: LedgerTransaction,
{
    dbtx.rollback().map_err(|error| {
        tracing::error!(height, %error, "unable to roll back transaction");
        SyncError::RollbackFailed { height, error }
    })
}

fn is_done(shutdown: &AtomicBool) -> bool {
    shutdown.load(atomic::Ordering::Acquire)
}
