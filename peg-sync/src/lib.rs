#![warn(missing_docs)]
#![doc = r#"
# Peg Sync

## Overview
Peg-sync is the sync engine of the pegged-asset sidechain: a deterministic
state processor that reconstructs the ledger by replaying the upstream chain's
directory blocks, one height at a time. For each height it fetches the
price-oracle and transaction sub-chain blocks, grades the oracle submissions
through an external grader, and applies four categories of effects in a strict
order inside a single store transaction:

1. Drain of held conversion-bearing batches against the newly finalized rates.
2. Application of the height's own transaction sub-chain (new conversions are
   parked in holding; transfer sets apply immediately).
3. Native-asset burn credits.
4. Oracle reward payouts.

The ordering guarantees that funds minted at height H are spendable only from
H+1, and that no conversion ever executes in the block that introduced the
rates it is priced with.

## Terminology
- Synced height - the highest directory block whose effects are committed; the
  durable total order of the ledger.
- Rate epoch - a height whose oracle grading produced winners, making the
  winning rate vector authoritative for subsequent conversions.
- Holding - durable queue of conversion-bearing batches awaiting the next rate
  epoch after their entry height.
- Replay mark - batch-hash membership enforcing at-most-once application.
- Burn - a native-asset transaction paying zero to the burn sentinel address,
  minting pFCT on the sidechain.

## Collaborators
The engine consumes three seams and owns none of them: the upstream node
behind [`client::ChainClient`], the oracle grader behind
[`grader::OracleGrader`], and the transactional store behind
[`ledger::traits::LedgerStore`]. In-memory stand-ins for all three live in
[`testutils`].

## Failure model
Store faults, fetch failures and grader failures abort the height: the store
transaction rolls back, the cursor stays put, and the outer loop retries after
the configured retry period with a freshly polled tip. Malformed entries,
replayed batches, stale-timestamped batches, unquoted (zero-rate) conversion
legs and underfunded batches are dropped individually without disturbing the
block. Only a rollback fault ends the engine; re-entry from durable state
recovers.
"#]

pub mod client;
pub mod config;
pub mod error;
pub mod grader;
pub mod ledger;
pub mod sync;
pub mod testutils;

pub use config::SyncConfig;
pub use error::{ServerError, SyncError};
pub use sync::sync;
