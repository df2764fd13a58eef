#![warn(missing_docs)]

//! Pegged-asset primitives.
//!
//! The sidechain ledger tracks a fixed set of synthetic tickers. Transactions
//! against those tickers arrive as JSON-encoded entries on the transaction
//! sub-chain and are grouped into batches, one batch per entry. A batch either
//! moves value between accounts (a transfer set) or changes the ticker an
//! account holds (a conversion, priced by the oracle rate vector in effect at
//! execution time).
//!
//! Conversion outputs are computed with 128-bit widened integer math and
//! round toward zero; no floating point is involved anywhere in the ledger.

pub mod conversion;
pub mod ticker;
pub mod transaction;

pub use conversion::{convert, ConversionError};
pub use ticker::{PegTicker, RateVector};
pub use transaction::{Transaction, TransactionBatch, TransactionBatchError, Transfer, TxInput};
