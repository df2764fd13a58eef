//! Transaction batches parsed from transaction sub-chain entries.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use peg_chain::{Address, Bytes32, Entry};

use crate::ticker::PegTicker;

/// Batch timestamps are honored within this window, in seconds, on either
/// side of wall-clock time. A batch that sits in holding past the window
/// expires silently at drain time.
pub const TIMESTAMP_WINDOW_SECS: u64 = 60 * 60;

const BATCH_VERSION: u64 = 1;

/// Errors parsing or validating a transaction batch.
#[derive(Debug, thiserror::Error)]
pub enum TransactionBatchError {
    /// Entry payload was not a well-formed batch document.
    #[error("malformed entry payload. {0}")]
    Malformed(#[from] serde_json::Error),
    /// Unsupported payload version.
    #[error("unsupported batch version {0}")]
    UnsupportedVersion(u64),
    /// Batch contains no transactions.
    #[error("batch contains no transactions")]
    Empty,
    /// A transaction input amount was zero.
    #[error("transaction {0} has a zero input amount")]
    ZeroInputAmount(usize),
    /// A transaction declared both a conversion and transfers, or neither.
    #[error("transaction {0} must declare exactly one of conversion or transfers")]
    AmbiguousOutputs(usize),
    /// A conversion targets its own input ticker.
    #[error("transaction {0} converts to its own ticker")]
    SelfConversion(usize),
    /// A transfer amount was zero.
    #[error("transaction {0} has a zero transfer amount")]
    ZeroTransferAmount(usize),
    /// Batch timestamp is outside the validity window.
    #[error("batch timestamp {timestamp} outside validity window at {now}")]
    StaleTimestamp {
        /// Batch timestamp in unix seconds.
        timestamp: u64,
        /// Wall-clock time the check ran at, in unix seconds.
        now: u64,
    },
}

/// One output of a transfer-set transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    /// Receiving account.
    pub address: Address,
    /// Amount credited, in indivisible units of the input ticker.
    pub amount: u64,
}

/// The funding side of a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInput {
    /// Funding account.
    pub address: Address,
    /// Asset debited.
    #[serde(rename = "type")]
    pub ticker: PegTicker,
    /// Amount debited, in indivisible units.
    pub amount: u64,
}

/// A single ledger transaction: either a conversion (ticker change, same
/// owner) or a transfer set (same ticker, one or more receivers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Funding input.
    pub input: TxInput,
    /// Target ticker, when this transaction is a conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<PegTicker>,
    /// Receivers, when this transaction is a transfer set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transfers: Vec<Transfer>,
}

impl Transaction {
    /// Whether this transaction changes the input's ticker.
    #[must_use]
    pub fn is_conversion(&self) -> bool {
        self.conversion.is_some()
    }
}

#[derive(Serialize, Deserialize)]
struct BatchPayload {
    version: u64,
    transactions: Vec<Transaction>,
}

/// A batch of transactions carried by one transaction sub-chain entry.
///
/// The batch hash is the entry hash; it doubles as the replay mark once the
/// batch has been applied.
#[derive(Debug, Clone)]
pub struct TransactionBatch {
    /// Entry hash of the carrying entry.
    pub hash: Bytes32,
    /// Entry timestamp in unix seconds.
    pub timestamp: u64,
    /// Transactions in batch order.
    pub transactions: Vec<Transaction>,
}

impl TransactionBatch {
    /// Parses a batch out of a fetched transaction sub-chain entry.
    pub fn from_entry(entry: &Entry) -> Result<Self, TransactionBatchError> {
        let payload: BatchPayload = serde_json::from_slice(&entry.content)?;
        if payload.version != BATCH_VERSION {
            return Err(TransactionBatchError::UnsupportedVersion(payload.version));
        }

        Ok(Self {
            hash: entry.hash,
            timestamp: entry.timestamp,
            transactions: payload.transactions,
        })
    }

    /// Encodes `transactions` as the wire payload of a batch entry.
    #[must_use]
    pub fn payload(transactions: &[Transaction]) -> Vec<u8> {
        serde_json::to_vec(&BatchPayload {
            version: BATCH_VERSION,
            transactions: transactions.to_vec(),
        })
        .expect("batch payload serialization is infallible")
    }

    /// Validates batch structure and the timestamp window against wall-clock
    /// time.
    ///
    /// Validity is time-dependent: a batch that passed on arrival may fail
    /// here after sitting in holding.
    pub fn validate(&self) -> Result<(), TransactionBatchError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is after the unix epoch")
            .as_secs();
        self.validate_at(now)
    }

    /// Validates batch structure and the timestamp window against `now`, in
    /// unix seconds.
    pub fn validate_at(&self, now: u64) -> Result<(), TransactionBatchError> {
        if self.transactions.is_empty() {
            return Err(TransactionBatchError::Empty);
        }

        for (index, tx) in self.transactions.iter().enumerate() {
            if tx.input.amount == 0 {
                return Err(TransactionBatchError::ZeroInputAmount(index));
            }
            if tx.conversion.is_some() == !tx.transfers.is_empty() {
                return Err(TransactionBatchError::AmbiguousOutputs(index));
            }
            if tx.conversion == Some(tx.input.ticker) {
                return Err(TransactionBatchError::SelfConversion(index));
            }
            if tx.transfers.iter().any(|transfer| transfer.amount == 0) {
                return Err(TransactionBatchError::ZeroTransferAmount(index));
            }
        }

        if now.abs_diff(self.timestamp) > TIMESTAMP_WINDOW_SECS {
            return Err(TransactionBatchError::StaleTimestamp {
                timestamp: self.timestamp,
                now,
            });
        }

        Ok(())
    }

    /// Whether any transaction in the batch is a conversion.
    #[must_use]
    pub fn has_conversions(&self) -> bool {
        self.transactions.iter().any(Transaction::is_conversion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(byte: u8) -> Address {
        Address::new([byte; 32])
    }

    fn entry_with(content: Vec<u8>, timestamp: u64) -> Entry {
        Entry {
            hash: Bytes32::new([9; 32]),
            timestamp,
            content,
        }
    }

    fn transfer_tx(amount: u64) -> Transaction {
        Transaction {
            input: TxInput {
                address: address(1),
                ticker: PegTicker::PUsd,
                amount,
            },
            conversion: None,
            transfers: vec![Transfer {
                address: address(2),
                amount,
            }],
        }
    }

    fn conversion_tx(target: PegTicker) -> Transaction {
        Transaction {
            input: TxInput {
                address: address(1),
                ticker: PegTicker::PUsd,
                amount: 1000,
            },
            conversion: Some(target),
            transfers: Vec::new(),
        }
    }

    #[test]
    fn parses_wire_payload() {
        let payload = TransactionBatch::payload(&[transfer_tx(50), conversion_tx(PegTicker::Peg)]);
        let batch = TransactionBatch::from_entry(&entry_with(payload, 1234)).unwrap();

        assert_eq!(batch.timestamp, 1234);
        assert_eq!(batch.transactions.len(), 2);
        assert!(!batch.transactions[0].is_conversion());
        assert!(batch.transactions[1].is_conversion());
        assert!(batch.has_conversions());
    }

    #[test]
    fn rejects_garbage_and_bad_versions() {
        assert!(matches!(
            TransactionBatch::from_entry(&entry_with(b"not json".to_vec(), 0)),
            Err(TransactionBatchError::Malformed(_))
        ));

        let bad_version = br#"{"version":2,"transactions":[]}"#.to_vec();
        assert!(matches!(
            TransactionBatch::from_entry(&entry_with(bad_version, 0)),
            Err(TransactionBatchError::UnsupportedVersion(2))
        ));

        let unknown_ticker = br#"{"version":1,"transactions":[{"input":{
            "address":"0101010101010101010101010101010101010101010101010101010101010101",
            "type":"pDOGE","amount":5},"conversion":"PEG"}]}"#
            .to_vec();
        assert!(matches!(
            TransactionBatch::from_entry(&entry_with(unknown_ticker, 0)),
            Err(TransactionBatchError::Malformed(_))
        ));
    }

    #[test]
    fn validates_structure() {
        let now = 1_000_000;
        let batch = |transactions: Vec<Transaction>| TransactionBatch {
            hash: Bytes32::new([0; 32]),
            timestamp: now,
            transactions,
        };

        assert!(matches!(
            batch(Vec::new()).validate_at(now),
            Err(TransactionBatchError::Empty)
        ));
        assert!(matches!(
            batch(vec![transfer_tx(0)]).validate_at(now),
            Err(TransactionBatchError::ZeroInputAmount(0))
        ));
        assert!(matches!(
            batch(vec![conversion_tx(PegTicker::PUsd)]).validate_at(now),
            Err(TransactionBatchError::SelfConversion(0))
        ));

        let mut both = conversion_tx(PegTicker::Peg);
        both.transfers = vec![Transfer {
            address: address(2),
            amount: 1,
        }];
        assert!(matches!(
            batch(vec![both]).validate_at(now),
            Err(TransactionBatchError::AmbiguousOutputs(0))
        ));

        let mut neither = conversion_tx(PegTicker::Peg);
        neither.conversion = None;
        assert!(matches!(
            batch(vec![neither]).validate_at(now),
            Err(TransactionBatchError::AmbiguousOutputs(0))
        ));

        let mut zero_transfer = transfer_tx(5);
        zero_transfer.transfers[0].amount = 0;
        assert!(matches!(
            batch(vec![zero_transfer]).validate_at(now),
            Err(TransactionBatchError::ZeroTransferAmount(0))
        ));

        assert!(batch(vec![transfer_tx(5)]).validate_at(now).is_ok());
    }

    #[test]
    fn timestamp_window_edges() {
        let now = 1_000_000;
        let batch = |timestamp| TransactionBatch {
            hash: Bytes32::new([0; 32]),
            timestamp,
            transactions: vec![transfer_tx(5)],
        };

        assert!(batch(now - TIMESTAMP_WINDOW_SECS).validate_at(now).is_ok());
        assert!(batch(now + TIMESTAMP_WINDOW_SECS).validate_at(now).is_ok());
        assert!(matches!(
            batch(now - TIMESTAMP_WINDOW_SECS - 1).validate_at(now),
            Err(TransactionBatchError::StaleTimestamp { .. })
        ));
        assert!(matches!(
            batch(now + TIMESTAMP_WINDOW_SECS + 1).validate_at(now),
            Err(TransactionBatchError::StaleTimestamp { .. })
        ));
    }
}
