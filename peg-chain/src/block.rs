//! Block types returned by the upstream directory-chain client.
//!
//! A directory block pins the application sub-chain blocks minted at its
//! height by reference. Entry blocks list their entries by hash only; each
//! payload is fetched individually. The factoid block is the native-asset
//! block, scanned for cross-chain burns.

use crate::identifier::{Address, Bytes32};

/// Chain heights reported by the upstream node.
#[derive(Debug, Clone, Copy)]
pub struct Heights {
    /// Height of the highest known directory block.
    pub directory_block: u32,
}

/// Reference from a directory block to one application sub-chain block.
#[derive(Debug, Clone, Copy)]
pub struct EBlockRef {
    /// Chain the referenced entry block belongs to.
    pub chain_id: Bytes32,
    /// KeyMR of the referenced entry block.
    pub key_mr: Bytes32,
}

/// The top-level block of the upstream chain at one height.
#[derive(Debug, Clone)]
pub struct DBlock {
    /// Directory block height.
    pub height: u32,
    /// KeyMR of this directory block.
    pub key_mr: Bytes32,
    /// Application sub-chain blocks minted at this height.
    pub eblocks: Vec<EBlockRef>,
}

impl DBlock {
    /// Returns the sub-chain block reference for `chain_id`, if this height
    /// minted one.
    #[must_use]
    pub fn eblock(&self, chain_id: Bytes32) -> Option<&EBlockRef> {
        self.eblocks.iter().find(|eblock| eblock.chain_id == chain_id)
    }
}

/// One entry of an application sub-chain.
///
/// As listed inside a freshly fetched [`EBlock`] the `content` is empty; the
/// payload arrives with the per-entry fetch.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Entry hash.
    pub hash: Bytes32,
    /// Entry timestamp in unix seconds.
    pub timestamp: u64,
    /// Entry payload. Empty until the entry itself has been fetched.
    pub content: Vec<u8>,
}

/// Per-application-chain block at a given directory height.
#[derive(Debug, Clone)]
pub struct EBlock {
    /// Chain this entry block belongs to.
    pub chain_id: Bytes32,
    /// KeyMR of this entry block.
    pub key_mr: Bytes32,
    /// Directory height this entry block was minted at.
    pub height: u32,
    /// Entries in block order.
    pub entries: Vec<Entry>,
}

/// The native-asset block inside a directory block.
///
/// Transactions are listed by ID only; payloads are fetched individually.
#[derive(Debug, Clone)]
pub struct FBlock {
    /// Directory height of this factoid block.
    pub height: u32,
    /// IDs of the factoid transactions in this block.
    pub transactions: Vec<Bytes32>,
}

/// One input or output of a factoid transaction.
#[derive(Debug, Clone)]
pub struct FactoidIo {
    /// Account the funds move from or to.
    pub address: Address,
    /// Amount in indivisible native units.
    pub amount: u64,
}

/// A native-asset transaction.
#[derive(Debug, Clone)]
pub struct FactoidTransaction {
    /// Transaction ID.
    pub id: Bytes32,
    /// Native-asset inputs.
    pub fct_inputs: Vec<FactoidIo>,
    /// Native-asset outputs.
    pub fct_outputs: Vec<FactoidIo>,
    /// Entry-credit outputs.
    pub ec_outputs: Vec<FactoidIo>,
}
