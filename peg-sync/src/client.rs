//! Interface to the upstream chain node.

use async_trait::async_trait;

use peg_chain::{Bytes32, DBlock, EBlock, Entry, FBlock, FactoidTransaction, Heights};

use crate::error::ServerError;

pub(crate) mod fetch;

/// Blocking fetch interface to the upstream chain node.
///
/// Implementations wrap whatever transport the node speaks; the engine only
/// assumes calls may fail transiently and may be issued concurrently (the
/// entry fetcher runs up to eight requests at once).
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Returns the upstream chain heights.
    async fn heights(&self) -> Result<Heights, ServerError>;

    /// Returns the directory block at `height`.
    async fn dblock(&self, height: u32) -> Result<DBlock, ServerError>;

    /// Returns the entry block with the given `key_mr`, entries listed by
    /// hash with empty payloads.
    async fn eblock(&self, key_mr: Bytes32) -> Result<EBlock, ServerError>;

    /// Returns the full entry with the given `hash`.
    async fn entry(&self, hash: Bytes32) -> Result<Entry, ServerError>;

    /// Returns the factoid block at `height`, transactions listed by ID.
    async fn fblock(&self, height: u32) -> Result<FBlock, ServerError>;

    /// Returns the full factoid transaction with the given `id`.
    async fn factoid_transaction(&self, id: Bytes32) -> Result<FactoidTransaction, ServerError>;
}
