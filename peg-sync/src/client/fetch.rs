//! Bounded parallel fetching of entry payloads.

use futures::StreamExt;

use peg_chain::{Bytes32, EBlock};

use crate::client::ChainClient;
use crate::error::ServerError;

/// Concurrent payload fetches per entry block.
pub const ENTRY_FETCH_WORKERS: usize = 8;

/// Populates the payload of every entry in `eblock`, preserving positional
/// identity.
///
/// One pass, no internal retry: the first fetch error fails the whole call
/// and abandons the in-flight fetches, leaving the partially populated block
/// unobservable by later stages.
pub(crate) async fn fetch_entry_payloads<C>(
    client: &C,
    eblock: &mut EBlock,
) -> Result<(), ServerError>
where
    C: ChainClient + ?Sized,
{
    let hashes: Vec<Bytes32> = eblock.entries.iter().map(|entry| entry.hash).collect();
    let mut fetches = futures::stream::iter(hashes.into_iter().enumerate())
        .map(|(index, hash)| async move { (index, client.entry(hash).await) })
        .buffer_unordered(ENTRY_FETCH_WORKERS);

    while let Some((index, fetched)) = fetches.next().await {
        eblock.entries[index] = fetched?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use peg_chain::{DBlock, Entry, FBlock, FactoidTransaction, Heights, TRANSACTION_CHAIN};

    use super::*;

    /// Serves entries whose latency is inverted relative to their position,
    /// so completion order is the reverse of request order.
    struct InvertedLatencyClient {
        entry_count: u64,
        fail_at: Option<u64>,
    }

    fn hash_for(index: u64) -> Bytes32 {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&index.to_be_bytes());
        Bytes32::new(bytes)
    }

    #[async_trait]
    impl ChainClient for InvertedLatencyClient {
        async fn heights(&self) -> Result<Heights, ServerError> {
            unimplemented!()
        }

        async fn dblock(&self, _height: u32) -> Result<DBlock, ServerError> {
            unimplemented!()
        }

        async fn eblock(&self, _key_mr: Bytes32) -> Result<EBlock, ServerError> {
            unimplemented!()
        }

        async fn entry(&self, hash: Bytes32) -> Result<Entry, ServerError> {
            let mut index_bytes = [0u8; 8];
            index_bytes.copy_from_slice(&hash.as_bytes()[24..]);
            let index = u64::from_be_bytes(index_bytes);

            tokio::time::sleep(Duration::from_millis(2 * (self.entry_count - index))).await;
            if self.fail_at == Some(index) {
                return Err(ServerError::EntryNotFound(hash));
            }

            Ok(Entry {
                hash,
                timestamp: index,
                content: index.to_be_bytes().to_vec(),
            })
        }

        async fn fblock(&self, _height: u32) -> Result<FBlock, ServerError> {
            unimplemented!()
        }

        async fn factoid_transaction(
            &self,
            _id: Bytes32,
        ) -> Result<FactoidTransaction, ServerError> {
            unimplemented!()
        }
    }

    fn unfetched_eblock(entry_count: u64) -> EBlock {
        EBlock {
            chain_id: TRANSACTION_CHAIN,
            key_mr: Bytes32::new([7; 32]),
            height: 1,
            entries: (0..entry_count)
                .map(|index| Entry {
                    hash: hash_for(index),
                    timestamp: 0,
                    content: Vec::new(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn preserves_positional_order() {
        let client = InvertedLatencyClient {
            entry_count: 20,
            fail_at: None,
        };
        let mut eblock = unfetched_eblock(20);

        fetch_entry_payloads(&client, &mut eblock).await.unwrap();

        for (index, entry) in eblock.entries.iter().enumerate() {
            assert_eq!(entry.hash, hash_for(index as u64));
            assert_eq!(entry.content, (index as u64).to_be_bytes().to_vec());
        }
    }

    #[tokio::test]
    async fn first_error_fails_the_call() {
        let client = InvertedLatencyClient {
            entry_count: 20,
            fail_at: Some(13),
        };
        let mut eblock = unfetched_eblock(20);

        assert!(matches!(
            fetch_entry_payloads(&client, &mut eblock).await,
            Err(ServerError::EntryNotFound(_))
        ));
    }
}
