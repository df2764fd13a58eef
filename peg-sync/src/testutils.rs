//! In-memory collaborators for exercising the sync engine.
//!
//! Nothing here is a production implementation: [`MemoryLedger`] keeps the
//! whole ledger in maps with copy-on-begin transactions, [`MockChain`] serves
//! a scripted upstream chain that tests mutate as they go, and
//! [`StaticGrader`] replays pre-configured winners.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use peg_assets::{PegTicker, RateVector, TransactionBatch};
use peg_chain::{
    Address, Bytes32, DBlock, EBlock, EBlockRef, Entry, FBlock, FactoidIo, FactoidTransaction,
    Heights, ORACLE_CHAIN, TRANSACTION_CHAIN,
};

use crate::client::ChainClient;
use crate::error::ServerError;
use crate::grader::{GradedOracleBlock, OracleGrader};
use crate::ledger::traits::{LedgerStore, LedgerTransaction};
use crate::ledger::{HeldBatch, InsufficientBalance, SyncCursor};

/// Current wall-clock time in unix seconds, for stamping test entries inside
/// the batch validity window.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the unix epoch")
        .as_secs()
}

/// Builds a fetched entry.
#[must_use]
pub fn entry(hash: Bytes32, timestamp: u64, content: Vec<u8>) -> Entry {
    Entry {
        hash,
        timestamp,
        content,
    }
}

/// Builds a rate vector from ticker/rate pairs.
#[must_use]
pub fn rate_vector(pairs: &[(PegTicker, u64)]) -> RateVector {
    pairs.iter().copied().collect()
}

/// One audit row recorded by [`MemoryLedger`].
#[derive(Debug, Clone)]
pub struct TransactionRelation {
    /// Address row ID the relation points at.
    pub address_id: i64,
    /// Hash of the related batch.
    pub batch_hash: Bytes32,
    /// Index of the transaction within the batch.
    pub tx_index: u64,
    /// Whether the address is on the output side.
    pub is_output: bool,
    /// Whether the related transaction is a conversion.
    pub is_conversion: bool,
}

#[derive(Debug, Default, Clone)]
struct LedgerState {
    synced: Option<SyncCursor>,
    balances: BTreeMap<(Address, PegTicker), u64>,
    rates: BTreeMap<u32, RateVector>,
    holding: BTreeMap<u32, Vec<HeldBatch>>,
    relations: Vec<TransactionRelation>,
    applied: HashSet<Bytes32>,
    graded_blocks: Vec<(Bytes32, usize)>,
    address_ids: BTreeMap<Address, i64>,
}

impl LedgerState {
    fn address_id(&mut self, address: &Address) -> i64 {
        if let Some(id) = self.address_ids.get(address) {
            return *id;
        }
        let id = self.address_ids.len() as i64 + 1;
        self.address_ids.insert(*address, id);
        id
    }
}

/// In-memory ledger store with copy-on-begin transactions.
///
/// A begun transaction works on a clone of the state; commit swaps the clone
/// in, dropping it discards every mutation.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: LedgerState,
}

impl MemoryLedger {
    /// Constructs an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the committed balance of `(address, ticker)`.
    #[must_use]
    pub fn balance(&self, address: &Address, ticker: PegTicker) -> u64 {
        self.state
            .balances
            .get(&(*address, ticker))
            .copied()
            .unwrap_or(0)
    }

    /// Returns every committed balance.
    #[must_use]
    pub fn balances(&self) -> &BTreeMap<(Address, PegTicker), u64> {
        &self.state.balances
    }

    /// Returns the committed synced height, or `None` for a fresh store.
    #[must_use]
    pub fn synced_height(&self) -> Option<u32> {
        self.state.synced.map(|cursor| cursor.synced_height)
    }

    /// Returns the committed audit rows in insertion order.
    #[must_use]
    pub fn relations(&self) -> &[TransactionRelation] {
        &self.state.relations
    }

    /// Whether `batch_hash` carries a committed replay mark.
    #[must_use]
    pub fn is_applied(&self, batch_hash: &Bytes32) -> bool {
        self.state.applied.contains(batch_hash)
    }

    /// Number of batches committed into holding, across all entry heights.
    #[must_use]
    pub fn holding_count(&self) -> usize {
        self.state.holding.values().map(Vec::len).sum()
    }

    /// Returns the committed rate epoch defined at `height`, if any.
    #[must_use]
    pub fn rates_at(&self, height: u32) -> Option<&RateVector> {
        self.state.rates.get(&height)
    }

    /// Number of graded oracle blocks committed.
    #[must_use]
    pub fn graded_block_count(&self) -> usize {
        self.state.graded_blocks.len()
    }

    /// Seeds a committed balance directly, bypassing the engine.
    pub fn credit(&mut self, address: &Address, ticker: PegTicker, amount: u64) {
        *self.state.balances.entry((*address, ticker)).or_insert(0) += amount;
    }
}

impl LedgerStore for MemoryLedger {
    type Error = Infallible;
    type Transaction<'a>
        = MemoryLedgerTransaction<'a>
    where
        Self: 'a;

    fn begin(&mut self) -> Result<MemoryLedgerTransaction<'_>, Infallible> {
        let state = self.state.clone();
        Ok(MemoryLedgerTransaction {
            ledger: self,
            state,
        })
    }

    fn synced_cursor(&self) -> Result<Option<SyncCursor>, Infallible> {
        Ok(self.state.synced)
    }
}

/// A [`MemoryLedger`] transaction: a working copy of the whole state.
#[derive(Debug)]
pub struct MemoryLedgerTransaction<'a> {
    ledger: &'a mut MemoryLedger,
    state: LedgerState,
}

impl LedgerTransaction for MemoryLedgerTransaction<'_> {
    type Error = Infallible;

    fn commit(self) -> Result<(), Infallible> {
        self.ledger.state = self.state;
        Ok(())
    }

    fn rollback(self) -> Result<(), Infallible> {
        Ok(())
    }

    fn insert_synced(&mut self, cursor: SyncCursor) -> Result<(), Infallible> {
        self.state.synced = Some(cursor);
        Ok(())
    }

    fn insert_graded_block(
        &mut self,
        eblock: &EBlock,
        graded: &GradedOracleBlock,
    ) -> Result<(), Infallible> {
        self.state
            .graded_blocks
            .push((eblock.key_mr, graded.winners().len()));
        Ok(())
    }

    fn insert_rates(&mut self, height: u32, rates: &RateVector) -> Result<(), Infallible> {
        self.state.rates.insert(height, rates.clone());
        Ok(())
    }

    fn most_recent_rates_before(
        &mut self,
        height: u32,
    ) -> Result<Option<(RateVector, u32)>, Infallible> {
        Ok(self
            .state
            .rates
            .range(..height)
            .next_back()
            .map(|(epoch_height, rates)| (rates.clone(), *epoch_height)))
    }

    fn pending_rates(&mut self, height: u32) -> Result<Option<RateVector>, Infallible> {
        Ok(self
            .state
            .rates
            .range(..=height)
            .next_back()
            .map(|(_, rates)| rates.clone()))
    }

    fn batches_in_holding_at(&mut self, height: u32) -> Result<Vec<HeldBatch>, Infallible> {
        Ok(self.state.holding.get(&height).cloned().unwrap_or_default())
    }

    fn insert_batch_holding(
        &mut self,
        batch: &TransactionBatch,
        entered_height: u32,
        source_key_mr: Bytes32,
    ) -> Result<i64, Infallible> {
        self.state
            .holding
            .entry(entered_height)
            .or_default()
            .push(HeldBatch {
                batch: batch.clone(),
                entered_height,
                source_key_mr,
            });
        let row_id = self.state.holding.values().map(Vec::len).sum::<usize>() as i64;
        Ok(row_id)
    }

    fn is_replay_transaction(&mut self, batch_hash: &Bytes32) -> Result<bool, Infallible> {
        Ok(self.state.applied.contains(batch_hash))
    }

    fn sub_from_balance(
        &mut self,
        address: &Address,
        ticker: PegTicker,
        amount: u64,
    ) -> Result<Result<i64, InsufficientBalance>, Infallible> {
        let balance = self
            .state
            .balances
            .get(&(*address, ticker))
            .copied()
            .unwrap_or(0);
        if balance < amount {
            return Ok(Err(InsufficientBalance));
        }
        self.state.balances.insert((*address, ticker), balance - amount);
        Ok(Ok(self.state.address_id(address)))
    }

    fn add_to_balance(
        &mut self,
        address: &Address,
        ticker: PegTicker,
        amount: u64,
    ) -> Result<i64, Infallible> {
        *self.state.balances.entry((*address, ticker)).or_insert(0) += amount;
        Ok(self.state.address_id(address))
    }

    fn insert_transaction_relation(
        &mut self,
        address_id: i64,
        batch_hash: &Bytes32,
        tx_index: u64,
        is_output: bool,
        is_conversion: bool,
    ) -> Result<(), Infallible> {
        self.state.relations.push(TransactionRelation {
            address_id,
            batch_hash: *batch_hash,
            tx_index,
            is_output,
            is_conversion,
        });
        self.state.applied.insert(*batch_hash);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ChainData {
    tip: u32,
    dblocks: BTreeMap<u32, DBlock>,
    eblocks: HashMap<Bytes32, EBlock>,
    entries: HashMap<Bytes32, Entry>,
    fblocks: BTreeMap<u32, FBlock>,
    factoid_transactions: HashMap<Bytes32, FactoidTransaction>,
}

/// A scripted upstream chain.
///
/// Interior-mutable so tests can extend the chain, or shrink the reported
/// tip, while the engine runs against it.
#[derive(Debug, Default)]
pub struct MockChain {
    data: Mutex<ChainData>,
}

fn derived_key_mr(tag: u8, height: u32) -> Bytes32 {
    let mut bytes = [0u8; 32];
    bytes[0] = tag;
    bytes[28..].copy_from_slice(&height.to_be_bytes());
    Bytes32::new(bytes)
}

impl MockChain {
    /// Constructs an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty directory block (with its factoid block) at `height`
    /// and raises the tip to cover it. Idempotent.
    pub fn add_block(&self, height: u32) {
        let mut data = self.data.lock().expect("mock chain lock");
        Self::ensure_block(&mut data, height);
    }

    /// Reports `height` as the tip regardless of the blocks present, for
    /// exercising upstream reboots onto a shorter chain.
    pub fn set_tip(&self, height: u32) {
        self.data.lock().expect("mock chain lock").tip = height;
    }

    /// Removes the factoid block at `height`, making the height unsyncable.
    pub fn remove_fblock(&self, height: u32) {
        self.data
            .lock()
            .expect("mock chain lock")
            .fblocks
            .remove(&height);
    }

    /// Restores an empty factoid block at `height`.
    pub fn ensure_fblock(&self, height: u32) {
        self.data
            .lock()
            .expect("mock chain lock")
            .fblocks
            .entry(height)
            .or_insert(FBlock {
                height,
                transactions: Vec::new(),
            });
    }

    /// Appends `entry` to the transaction sub-chain block at `height`.
    pub fn add_transaction_entry(&self, height: u32, entry: Entry) {
        self.add_entry(TRANSACTION_CHAIN, 0x1b, height, entry);
    }

    /// Appends `entry` to the oracle sub-chain block at `height`.
    pub fn add_oracle_entry(&self, height: u32, entry: Entry) {
        self.add_entry(ORACLE_CHAIN, 0x0a, height, entry);
    }

    /// Appends a factoid transaction to the factoid block at `height`.
    pub fn add_factoid_transaction(&self, height: u32, transaction: FactoidTransaction) {
        let mut data = self.data.lock().expect("mock chain lock");
        Self::ensure_block(&mut data, height);
        data.fblocks
            .get_mut(&height)
            .expect("factoid block exists")
            .transactions
            .push(transaction.id);
        data.factoid_transactions
            .insert(transaction.id, transaction);
    }

    /// Appends a well-formed cross-chain burn of `amount` from `address` at
    /// `height`.
    pub fn add_burn(&self, height: u32, address: Address, amount: u64) {
        let id = {
            let data = self.data.lock().expect("mock chain lock");
            let count = data
                .fblocks
                .get(&height)
                .map_or(0, |fblock| fblock.transactions.len());
            let mut bytes = [0u8; 32];
            bytes[0] = 0xfb;
            bytes[24..28].copy_from_slice(&height.to_be_bytes());
            bytes[28..].copy_from_slice(&(count as u32).to_be_bytes());
            Bytes32::new(bytes)
        };
        self.add_factoid_transaction(
            height,
            FactoidTransaction {
                id,
                fct_inputs: vec![FactoidIo { address, amount }],
                fct_outputs: Vec::new(),
                ec_outputs: vec![FactoidIo {
                    address: peg_chain::BURN_ADDRESS,
                    amount: 0,
                }],
            },
        );
    }

    fn ensure_block(data: &mut ChainData, height: u32) {
        data.dblocks.entry(height).or_insert(DBlock {
            height,
            key_mr: derived_key_mr(0xdb, height),
            eblocks: Vec::new(),
        });
        data.fblocks.entry(height).or_insert(FBlock {
            height,
            transactions: Vec::new(),
        });
        data.tip = data.tip.max(height);
    }

    fn add_entry(&self, chain_id: Bytes32, tag: u8, height: u32, entry: Entry) {
        let mut data = self.data.lock().expect("mock chain lock");
        Self::ensure_block(&mut data, height);

        let key_mr = derived_key_mr(tag, height);
        let dblock = data.dblocks.get_mut(&height).expect("directory block exists");
        if dblock.eblock(chain_id).is_none() {
            dblock.eblocks.push(EBlockRef { chain_id, key_mr });
        }

        let eblock = data.eblocks.entry(key_mr).or_insert(EBlock {
            chain_id,
            key_mr,
            height,
            entries: Vec::new(),
        });
        // The listing carries hash and timestamp only; the payload is served
        // by the per-entry fetch.
        eblock.entries.push(Entry {
            hash: entry.hash,
            timestamp: entry.timestamp,
            content: Vec::new(),
        });
        data.entries.insert(entry.hash, entry);
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn heights(&self) -> Result<Heights, ServerError> {
        let data = self.data.lock().expect("mock chain lock");
        Ok(Heights {
            directory_block: data.tip,
        })
    }

    async fn dblock(&self, height: u32) -> Result<DBlock, ServerError> {
        self.data
            .lock()
            .expect("mock chain lock")
            .dblocks
            .get(&height)
            .cloned()
            .ok_or(ServerError::DBlockNotFound(height))
    }

    async fn eblock(&self, key_mr: Bytes32) -> Result<EBlock, ServerError> {
        self.data
            .lock()
            .expect("mock chain lock")
            .eblocks
            .get(&key_mr)
            .cloned()
            .ok_or(ServerError::EBlockNotFound(key_mr))
    }

    async fn entry(&self, hash: Bytes32) -> Result<Entry, ServerError> {
        self.data
            .lock()
            .expect("mock chain lock")
            .entries
            .get(&hash)
            .cloned()
            .ok_or(ServerError::EntryNotFound(hash))
    }

    async fn fblock(&self, height: u32) -> Result<FBlock, ServerError> {
        self.data
            .lock()
            .expect("mock chain lock")
            .fblocks
            .get(&height)
            .cloned()
            .ok_or(ServerError::FBlockNotFound(height))
    }

    async fn factoid_transaction(&self, id: Bytes32) -> Result<FactoidTransaction, ServerError> {
        self.data
            .lock()
            .expect("mock chain lock")
            .factoid_transactions
            .get(&id)
            .cloned()
            .ok_or(ServerError::FactoidTransactionNotFound(id))
    }
}

/// Grader that replays pre-configured winners per height.
///
/// Heights with an oracle block but no configured winners grade into an
/// empty graded block: artifacts persist, no rate epoch is defined.
#[derive(Debug, Default)]
pub struct StaticGrader {
    graded: HashMap<u32, GradedOracleBlock>,
}

impl StaticGrader {
    /// Constructs a grader with no winners anywhere.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the winners graded at `height`.
    pub fn set_winners(&mut self, height: u32, graded: GradedOracleBlock) {
        self.graded.insert(height, graded);
    }
}

impl OracleGrader for StaticGrader {
    type Error = Infallible;

    fn grade(
        &self,
        height: u32,
        eblock: Option<&EBlock>,
    ) -> Result<Option<GradedOracleBlock>, Infallible> {
        if eblock.is_none() {
            return Ok(None);
        }
        Ok(Some(
            self.graded
                .get(&height)
                .cloned()
                .unwrap_or_else(|| GradedOracleBlock::new(Vec::new())),
        ))
    }
}
