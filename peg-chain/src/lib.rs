#![warn(missing_docs)]

//! Primitives for the upstream directory chain.
//!
//! The sidechain ledger is derived entirely by replaying directory blocks
//! fetched from an upstream chain node. This crate holds the data types those
//! fetches return and the well-known identifiers the sidechain protocol is
//! anchored to: the oracle and transaction sub-chain IDs and the burn
//! sentinel address.
//!
//! No networking lives here; the client interface that produces these types
//! is defined by the sync engine.

pub mod block;
pub mod identifier;

pub use block::{DBlock, EBlock, EBlockRef, Entry, FBlock, FactoidIo, FactoidTransaction, Heights};
pub use identifier::{Address, Bytes32, IdParseError};

/// Chain ID of the price-oracle sub-chain.
///
/// `a642a8674f46696cc47fdb6b65f9c87b2a19c5ea8123b3d2f0c13b6f33a9d5ef`
pub const ORACLE_CHAIN: Bytes32 = Bytes32::new([
    0xa6, 0x42, 0xa8, 0x67, 0x4f, 0x46, 0x69, 0x6c, 0xc4, 0x7f, 0xdb, 0x6b, 0x65, 0xf9, 0xc8,
    0x7b, 0x2a, 0x19, 0xc5, 0xea, 0x81, 0x23, 0xb3, 0xd2, 0xf0, 0xc1, 0x3b, 0x6f, 0x33, 0xa9,
    0xd5, 0xef,
]);

/// Chain ID of the pegged-asset transaction sub-chain.
///
/// `cffce0f409ebba4ed236d49d89c70e4bd1f1367d86402a3363366683265a242d`
pub const TRANSACTION_CHAIN: Bytes32 = Bytes32::new([
    0xcf, 0xfc, 0xe0, 0xf4, 0x09, 0xeb, 0xba, 0x4e, 0xd2, 0x36, 0xd4, 0x9d, 0x89, 0xc7, 0x0e,
    0x4b, 0xd1, 0xf1, 0x36, 0x7d, 0x86, 0x40, 0x2a, 0x33, 0x63, 0x36, 0x66, 0x83, 0x26, 0x5a,
    0x24, 0x2d,
]);

/// Sentinel entry-credit address that native-asset burns pay to.
///
/// A factoid transaction is a cross-chain burn only if its single entry-credit
/// output pays this address an amount of zero.
///
/// `37399721298d77984585040ea61055377039a4c3f3e2cd48c46ff643d50fd64f`
pub const BURN_ADDRESS: Address = Address::new([
    0x37, 0x39, 0x97, 0x21, 0x29, 0x8d, 0x77, 0x98, 0x45, 0x85, 0x04, 0x0e, 0xa6, 0x10, 0x55,
    0x37, 0x70, 0x39, 0xa4, 0xc3, 0xf3, 0xe2, 0xcd, 0x48, 0xc4, 0x6f, 0xf6, 0x43, 0xd5, 0x0f,
    0xd6, 0x4f,
]);
