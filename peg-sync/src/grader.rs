//! Seam to the oracle grading module.
//!
//! Grading itself (proof-of-work scoring, signature checks, band filtering)
//! is a collaborator concern. The engine consumes the result: an ordered
//! winner list whose first entry's rate vector becomes the height's rate
//! epoch, and whose payouts mint PEG.

use peg_assets::RateVector;
use peg_chain::{Bytes32, EBlock};

/// Grades an oracle sub-chain block into winners.
pub trait OracleGrader {
    /// Errors produced while grading.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Grades the oracle block minted at `height`.
    ///
    /// `None` when the height has no oracle sub-chain block or nothing in it
    /// graded; a graded block with an empty winner list persists its
    /// artifacts but defines no rate epoch.
    fn grade(
        &self,
        height: u32,
        eblock: Option<&EBlock>,
    ) -> Result<Option<GradedOracleBlock>, Self::Error>;
}

/// One winning oracle submission.
#[derive(Debug, Clone)]
pub struct OracleWinner {
    /// Hash of the winning oracle entry.
    pub entry_hash: Bytes32,
    /// Reward address as declared in the submission. Parsed only at payout
    /// time; an unparseable declaration forfeits the reward.
    pub address: String,
    /// PEG reward in indivisible units.
    pub payout: u64,
    rates: RateVector,
}

impl OracleWinner {
    /// Constructs a winner record.
    #[must_use]
    pub fn new(entry_hash: Bytes32, address: String, payout: u64, rates: RateVector) -> Self {
        Self {
            entry_hash,
            address,
            payout,
            rates,
        }
    }

    /// Returns this submission's quoted rate per asset, in canonical order.
    #[must_use]
    pub fn ordered_asset_rates(&self) -> &RateVector {
        &self.rates
    }
}

/// The oracle results for one height: winners in grading order.
#[derive(Debug, Clone)]
pub struct GradedOracleBlock {
    winners: Vec<OracleWinner>,
}

impl GradedOracleBlock {
    /// Constructs a graded block from its ordered winners.
    #[must_use]
    pub fn new(winners: Vec<OracleWinner>) -> Self {
        Self { winners }
    }

    /// Returns the winners in grading order. The first winner's rates define
    /// the rate epoch.
    #[must_use]
    pub fn winners(&self) -> &[OracleWinner] {
        &self.winners
    }
}
