//! The fixed pegged-asset ticker set.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A price vector: quoted rate per ticker, in indivisible units.
///
/// Ordered map so iteration order is deterministic across replays.
pub type RateVector = BTreeMap<PegTicker, u64>;

/// An asset tracked by the sidechain ledger.
///
/// The set is fixed at build time; there is no dynamic registration. `PEG` is
/// the reward asset minted to oracle winners, `pFCT` is minted by native-asset
/// burns, and the remainder are pegged fiats, commodities and cryptos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PegTicker {
    /// Reward asset minted to oracle winners.
    #[serde(rename = "PEG")]
    Peg,
    /// Pegged native asset, minted by burns.
    #[serde(rename = "pFCT")]
    PFct,
    /// Pegged US dollar.
    #[serde(rename = "pUSD")]
    PUsd,
    /// Pegged euro.
    #[serde(rename = "pEUR")]
    PEur,
    /// Pegged Japanese yen.
    #[serde(rename = "pJPY")]
    PJpy,
    /// Pegged pound sterling.
    #[serde(rename = "pGBP")]
    PGbp,
    /// Pegged Canadian dollar.
    #[serde(rename = "pCAD")]
    PCad,
    /// Pegged Swiss franc.
    #[serde(rename = "pCHF")]
    PChf,
    /// Pegged Indian rupee.
    #[serde(rename = "pINR")]
    PInr,
    /// Pegged Singapore dollar.
    #[serde(rename = "pSGD")]
    PSgd,
    /// Pegged Hong Kong dollar.
    #[serde(rename = "pHKD")]
    PHkd,
    /// Pegged South Korean won.
    #[serde(rename = "pKRW")]
    PKrw,
    /// Pegged Brazilian real.
    #[serde(rename = "pBRL")]
    PBrl,
    /// Pegged Philippine peso.
    #[serde(rename = "pPHP")]
    PPhp,
    /// Pegged Mexican peso.
    #[serde(rename = "pMXN")]
    PMxn,
    /// Pegged gold (troy ounce).
    #[serde(rename = "pXAU")]
    PXau,
    /// Pegged silver (troy ounce).
    #[serde(rename = "pXAG")]
    PXag,
    /// Pegged bitcoin.
    #[serde(rename = "pXBT")]
    PXbt,
    /// Pegged ether.
    #[serde(rename = "pETH")]
    PEth,
    /// Pegged litecoin.
    #[serde(rename = "pLTC")]
    PLtc,
    /// Pegged ravencoin.
    #[serde(rename = "pRVN")]
    PRvn,
    /// Pegged bitcoin cash.
    #[serde(rename = "pXBC")]
    PXbc,
    /// Pegged dash.
    #[serde(rename = "pDASH")]
    PDash,
    /// Pegged zcash.
    #[serde(rename = "pZEC")]
    PZec,
    /// Pegged decred.
    #[serde(rename = "pDCR")]
    PDcr,
}

impl PegTicker {
    /// Every ticker, in the canonical protocol order.
    pub const ALL: [PegTicker; 25] = [
        PegTicker::Peg,
        PegTicker::PFct,
        PegTicker::PUsd,
        PegTicker::PEur,
        PegTicker::PJpy,
        PegTicker::PGbp,
        PegTicker::PCad,
        PegTicker::PChf,
        PegTicker::PInr,
        PegTicker::PSgd,
        PegTicker::PHkd,
        PegTicker::PKrw,
        PegTicker::PBrl,
        PegTicker::PPhp,
        PegTicker::PMxn,
        PegTicker::PXau,
        PegTicker::PXag,
        PegTicker::PXbt,
        PegTicker::PEth,
        PegTicker::PLtc,
        PegTicker::PRvn,
        PegTicker::PXbc,
        PegTicker::PDash,
        PegTicker::PZec,
        PegTicker::PDcr,
    ];

    /// Returns the wire name of this ticker.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PegTicker::Peg => "PEG",
            PegTicker::PFct => "pFCT",
            PegTicker::PUsd => "pUSD",
            PegTicker::PEur => "pEUR",
            PegTicker::PJpy => "pJPY",
            PegTicker::PGbp => "pGBP",
            PegTicker::PCad => "pCAD",
            PegTicker::PChf => "pCHF",
            PegTicker::PInr => "pINR",
            PegTicker::PSgd => "pSGD",
            PegTicker::PHkd => "pHKD",
            PegTicker::PKrw => "pKRW",
            PegTicker::PBrl => "pBRL",
            PegTicker::PPhp => "pPHP",
            PegTicker::PMxn => "pMXN",
            PegTicker::PXau => "pXAU",
            PegTicker::PXag => "pXAG",
            PegTicker::PXbt => "pXBT",
            PegTicker::PEth => "pETH",
            PegTicker::PLtc => "pLTC",
            PegTicker::PRvn => "pRVN",
            PegTicker::PXbc => "pXBC",
            PegTicker::PDash => "pDASH",
            PegTicker::PZec => "pZEC",
            PegTicker::PDcr => "pDCR",
        }
    }
}

impl fmt::Display for PegTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error parsing an unknown ticker name.
#[derive(Debug, thiserror::Error)]
#[error("unknown ticker. {0}")]
pub struct UnknownTicker(pub String);

impl FromStr for PegTicker {
    type Err = UnknownTicker;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PegTicker::ALL
            .iter()
            .find(|ticker| ticker.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownTicker(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for ticker in PegTicker::ALL {
            assert_eq!(ticker.as_str().parse::<PegTicker>().unwrap(), ticker);

            let json = serde_json::to_string(&ticker).unwrap();
            assert_eq!(json, format!("\"{ticker}\""));
            assert_eq!(serde_json::from_str::<PegTicker>(&json).unwrap(), ticker);
        }
    }

    #[test]
    fn unknown_ticker_rejected() {
        assert!("pDOGE".parse::<PegTicker>().is_err());
        assert!(serde_json::from_str::<PegTicker>("\"pDOGE\"").is_err());
    }
}
