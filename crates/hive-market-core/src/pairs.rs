use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::Asset;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PairError {
    #[error("asset {0} cannot pair with itself")]
    SelfPair(Asset),
    #[error("asset {0} has no counter-assets")]
    NoCounterAssets(Asset),
    #[error("{to} is not an allowed counter-asset of {from}")]
    NotAllowed { from: Asset, to: Asset },
}

/// Allowed-pairs table: for each asset, the ordered counter-assets it may be
/// exchanged against. The first entry is the default counter-asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairTable {
    pairs: BTreeMap<Asset, Vec<Asset>>,
}

impl Default for PairTable {
    fn default() -> Self {
        let mut pairs = BTreeMap::new();
        pairs.insert(Asset::Hive, vec![Asset::Hbd]);
        pairs.insert(Asset::Hbd, vec![Asset::Hive]);
        Self { pairs }
    }
}

impl PairTable {
    pub fn new(entries: impl IntoIterator<Item = (Asset, Vec<Asset>)>) -> Result<Self, PairError> {
        let mut pairs = BTreeMap::new();
        for (asset, counters) in entries {
            if counters.contains(&asset) {
                return Err(PairError::SelfPair(asset));
            }
            if counters.is_empty() {
                return Err(PairError::NoCounterAssets(asset));
            }
            pairs.insert(asset, counters);
        }
        Ok(Self { pairs })
    }

    pub fn allowed(&self, asset: Asset) -> &[Asset] {
        self.pairs.get(&asset).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_allowed(&self, from: Asset, to: Asset) -> bool {
        self.allowed(from).contains(&to)
    }

    pub fn default_counter(&self, asset: Asset) -> Result<Asset, PairError> {
        self.allowed(asset)
            .first()
            .copied()
            .ok_or(PairError::NoCounterAssets(asset))
    }

    pub fn ensure_allowed(&self, from: Asset, to: Asset) -> Result<(), PairError> {
        if self.is_allowed(from, to) {
            Ok(())
        } else {
            Err(PairError::NotAllowed { from, to })
        }
    }
}
