//! Custody port: the asset's own ledger (an ERC-721 contract on the source
//! chain). The bridge takes custody on lock and hands it back on unlock.

use std::collections::HashMap;

use alloy_primitives::Address;

use crate::types::AssetRef;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustodyError {
    #[error("asset {0} does not exist")]
    UnknownAsset(AssetRef),

    #[error("{from} is not the owner of {asset} (owner is {owner})")]
    NotOwner {
        asset: AssetRef,
        from: Address,
        owner: Address,
    },

    #[error("custody ledger unavailable: {0}")]
    Unavailable(String),
}

/// Ownership moves on the asset's home ledger.
pub trait Custody {
    fn owner_of(&self, asset: &AssetRef) -> Option<Address>;

    /// Move `asset` from `from` to `to`. Must either complete or leave
    /// ownership unchanged.
    fn transfer(&mut self, asset: &AssetRef, from: Address, to: Address)
        -> Result<(), CustodyError>;
}

/// In-memory ownership table standing in for the collection contracts.
#[derive(Clone, Debug, Default)]
pub struct NftRegistry {
    owners: HashMap<AssetRef, Address>,
}

impl NftRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `asset` owned by `owner`, replacing any previous owner.
    pub fn mint(&mut self, asset: AssetRef, owner: Address) {
        self.owners.insert(asset, owner);
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl Custody for NftRegistry {
    fn owner_of(&self, asset: &AssetRef) -> Option<Address> {
        self.owners.get(asset).copied()
    }

    fn transfer(
        &mut self,
        asset: &AssetRef,
        from: Address,
        to: Address,
    ) -> Result<(), CustodyError> {
        let owner = self
            .owners
            .get_mut(asset)
            .ok_or(CustodyError::UnknownAsset(*asset))?;
        if *owner != from {
            return Err(CustodyError::NotOwner {
                asset: *asset,
                from,
                owner: *owner,
            });
        }
        *owner = to;
        Ok(())
    }
}
