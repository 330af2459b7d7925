// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The mutation engine: the issuance and transfer protocols.

use thiserror::Error;
use tracing::debug;

use super::UniverseState;
use crate::types::{
    AssetName, AssetSlot, Issuance, Ownership, Possession, PublicKey, SlotIndex, SlotKind, UnitOfMeasurement,
};

/// The slot indices claimed by a successful [`UniverseState::issue_asset`].
///
/// Slot addresses are stable for the rest of the epoch, so callers may
/// cache them until the compactor runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IssuanceReceipt {
    /// The index of the new issuance record.
    pub issuance_index: SlotIndex,
    /// The index of the issuer's ownership record.
    pub ownership_index: SlotIndex,
    /// The index of the issuer's possession record.
    pub possession_index: SlotIndex,
}

/// The slot indices credited by a successful
/// [`UniverseState::transfer_share_ownership_and_possession`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    /// The index of the destination's ownership record.
    pub destination_ownership_index: SlotIndex,
    /// The index of the destination's possession record.
    pub destination_possession_index: SlotIndex,
}

#[allow(missing_docs)]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IssueError {
    /// A probe visited every slot without finding a free one. Capacity
    /// is provisioned far above the maximum live population, so this is
    /// outside the supported envelope; slots claimed by the earlier
    /// probes of the same issuance are left in place.
    #[error("the asset table has no free slot left")]
    UniverseFull,
}

#[allow(missing_docs)]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransferError {
    #[error("cannot transfer {0} shares, the count must be positive")]
    NonPositiveShareCount(i64),
    #[error("slot {0} is not an ownership record")]
    SourceNotOwnership(SlotIndex),
    #[error("slot {0} is not a possession record")]
    SourceNotPossession(SlotIndex),
    #[error("possession slot {possession_index} is not backed by ownership slot {ownership_index}")]
    UnlinkedPossession {
        possession_index: SlotIndex,
        ownership_index: SlotIndex,
    },
    #[error("{available} shares owned, {requested} requested")]
    InsufficientOwnedShares { available: i64, requested: i64 },
    #[error("{available} shares possessed, {requested} requested")]
    InsufficientPossessedShares { available: i64, requested: i64 },
    /// See [`IssueError::UniverseFull`].
    #[error("the asset table has no free slot left")]
    UniverseFull,
}

impl UniverseState {
    /// Issues a new asset: claims an issuance slot, an ownership slot,
    /// and a possession slot with three back-to-back probes, crediting
    /// the full share count to the issuer.
    ///
    /// Whether `(issuer, name)` already has an issuance line is the
    /// caller's policy; duplicate lines coexist until the end-of-epoch
    /// compaction merges them.
    pub fn issue_asset(
        &mut self,
        issuer_public_key: PublicKey,
        name: AssetName,
        number_of_decimal_places: i8,
        unit_of_measurement: UnitOfMeasurement,
        number_of_shares: i64,
        managing_contract_index: u16,
    ) -> Result<IssuanceReceipt, IssueError> {
        let issuance_index = self.probe_empty(issuer_public_key.home_index(self.index_mask))?;
        *self.slot_mut(issuance_index) = Issuance::new(
            issuer_public_key,
            name,
            number_of_decimal_places,
            unit_of_measurement,
        )
        .into();

        // The possession records the ownership index, which records the
        // issuance index, so the probes must run in this order.
        let ownership_index = self.probe_empty(issuance_index.next(self.index_mask))?;
        *self.slot_mut(ownership_index) = Ownership::new(
            issuer_public_key,
            managing_contract_index,
            issuance_index,
            number_of_shares,
        )
        .into();

        let possession_index = self.probe_empty(ownership_index.next(self.index_mask))?;
        *self.slot_mut(possession_index) = Possession::new(
            issuer_public_key,
            managing_contract_index,
            ownership_index,
            number_of_shares,
        )
        .into();

        self.mark_dirty(issuance_index);
        self.mark_dirty(ownership_index);
        self.mark_dirty(possession_index);

        debug!(issuer = %issuer_public_key, %name, number_of_shares, "asset issued");

        Ok(IssuanceReceipt {
            issuance_index,
            ownership_index,
            possession_index,
        })
    }

    /// Moves `number_of_shares` from the source ownership and possession
    /// records to the destination key, merging into the destination's
    /// existing line when one matches and claiming empty slots otherwise.
    ///
    /// All preconditions are checked before the first write, so a failed
    /// transfer leaves the table unchanged. Source slots may be drained
    /// to zero shares; they stay in place until the compactor collects
    /// them.
    pub fn transfer_share_ownership_and_possession(
        &mut self,
        source_ownership_index: SlotIndex,
        source_possession_index: SlotIndex,
        destination_public_key: PublicKey,
        number_of_shares: i64,
    ) -> Result<TransferReceipt, TransferError> {
        if number_of_shares <= 0 {
            return Err(TransferError::NonPositiveShareCount(number_of_shares));
        }

        let source_ownership_index = SlotIndex(source_ownership_index.0 & self.index_mask);
        let source_possession_index = SlotIndex(source_possession_index.0 & self.index_mask);

        let source_ownership_slot = *self.slot(source_ownership_index);
        if source_ownership_slot.kind() != SlotKind::Ownership {
            return Err(TransferError::SourceNotOwnership(source_ownership_index));
        }
        let source_ownership = source_ownership_slot.ownership();
        if source_ownership.number_of_shares < number_of_shares {
            return Err(TransferError::InsufficientOwnedShares {
                available: source_ownership.number_of_shares,
                requested: number_of_shares,
            });
        }

        let source_possession_slot = *self.slot(source_possession_index);
        if source_possession_slot.kind() != SlotKind::Possession {
            return Err(TransferError::SourceNotPossession(source_possession_index));
        }
        let source_possession = source_possession_slot.possession();
        if source_possession.number_of_shares < number_of_shares {
            return Err(TransferError::InsufficientPossessedShares {
                available: source_possession.number_of_shares,
                requested: number_of_shares,
            });
        }
        if source_possession.ownership_index != source_ownership_index {
            return Err(TransferError::UnlinkedPossession {
                possession_index: source_possession_index,
                ownership_index: source_ownership_index,
            });
        }

        let destination_ownership_index = self.probe_destination(destination_public_key, |slot| {
            if slot.kind() != SlotKind::Ownership {
                return false;
            }
            let ownership = slot.ownership();
            ownership.managing_contract_index == source_ownership.managing_contract_index
                && ownership.issuance_index == source_ownership.issuance_index
                && ownership.public_key == destination_public_key
        })?;
        {
            let slot = self.slot_mut(destination_ownership_index);
            if slot.is_empty() {
                *slot = Ownership::new(
                    destination_public_key,
                    source_ownership.managing_contract_index,
                    source_ownership.issuance_index,
                    0,
                )
                .into();
            }
            let mut destination = slot.ownership();
            destination.number_of_shares += number_of_shares;
            *slot = destination.into();
        }
        {
            // Read back rather than reuse the precondition view: the
            // destination may be the same slot.
            let slot = self.slot_mut(source_ownership_index);
            let mut source = slot.ownership();
            source.number_of_shares -= number_of_shares;
            *slot = source.into();
        }

        let destination_possession_index = self.probe_destination(destination_public_key, |slot| {
            if slot.kind() != SlotKind::Possession {
                return false;
            }
            let possession = slot.possession();
            possession.managing_contract_index == source_possession.managing_contract_index
                && possession.ownership_index == destination_ownership_index
                && possession.public_key == destination_public_key
        })?;
        {
            let slot = self.slot_mut(destination_possession_index);
            if slot.is_empty() {
                *slot = Possession::new(
                    destination_public_key,
                    source_possession.managing_contract_index,
                    destination_ownership_index,
                    0,
                )
                .into();
            }
            let mut destination = slot.possession();
            destination.number_of_shares += number_of_shares;
            *slot = destination.into();
        }
        {
            let slot = self.slot_mut(source_possession_index);
            let mut source = slot.possession();
            source.number_of_shares -= number_of_shares;
            *slot = source.into();
        }

        self.mark_dirty(source_ownership_index);
        self.mark_dirty(source_possession_index);
        self.mark_dirty(destination_ownership_index);
        self.mark_dirty(destination_possession_index);

        let issuance = self.slot(source_ownership.issuance_index).issuance();
        debug!(
            issuer = %issuance.public_key,
            name = %issuance.name,
            source = %source_ownership.public_key,
            destination = %destination_public_key,
            number_of_shares,
            "share ownership transferred"
        );
        debug!(
            issuer = %issuance.public_key,
            name = %issuance.name,
            source = %source_possession.public_key,
            destination = %destination_public_key,
            number_of_shares,
            "share possession transferred"
        );

        Ok(TransferReceipt {
            destination_ownership_index,
            destination_possession_index,
        })
    }

    /// The first empty slot at or after `start`, walking forward with
    /// wraparound.
    fn probe_empty(&self, start: SlotIndex) -> Result<SlotIndex, IssueError> {
        let mut index = start;
        for _ in 0..self.capacity {
            if self.slot(index).is_empty() {
                return Ok(index);
            }
            index = index.next(self.index_mask);
        }
        Err(IssueError::UniverseFull)
    }

    /// The first slot from the destination's home index that is empty or
    /// accepted as the destination's existing line.
    fn probe_destination(
        &self,
        destination_public_key: PublicKey,
        accept: impl Fn(&AssetSlot) -> bool,
    ) -> Result<SlotIndex, TransferError> {
        let mut index = destination_public_key.home_index(self.index_mask);
        for _ in 0..self.capacity {
            let slot = self.slot(index);
            if slot.is_empty() || accept(slot) {
                return Ok(index);
            }
            index = index.next(self.index_mask);
        }
        Err(TransferError::UniverseFull)
    }
}
