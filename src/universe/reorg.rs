// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The end-of-epoch compactor.
//!
//! During an epoch, transfers split ownership and possession lines
//! across slots wherever probes hit collisions, and duplicate issuances
//! of the same `(issuer, name)` may coexist. The compactor walks the
//! live possession records, rebuilds every referenced line into a
//! zero-initialized scratch table, and copies the result back, leaving
//! one slot per logical identity and no drained records.

use tracing::debug;

use super::UniverseState;
use crate::types::{AssetSlot, Ownership, Possession, SlotIndex, SlotKind};

impl UniverseState {
    /// Compacts the table, rebuilding it from possession records with
    /// positive shares. Afterwards the whole dirty bitmap is set, so the
    /// next digest pass rebuilds the entire tree.
    ///
    /// The scratch buffer is caller-supplied so the compactor allocates
    /// nothing; [`Universe::scratch_buffer`](super::Universe::scratch_buffer)
    /// sizes one.
    ///
    /// # Panics
    ///
    /// Panics if `scratch` does not span exactly the table capacity.
    pub fn end_epoch(&mut self, scratch: &mut [AssetSlot]) {
        assert_eq!(scratch.len(), self.capacity, "scratch buffer must span the whole table");
        scratch.fill(AssetSlot::EMPTY);

        let mut live_possessions = 0usize;
        for index in 0..self.capacity {
            let slot = self.slots[index];
            if slot.kind() != SlotKind::Possession {
                continue;
            }
            let possession = slot.possession();
            if possession.number_of_shares <= 0 {
                continue;
            }
            live_possessions += 1;

            let ownership = self.slot(possession.ownership_index).ownership();
            let issuance_slot = *self.slot(ownership.issuance_index);

            let issuance_index = self.place_issuance(scratch, issuance_slot);
            let ownership_index = self.place_ownership(scratch, &ownership, issuance_index, possession.number_of_shares);
            self.place_possession(scratch, &possession, ownership_index);
        }

        self.slots.copy_from_slice(scratch);
        self.set_all_dirty();

        debug!(live_possessions, "universe compacted at epoch end");
    }

    /// Copies the issuance into the scratch table, or finds the line it
    /// already merged into. One slot per `(issuer, name)`.
    fn place_issuance(&self, scratch: &mut [AssetSlot], issuance_slot: AssetSlot) -> SlotIndex {
        let issuance = issuance_slot.issuance();
        let mut index = issuance.public_key.home_index(self.index_mask);
        // Terminates: the scratch table is at most as populated as the
        // source table, which is never full.
        loop {
            let slot = &mut scratch[usize::from(index)];
            match slot.kind() {
                SlotKind::Empty => {
                    *slot = issuance_slot;
                    return index;
                }
                SlotKind::Issuance => {
                    let existing = slot.issuance();
                    if existing.name == issuance.name && existing.public_key == issuance.public_key {
                        return index;
                    }
                }
                _ => {}
            }
            index = index.next(self.index_mask);
        }
    }

    /// Credits the possession's shares to the owner's line below
    /// `issuance_index` in the scratch table. One slot per
    /// `(managing contract, issuance, owner)`.
    fn place_ownership(
        &self,
        scratch: &mut [AssetSlot],
        ownership: &Ownership,
        issuance_index: SlotIndex,
        number_of_shares: i64,
    ) -> SlotIndex {
        let mut index = ownership.public_key.home_index(self.index_mask);
        loop {
            let slot = &mut scratch[usize::from(index)];
            let accept = match slot.kind() {
                SlotKind::Empty => {
                    *slot = Ownership::new(
                        ownership.public_key,
                        ownership.managing_contract_index,
                        issuance_index,
                        0,
                    )
                    .into();
                    true
                }
                SlotKind::Ownership => {
                    let existing = slot.ownership();
                    existing.managing_contract_index == ownership.managing_contract_index
                        && existing.issuance_index == issuance_index
                        && existing.public_key == ownership.public_key
                }
                _ => false,
            };
            if accept {
                let mut merged = slot.ownership();
                merged.number_of_shares += number_of_shares;
                *slot = merged.into();
                return index;
            }
            index = index.next(self.index_mask);
        }
    }

    /// Credits the possession's shares to the possessor's line below
    /// `ownership_index` in the scratch table. One slot per
    /// `(managing contract, ownership, possessor)`.
    fn place_possession(&self, scratch: &mut [AssetSlot], possession: &Possession, ownership_index: SlotIndex) {
        let mut index = possession.public_key.home_index(self.index_mask);
        loop {
            let slot = &mut scratch[usize::from(index)];
            let accept = match slot.kind() {
                SlotKind::Empty => {
                    *slot = Possession::new(
                        possession.public_key,
                        possession.managing_contract_index,
                        ownership_index,
                        0,
                    )
                    .into();
                    true
                }
                SlotKind::Possession => {
                    let existing = slot.possession();
                    existing.managing_contract_index == possession.managing_contract_index
                        && existing.ownership_index == ownership_index
                        && existing.public_key == possession.public_key
                }
                _ => false,
            };
            if accept {
                let mut merged = slot.possession();
                merged.number_of_shares += possession.number_of_shares;
                *slot = merged.into();
                return;
            }
            index = index.next(self.index_mask);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        types::{PublicKey, UnitOfMeasurement},
        universe::IssuanceReceipt,
    };

    fn key(home: u8, tail: u8) -> PublicKey {
        let mut bytes = [tail; 32];
        bytes[..4].copy_from_slice(&u32::to_le_bytes(home as u32));
        PublicKey(bytes)
    }

    fn issue(state: &mut UniverseState, issuer: PublicKey, name: &str, shares: i64) -> IssuanceReceipt {
        state
            .issue_asset(issuer, name.parse().unwrap(), 0, UnitOfMeasurement::DIMENSIONLESS, shares, 1)
            .unwrap()
    }

    fn snapshot(state: &UniverseState) -> Vec<AssetSlot> {
        (0..state.capacity() as u32).map(|i| *state.slot(SlotIndex(i))).collect()
    }

    #[test]
    fn compaction_is_a_fixed_point() {
        let mut state = UniverseState::new(6).unwrap();
        let issuer = key(0, 1);
        let receipt = issue(&mut state, issuer, "GAS", 1000);
        state
            .transfer_share_ownership_and_possession(receipt.ownership_index, receipt.possession_index, key(9, 2), 250)
            .unwrap();

        let mut scratch = vec![AssetSlot::EMPTY; 64];
        state.end_epoch(&mut scratch);
        let once = snapshot(&state);
        state.end_epoch(&mut scratch);
        assert_eq!(snapshot(&state), once);
    }

    #[test]
    fn drained_lines_are_collected() {
        let mut state = UniverseState::new(6).unwrap();
        let issuer = key(0, 1);
        let receipt = issue(&mut state, issuer, "GAS", 100);
        state
            .transfer_share_ownership_and_possession(receipt.ownership_index, receipt.possession_index, key(9, 2), 100)
            .unwrap();

        let mut scratch = vec![AssetSlot::EMPTY; 64];
        state.end_epoch(&mut scratch);

        // The issuer's drained ownership and possession are gone; the
        // destination holds the whole line.
        let live: Vec<_> = snapshot(&state).into_iter().filter(|slot| !slot.is_empty()).collect();
        assert_eq!(live.len(), 3);
        let ownership = live.iter().find(|slot| slot.kind() == SlotKind::Ownership).unwrap();
        assert_eq!(ownership.public_key(), key(9, 2));
        assert_eq!(ownership.ownership().number_of_shares, 100);
    }

    #[test]
    fn duplicate_issuance_lines_merge() {
        let mut state = UniverseState::new(6).unwrap();
        let issuer = key(0, 1);
        issue(&mut state, issuer, "GAS", 100);
        issue(&mut state, issuer, "GAS", 50);

        let mut scratch = vec![AssetSlot::EMPTY; 64];
        state.end_epoch(&mut scratch);

        let slots = snapshot(&state);
        let issuances: Vec<_> = slots.iter().filter(|slot| slot.kind() == SlotKind::Issuance).collect();
        assert_eq!(issuances.len(), 1);
        let ownerships: Vec<_> = slots.iter().filter(|slot| slot.kind() == SlotKind::Ownership).collect();
        assert_eq!(ownerships.len(), 1);
        assert_eq!(ownerships[0].ownership().number_of_shares, 150);
        let possessions: Vec<_> = slots.iter().filter(|slot| slot.kind() == SlotKind::Possession).collect();
        assert_eq!(possessions.len(), 1);
        assert_eq!(possessions[0].possession().number_of_shares, 150);
    }

    #[test]
    fn distinct_names_stay_separate() {
        let mut state = UniverseState::new(6).unwrap();
        let issuer = key(0, 1);
        issue(&mut state, issuer, "GOLD", 10);
        issue(&mut state, issuer, "SILVER", 20);

        let mut scratch = vec![AssetSlot::EMPTY; 64];
        state.end_epoch(&mut scratch);

        let slots = snapshot(&state);
        let issuances: Vec<_> = slots.iter().filter(|slot| slot.kind() == SlotKind::Issuance).collect();
        assert_eq!(issuances.len(), 2);
        let ownerships: Vec<_> = slots.iter().filter(|slot| slot.kind() == SlotKind::Ownership).collect();
        assert_eq!(ownerships.len(), 2);
    }

    #[test]
    fn rejects_an_undersized_scratch_buffer() {
        let mut state = UniverseState::new(6).unwrap();
        let mut scratch = vec![AssetSlot::EMPTY; 32];
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| state.end_epoch(&mut scratch)));
        assert!(result.is_err());
    }
}
