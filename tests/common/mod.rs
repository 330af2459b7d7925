// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use asset_universe::{
    types::{PublicKey, SlotIndex, SlotKind},
    Universe, UniverseConfig,
};
use rand::Rng;

/// A universe small enough for exhaustive table walks: 1024 slots.
#[allow(unused)]
pub fn small_universe() -> Universe {
    Universe::new(&UniverseConfig {
        depth: 10,
        ..Default::default()
    })
    .unwrap()
}

/// A key with a chosen home index and a distinguishing tail.
#[allow(unused)]
pub fn key(home: u32, tail: u8) -> PublicKey {
    let mut bytes = [tail; 32];
    bytes[..4].copy_from_slice(&home.to_le_bytes());
    PublicKey(bytes)
}

#[allow(unused)]
pub fn random_key(rng: &mut impl Rng) -> PublicKey {
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);
    PublicKey(bytes)
}

/// Checks the universal invariants: referential integrity of every live
/// record and the absence of gaps on any probe path.
#[allow(unused)]
pub fn assert_invariants(universe: &Universe) {
    let capacity = universe.capacity() as u32;
    let index_mask = capacity - 1;
    let state = universe.lock();
    for index in 0..capacity {
        let slot = state.slot(SlotIndex(index));
        match slot.kind() {
            SlotKind::Empty | SlotKind::Issuance => {}
            SlotKind::Ownership => {
                let ownership = slot.ownership();
                assert_eq!(
                    state.slot(ownership.issuance_index).kind(),
                    SlotKind::Issuance,
                    "ownership at {index} has a dangling issuance index"
                );
            }
            SlotKind::Possession => {
                let possession = slot.possession();
                let ownership_slot = state.slot(possession.ownership_index);
                assert_eq!(
                    ownership_slot.kind(),
                    SlotKind::Ownership,
                    "possession at {index} has a dangling ownership index"
                );
                assert_eq!(
                    state.slot(ownership_slot.ownership().issuance_index).kind(),
                    SlotKind::Issuance,
                    "possession at {index} reaches a dangling issuance index"
                );
            }
        }
        if !slot.is_empty() {
            // Every slot between the record's home index and its actual
            // position must be occupied, or probes would stop short.
            let mut probe = slot.public_key().home_index(index_mask);
            while probe != SlotIndex(index) {
                assert!(
                    !state.slot(probe).is_empty(),
                    "probe path to {index} has a gap at {probe}"
                );
                probe = probe.next(index_mask);
            }
        }
    }
}
