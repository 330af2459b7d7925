// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use core::fmt;

use bytemuck::{Pod, Zeroable};
use derive_more::{Deref, From};

use super::SlotIndex;

/// A 32-byte public key: the issuer of an issuance, the owner of an
/// ownership, or the possessor of a possession.
#[repr(transparent)]
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable, Deref, From)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    /// The length of a public key in bytes.
    pub const LENGTH: usize = 32;

    /// The home index of this key: the starting point of every
    /// open-addressing probe keyed on it. Takes the key's low 32-bit
    /// little-endian word reduced by the table's index mask.
    pub fn home_index(&self, index_mask: u32) -> SlotIndex {
        let low = u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        SlotIndex(low & index_mask)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}
