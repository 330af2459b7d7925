// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use core::{fmt, ops};

use bytemuck::{Pod, Zeroable};
use derive_more::{Add, Deref, DerefMut, Sub};

/// The index of a slot in the asset table. All intra-table references
/// (ownership to issuance, possession to ownership) are stored as this
/// 32-bit index.
#[repr(transparent)]
#[derive(
    Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, Debug, Default, Add, Sub, Deref, DerefMut, Pod, Zeroable,
)]
pub struct SlotIndex(pub u32);

impl SlotIndex {
    /// The next probe position, wrapping at the table capacity.
    pub fn next(self, index_mask: u32) -> Self {
        Self(self.0.wrapping_add(1) & index_mask)
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u32> for SlotIndex {
    fn from(value: u32) -> Self {
        SlotIndex(value)
    }
}

impl From<SlotIndex> for u32 {
    fn from(value: SlotIndex) -> Self {
        value.0
    }
}

impl From<SlotIndex> for usize {
    fn from(value: SlotIndex) -> Self {
        value.0 as usize
    }
}

impl ops::Add<u32> for SlotIndex {
    type Output = Self;

    fn add(self, x: u32) -> Self {
        SlotIndex(self.0 + x)
    }
}

impl PartialEq<u32> for SlotIndex {
    fn eq(&self, x: &u32) -> bool {
        self.0 == *x
    }
}

impl PartialEq<SlotIndex> for u32 {
    fn eq(&self, x: &SlotIndex) -> bool {
        *self == x.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn next_wraps_at_capacity() {
        let mask = 0x3F;
        assert_eq!(SlotIndex(0).next(mask), SlotIndex(1));
        assert_eq!(SlotIndex(63).next(mask), SlotIndex(0));
    }
}
