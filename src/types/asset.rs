// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

#![allow(missing_docs)]

use core::{fmt, mem, str::FromStr};

use bytemuck::{Pod, Zeroable};
use num_enum::{FromPrimitive, IntoPrimitive};
use thiserror::Error;

use super::{PublicKey, SlotIndex};

/// The size of every asset slot in bytes.
pub const SLOT_SIZE: usize = 48;

/// Byte offset of the record tag, identical in all slot variants.
const SLOT_KIND_OFFSET: usize = 32;

/// The tag byte selecting the interpretation of an asset slot.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
pub enum SlotKind {
    /// The slot is free. The whole table starts out in this state.
    #[num_enum(default)]
    Empty = 0,
    /// A record that an issuer created a named asset.
    Issuance = 1,
    /// A record that a public key holds legal title to shares of an issuance.
    Ownership = 2,
    /// A record that a public key physically holds shares of an ownership line.
    Possession = 3,
}

/// A 7-byte asset name: uppercase letters and digits, zero-padded.
#[repr(transparent)]
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct AssetName(pub [u8; 7]);

/// Error raised when parsing an [`AssetName`] from a string.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssetNameError {
    #[error("asset names hold at most 7 bytes, got {0}")]
    TooLong(usize),
    #[error("invalid asset name byte `{0:#04x}`, expected an uppercase letter or digit")]
    InvalidByte(u8),
    #[error("asset names must not be empty")]
    Empty,
}

impl FromStr for AssetName {
    type Err = AssetNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AssetNameError::Empty);
        }
        if s.len() > 7 {
            return Err(AssetNameError::TooLong(s.len()));
        }
        let mut name = [0u8; 7];
        for (dst, byte) in name.iter_mut().zip(s.bytes()) {
            if !byte.is_ascii_uppercase() && !byte.is_ascii_digit() {
                return Err(AssetNameError::InvalidByte(byte));
            }
            *dst = byte;
        }
        Ok(Self(name))
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in self.0.iter().take_while(|byte| **byte != 0) {
            write!(f, "{}", *byte as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AssetName(\"{self}\")")
    }
}

/// The unit of measurement of an issuance: the exponents of the seven SI
/// base units, in the field's fixed order.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct UnitOfMeasurement(pub [i8; 7]);

impl UnitOfMeasurement {
    pub const AMPERE: usize = 0;
    pub const CANDELA: usize = 1;
    pub const KELVIN: usize = 2;
    pub const KILOGRAM: usize = 3;
    pub const METER: usize = 4;
    pub const MOLE: usize = 5;
    pub const SECOND: usize = 6;

    /// All exponents zero. Used by contract-issued assets.
    pub const DIMENSIONLESS: Self = Self([0; 7]);
}

/// An issuance record: a durable statement that `public_key` created the
/// asset `name` with the given decimals and unit.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Issuance {
    pub public_key: PublicKey,
    kind: u8,
    pub name: AssetName,
    pub number_of_decimal_places: i8,
    pub unit_of_measurement: UnitOfMeasurement,
}

impl Issuance {
    /// Creates a live issuance record.
    pub fn new(
        public_key: PublicKey,
        name: AssetName,
        number_of_decimal_places: i8,
        unit_of_measurement: UnitOfMeasurement,
    ) -> Self {
        Self {
            public_key,
            kind: SlotKind::Issuance.into(),
            name,
            number_of_decimal_places,
            unit_of_measurement,
        }
    }
}

/// An ownership record: `public_key` holds legal title to
/// `number_of_shares` shares of the issuance at `issuance_index`,
/// transfers gated by the contract at `managing_contract_index`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Ownership {
    pub public_key: PublicKey,
    kind: u8,
    padding: [u8; 1],
    pub managing_contract_index: u16,
    pub issuance_index: SlotIndex,
    pub number_of_shares: i64,
}

impl Ownership {
    /// Creates a live ownership record backed by `issuance_index`.
    pub fn new(
        public_key: PublicKey,
        managing_contract_index: u16,
        issuance_index: SlotIndex,
        number_of_shares: i64,
    ) -> Self {
        Self {
            public_key,
            kind: SlotKind::Ownership.into(),
            padding: [0],
            managing_contract_index,
            issuance_index,
            number_of_shares,
        }
    }
}

/// A possession record: `public_key` physically holds `number_of_shares`
/// shares of the ownership line at `ownership_index`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Possession {
    pub public_key: PublicKey,
    kind: u8,
    padding: [u8; 1],
    pub managing_contract_index: u16,
    pub ownership_index: SlotIndex,
    pub number_of_shares: i64,
}

impl Possession {
    /// Creates a live possession record backed by `ownership_index`.
    pub fn new(
        public_key: PublicKey,
        managing_contract_index: u16,
        ownership_index: SlotIndex,
        number_of_shares: i64,
    ) -> Self {
        Self {
            public_key,
            kind: SlotKind::Possession.into(),
            padding: [0],
            managing_contract_index,
            ownership_index,
            number_of_shares,
        }
    }
}

/// One 48-byte slot of the asset table. The tag byte selects which of the
/// three record views applies; the views share the slot by overlap.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct AssetSlot([u8; SLOT_SIZE]);

impl AssetSlot {
    /// The all-zeroes empty slot.
    pub const EMPTY: Self = Self([0; SLOT_SIZE]);

    /// The record tag. Reads the shared tag offset, so it is valid before
    /// the variant is known.
    pub fn kind(&self) -> SlotKind {
        SlotKind::from(self.0[SLOT_KIND_OFFSET])
    }

    /// Whether the slot is free.
    pub fn is_empty(&self) -> bool {
        self.kind() == SlotKind::Empty
    }

    /// The record's public key: issuer, owner, or possessor.
    pub fn public_key(&self) -> PublicKey {
        bytemuck::pod_read_unaligned(&self.0[..PublicKey::LENGTH])
    }

    /// The slot read as an issuance record.
    pub fn issuance(&self) -> Issuance {
        bytemuck::cast(*self)
    }

    /// The slot read as an ownership record.
    pub fn ownership(&self) -> Ownership {
        bytemuck::cast(*self)
    }

    /// The slot read as a possession record.
    pub fn possession(&self) -> Possession {
        bytemuck::cast(*self)
    }

    /// The raw slot bytes, as hashed and as written to snapshots.
    pub fn bytes(&self) -> &[u8; SLOT_SIZE] {
        &self.0
    }
}

impl From<Issuance> for AssetSlot {
    fn from(value: Issuance) -> Self {
        bytemuck::cast(value)
    }
}

impl From<Ownership> for AssetSlot {
    fn from(value: Ownership) -> Self {
        bytemuck::cast(value)
    }
}

impl From<Possession> for AssetSlot {
    fn from(value: Possession) -> Self {
        bytemuck::cast(value)
    }
}

// Every variant must fill the slot exactly and keep the tag at the shared
// offset; the query handlers branch on the tag before knowing the variant.
const _: () = {
    assert!(mem::size_of::<AssetSlot>() == SLOT_SIZE);
    assert!(mem::size_of::<Issuance>() == SLOT_SIZE);
    assert!(mem::size_of::<Ownership>() == SLOT_SIZE);
    assert!(mem::size_of::<Possession>() == SLOT_SIZE);
    assert!(mem::offset_of!(Issuance, kind) == SLOT_KIND_OFFSET);
    assert!(mem::offset_of!(Ownership, kind) == SLOT_KIND_OFFSET);
    assert!(mem::offset_of!(Possession, kind) == SLOT_KIND_OFFSET);
};

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_slot_is_empty() {
        assert_eq!(AssetSlot::EMPTY.kind(), SlotKind::Empty);
        assert!(AssetSlot::EMPTY.is_empty());
    }

    #[test]
    fn issuance_round_trip() {
        let issuer = PublicKey([7; 32]);
        let name = "WIDGET".parse().unwrap();
        let slot = AssetSlot::from(Issuance::new(issuer, name, 2, UnitOfMeasurement([0, 0, 0, 1, 0, 0, -2])));
        assert_eq!(slot.kind(), SlotKind::Issuance);
        assert_eq!(slot.public_key(), issuer);
        let issuance = slot.issuance();
        assert_eq!(issuance.name, name);
        assert_eq!(issuance.number_of_decimal_places, 2);
        assert_eq!(issuance.unit_of_measurement.0[UnitOfMeasurement::KILOGRAM], 1);
        assert_eq!(issuance.unit_of_measurement.0[UnitOfMeasurement::SECOND], -2);
    }

    #[test]
    fn ownership_round_trip() {
        let owner = PublicKey([9; 32]);
        let slot = AssetSlot::from(Ownership::new(owner, 1, SlotIndex(42), 1000));
        assert_eq!(slot.kind(), SlotKind::Ownership);
        let ownership = slot.ownership();
        assert_eq!(ownership.public_key, owner);
        assert_eq!(ownership.issuance_index, SlotIndex(42));
        assert_eq!(ownership.number_of_shares, 1000);
    }

    #[test]
    fn possession_round_trip() {
        let possessor = PublicKey([11; 32]);
        let slot = AssetSlot::from(Possession::new(possessor, 3, SlotIndex(43), 500));
        assert_eq!(slot.kind(), SlotKind::Possession);
        let possession = slot.possession();
        assert_eq!(possession.ownership_index, SlotIndex(43));
        assert_eq!(possession.managing_contract_index, 3);
    }

    #[test]
    fn name_parsing() {
        assert_eq!("WIDGET".parse::<AssetName>().unwrap().to_string(), "WIDGET");
        assert_eq!("A1".parse::<AssetName>().unwrap().0, *b"A1\0\0\0\0\0");
        assert_eq!("".parse::<AssetName>(), Err(AssetNameError::Empty));
        assert_eq!("TOOLONGNAME".parse::<AssetName>(), Err(AssetNameError::TooLong(11)));
        assert_eq!("widget".parse::<AssetName>(), Err(AssetNameError::InvalidByte(b'w')));
    }

    #[test]
    fn unknown_tag_reads_as_empty() {
        let mut bytes = [0u8; SLOT_SIZE];
        bytes[32] = 200;
        let slot: AssetSlot = bytemuck::cast(bytes);
        assert_eq!(slot.kind(), SlotKind::Empty);
    }
}
