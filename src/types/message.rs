// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The fixed-size request and response payloads of the asset queries.
//!
//! Request framing, transport, and the correlation id of the enclosing
//! header belong to the node's RPC layer; this module only defines the
//! payloads and the [`ResponseSink`] the query handlers emit into.

use core::mem;

use bytemuck::{Pod, Zeroable};

use super::{AssetSlot, PublicKey};

/// Requests every issuance record created by a public key.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct RequestIssuedAssets {
    /// The issuer to look up.
    pub public_key: PublicKey,
}

impl RequestIssuedAssets {
    /// The wire type code of this request.
    pub const TYPE: u8 = 36;
}

/// One issuance record of the requested issuer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct RespondIssuedAssets {
    /// The issuance slot.
    pub asset: AssetSlot,
    /// The tick at which the record was read.
    pub tick: u32,
    // TODO: add the Merkle path siblings so responses carry inclusion proofs
}

impl RespondIssuedAssets {
    /// The wire type code of this response.
    pub const TYPE: u8 = 37;
}

/// Requests every ownership record held by a public key.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct RequestOwnedAssets {
    /// The owner to look up.
    pub public_key: PublicKey,
}

impl RequestOwnedAssets {
    /// The wire type code of this request.
    pub const TYPE: u8 = 38;
}

/// One ownership record of the requested owner, with its issuance.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct RespondOwnedAssets {
    /// The ownership slot.
    pub asset: AssetSlot,
    /// The issuance slot the ownership refers to.
    pub issuance_asset: AssetSlot,
    /// The tick at which the records were read.
    pub tick: u32,
}

impl RespondOwnedAssets {
    /// The wire type code of this response.
    pub const TYPE: u8 = 39;
}

/// Requests every possession record held by a public key.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct RequestPossessedAssets {
    /// The possessor to look up.
    pub public_key: PublicKey,
}

impl RequestPossessedAssets {
    /// The wire type code of this request.
    pub const TYPE: u8 = 40;
}

/// One possession record of the requested possessor, with its ownership
/// and issuance.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct RespondPossessedAssets {
    /// The possession slot.
    pub asset: AssetSlot,
    /// The ownership slot the possession refers to.
    pub ownership_asset: AssetSlot,
    /// The issuance slot the ownership refers to.
    pub issuance_asset: AssetSlot,
    /// The tick at which the records were read.
    pub tick: u32,
}

impl RespondPossessedAssets {
    /// The wire type code of this response.
    pub const TYPE: u8 = 41;
}

/// The empty payload terminating every query response sequence.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EndResponse;

impl EndResponse {
    /// The wire type code of the terminator.
    pub const TYPE: u8 = 35;
}

/// A single enqueued query reply.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QueryResponse {
    /// An issuance record (type 37).
    Issued(RespondIssuedAssets),
    /// An ownership record with its issuance (type 39).
    Owned(RespondOwnedAssets),
    /// A possession record with its ownership and issuance (type 41).
    Possessed(RespondPossessedAssets),
    /// The terminator (type 35).
    End,
}

impl QueryResponse {
    /// The wire type code of this response.
    pub fn wire_type(&self) -> u8 {
        match self {
            Self::Issued(_) => RespondIssuedAssets::TYPE,
            Self::Owned(_) => RespondOwnedAssets::TYPE,
            Self::Possessed(_) => RespondPossessedAssets::TYPE,
            Self::End => EndResponse::TYPE,
        }
    }

    /// The raw little-endian payload bytes.
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Issued(response) => bytemuck::bytes_of(response),
            Self::Owned(response) => bytemuck::bytes_of(response),
            Self::Possessed(response) => bytemuck::bytes_of(response),
            Self::End => &[],
        }
    }
}

/// Where the query handlers enqueue their replies. Implemented by the
/// node's RPC layer, which pairs every reply with the correlation id of
/// the request it answers.
pub trait ResponseSink {
    /// Enqueues one reply for delivery to the requesting peer.
    fn enqueue(&mut self, response: QueryResponse);
}

impl ResponseSink for Vec<QueryResponse> {
    fn enqueue(&mut self, response: QueryResponse) {
        self.push(response);
    }
}

const _: () = {
    assert!(mem::size_of::<RequestIssuedAssets>() == 32);
    assert!(mem::size_of::<RequestOwnedAssets>() == 32);
    assert!(mem::size_of::<RequestPossessedAssets>() == 32);
    assert!(mem::size_of::<RespondIssuedAssets>() == 52);
    assert!(mem::size_of::<RespondOwnedAssets>() == 100);
    assert!(mem::size_of::<RespondPossessedAssets>() == 148);
};

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payload_sizes_match_wire_format() {
        let response = QueryResponse::Issued(RespondIssuedAssets {
            asset: AssetSlot::EMPTY,
            tick: 0,
        });
        assert_eq!(response.payload().len(), 52);
        assert_eq!(response.wire_type(), 37);
        assert_eq!(QueryResponse::End.payload().len(), 0);
        assert_eq!(QueryResponse::End.wire_type(), 35);
    }

    #[test]
    fn tick_trails_the_records() {
        let response = RespondIssuedAssets {
            asset: AssetSlot::EMPTY,
            tick: 0x0403_0201,
        };
        let bytes = bytemuck::bytes_of(&response);
        assert_eq!(&bytes[48..], &[0x01, 0x02, 0x03, 0x04]);
    }
}
