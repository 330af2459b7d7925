// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the universe data model and wire types.

mod asset;
mod message;
mod public_key;
mod slot_index;

pub use self::{
    asset::{
        AssetName, AssetNameError, AssetSlot, Issuance, Ownership, Possession, SlotKind, UnitOfMeasurement, SLOT_SIZE,
    },
    message::{
        EndResponse, QueryResponse, RequestIssuedAssets, RequestOwnedAssets, RequestPossessedAssets, ResponseSink,
        RespondIssuedAssets, RespondOwnedAssets, RespondPossessedAssets,
    },
    public_key::PublicKey,
    slot_index::SlotIndex,
};
