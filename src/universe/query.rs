// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The per-public-key query handlers.
//!
//! Each handler walks forward from the requested key's home index,
//! emits one response per matching record, and terminates with
//! [`EndResponse`](crate::types::EndResponse) when the walk reaches an
//! empty slot. An empty result is a terminator alone, not an error.

use super::UniverseState;
use crate::types::{
    QueryResponse, RequestIssuedAssets, RequestOwnedAssets, RequestPossessedAssets, ResponseSink,
    RespondIssuedAssets, RespondOwnedAssets, RespondPossessedAssets, SlotKind,
};

impl UniverseState {
    /// Emits one [`RespondIssuedAssets`] per issuance created by the
    /// requested key, then the terminator.
    pub fn process_request_issued_assets(
        &self,
        request: &RequestIssuedAssets,
        tick: u32,
        sink: &mut impl ResponseSink,
    ) {
        let mut index = request.public_key.home_index(self.index_mask);
        for _ in 0..self.capacity {
            let slot = self.slot(index);
            if slot.is_empty() {
                break;
            }
            if slot.kind() == SlotKind::Issuance && slot.public_key() == request.public_key {
                sink.enqueue(QueryResponse::Issued(RespondIssuedAssets { asset: *slot, tick }));
            }
            index = index.next(self.index_mask);
        }
        sink.enqueue(QueryResponse::End);
    }

    /// Emits one [`RespondOwnedAssets`] per ownership held by the
    /// requested key, each with its issuance, then the terminator.
    pub fn process_request_owned_assets(&self, request: &RequestOwnedAssets, tick: u32, sink: &mut impl ResponseSink) {
        let mut index = request.public_key.home_index(self.index_mask);
        for _ in 0..self.capacity {
            let slot = self.slot(index);
            if slot.is_empty() {
                break;
            }
            if slot.kind() == SlotKind::Ownership && slot.public_key() == request.public_key {
                sink.enqueue(QueryResponse::Owned(RespondOwnedAssets {
                    asset: *slot,
                    issuance_asset: *self.slot(slot.ownership().issuance_index),
                    tick,
                }));
            }
            index = index.next(self.index_mask);
        }
        sink.enqueue(QueryResponse::End);
    }

    /// Emits one [`RespondPossessedAssets`] per possession held by the
    /// requested key, each with its ownership and issuance, then the
    /// terminator.
    pub fn process_request_possessed_assets(
        &self,
        request: &RequestPossessedAssets,
        tick: u32,
        sink: &mut impl ResponseSink,
    ) {
        let mut index = request.public_key.home_index(self.index_mask);
        for _ in 0..self.capacity {
            let slot = self.slot(index);
            if slot.is_empty() {
                break;
            }
            if slot.kind() == SlotKind::Possession && slot.public_key() == request.public_key {
                let ownership_asset = *self.slot(slot.possession().ownership_index);
                let issuance_asset = *self.slot(ownership_asset.ownership().issuance_index);
                sink.enqueue(QueryResponse::Possessed(RespondPossessedAssets {
                    asset: *slot,
                    ownership_asset,
                    issuance_asset,
                    tick,
                }));
            }
            index = index.next(self.index_mask);
        }
        sink.enqueue(QueryResponse::End);
    }
}
