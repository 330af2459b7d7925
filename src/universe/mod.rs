// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Module containing the universe core: the slot table, the mutation
//! engine, the Merkle digester, the end-of-epoch compactor, the query
//! handlers, and snapshot I/O. One lock serializes all of them.

mod digest;
mod lock;
mod mutation;
mod query;
mod reorg;
mod snapshot;

use core::mem;

use thiserror::Error;

use self::lock::{SpinLock, SpinLockGuard};
pub use self::{
    mutation::{IssuanceReceipt, IssueError, TransferError, TransferReceipt},
    snapshot::{snapshot_file_name, SnapshotError},
};
use crate::{
    config::UniverseConfig,
    types::{
        AssetName, AssetSlot, PublicKey, RequestIssuedAssets, RequestOwnedAssets, RequestPossessedAssets,
        ResponseSink, SlotIndex, UnitOfMeasurement,
    },
};

/// RAII guard over the universe lock. Holders mutate and query the state
/// directly, which is the batch path used by contract-driven sequences;
/// the lock is released when the guard drops, on every exit path.
pub type UniverseGuard<'a> = SpinLockGuard<'a, UniverseState>;

#[allow(missing_docs)]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InitError {
    #[error("failed to allocate {bytes} bytes for the {array}")]
    Allocation { array: &'static str, bytes: usize },
    #[error("unsupported universe depth {0}, expected 6 to 30")]
    UnsupportedDepth(u32),
}

/// The asset universe: every issuance, ownership, and possession record
/// known to the node, the Merkle tree attesting to them, and the dirty
/// bitmap driving incremental digests, bundled behind one spinlock.
pub struct Universe {
    capacity: usize,
    state: SpinLock<UniverseState>,
}

impl Universe {
    /// Allocates an all-empty universe of `2^depth` slots.
    ///
    /// Every slot starts out dirty, so the first digest pass hashes the
    /// whole table.
    pub fn new(config: &UniverseConfig) -> Result<Self, InitError> {
        let state = UniverseState::new(config.depth)?;
        Ok(Self {
            capacity: state.capacity,
            state: SpinLock::new(state),
        })
    }

    /// The number of slots in the table.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Acquires the universe lock for a batch of operations.
    pub fn lock(&self) -> UniverseGuard<'_> {
        self.state.lock()
    }

    /// Allocates a scratch buffer sized for [`Universe::end_epoch`].
    pub fn scratch_buffer(&self) -> Result<Vec<AssetSlot>, InitError> {
        try_filled_vec(AssetSlot::EMPTY, self.capacity, "reorg scratch")
    }

    /// Issues a new asset under the universe lock.
    /// See [`UniverseState::issue_asset`].
    pub fn issue_asset(
        &self,
        issuer_public_key: PublicKey,
        name: AssetName,
        number_of_decimal_places: i8,
        unit_of_measurement: UnitOfMeasurement,
        number_of_shares: i64,
        managing_contract_index: u16,
    ) -> Result<IssuanceReceipt, IssueError> {
        self.state.lock().issue_asset(
            issuer_public_key,
            name,
            number_of_decimal_places,
            unit_of_measurement,
            number_of_shares,
            managing_contract_index,
        )
    }

    /// Transfers shares under the universe lock.
    /// See [`UniverseState::transfer_share_ownership_and_possession`].
    pub fn transfer_share_ownership_and_possession(
        &self,
        source_ownership_index: SlotIndex,
        source_possession_index: SlotIndex,
        destination_public_key: PublicKey,
        number_of_shares: i64,
    ) -> Result<TransferReceipt, TransferError> {
        self.state.lock().transfer_share_ownership_and_possession(
            source_ownership_index,
            source_possession_index,
            destination_public_key,
            number_of_shares,
        )
    }

    /// Computes the universe digest under the lock.
    /// See [`UniverseState::digest`].
    pub fn digest(&self) -> [u8; 32] {
        self.state.lock().digest()
    }

    /// Compacts the table at an epoch boundary, under the lock.
    /// See [`UniverseState::end_epoch`].
    pub fn end_epoch(&self, scratch: &mut [AssetSlot]) {
        self.state.lock().end_epoch(scratch)
    }

    /// Answers an issued-assets query under the lock.
    pub fn process_request_issued_assets(
        &self,
        request: &RequestIssuedAssets,
        tick: u32,
        sink: &mut impl ResponseSink,
    ) {
        self.state.lock().process_request_issued_assets(request, tick, sink)
    }

    /// Answers an owned-assets query under the lock.
    pub fn process_request_owned_assets(&self, request: &RequestOwnedAssets, tick: u32, sink: &mut impl ResponseSink) {
        self.state.lock().process_request_owned_assets(request, tick, sink)
    }

    /// Answers a possessed-assets query under the lock.
    pub fn process_request_possessed_assets(
        &self,
        request: &RequestPossessedAssets,
        tick: u32,
        sink: &mut impl ResponseSink,
    ) {
        self.state.lock().process_request_possessed_assets(request, tick, sink)
    }
}

/// The lock-protected contents of the universe: the slot table, the
/// digest tree, and the dirty bitmap. Obtained through
/// [`Universe::lock`]; every method assumes the caller holds the lock.
pub struct UniverseState {
    capacity: usize,
    index_mask: u32,
    slots: Vec<AssetSlot>,
    digests: Vec<[u8; 32]>,
    change_flags: Vec<u64>,
}

impl UniverseState {
    fn new(depth: u32) -> Result<Self, InitError> {
        if !(6..=30).contains(&depth) {
            return Err(InitError::UnsupportedDepth(depth));
        }
        let capacity = 1usize << depth;
        let slots = try_filled_vec(AssetSlot::EMPTY, capacity, "slot table")?;
        let digests = try_filled_vec([0u8; 32], 2 * capacity - 1, "digest tree")?;
        // All-ones: every slot is dirty until the first digest pass.
        let change_flags = try_filled_vec(u64::MAX, capacity / 64, "dirty bitmap")?;
        Ok(Self {
            capacity,
            index_mask: (capacity - 1) as u32,
            slots,
            digests,
            change_flags,
        })
    }

    /// The number of slots in the table.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The slot at `index`, reduced modulo the capacity.
    pub fn slot(&self, index: SlotIndex) -> &AssetSlot {
        &self.slots[(index.0 & self.index_mask) as usize]
    }

    fn slot_mut(&mut self, index: SlotIndex) -> &mut AssetSlot {
        &mut self.slots[(index.0 & self.index_mask) as usize]
    }

    /// Flags the slot's leaf hash and the tree path above it as stale.
    fn mark_dirty(&mut self, index: SlotIndex) {
        let index = (index.0 & self.index_mask) as usize;
        self.change_flags[index >> 6] |= 1u64 << (index & 63);
    }

    /// Flags every slot, forcing the next digest pass to rebuild the
    /// whole tree.
    fn set_all_dirty(&mut self) {
        self.change_flags.fill(u64::MAX);
    }
}

fn try_filled_vec<T: Copy>(value: T, len: usize, array: &'static str) -> Result<Vec<T>, InitError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(len).map_err(|_| InitError::Allocation {
        array,
        bytes: len * mem::size_of::<T>(),
    })?;
    vec.resize(len, value);
    Ok(vec)
}
