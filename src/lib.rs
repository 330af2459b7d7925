// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! The asset universe: the content-addressed, in-memory ledger of a node.
//!
//! All issuance, ownership, and possession records live in one
//! open-addressed table of fixed 48-byte slots behind a single spinlock.
//! The [`Universe`] handle exposes the three workloads the node runs
//! against that table: mutation ([`Universe::issue_asset`] and
//! [`Universe::transfer_share_ownership_and_possession`]), per-public-key
//! queries, and attestation ([`Universe::digest`]). At epoch boundaries
//! [`Universe::end_epoch`] compacts the table by rebuilding it from live
//! possession records alone.

/// Module containing the universe configuration.
pub mod config;
/// Module containing the data model and wire types.
pub mod types;
/// Module containing the universe core.
pub mod universe;

pub use self::{
    config::UniverseConfig,
    universe::{Universe, UniverseState},
};

// Snapshots and wire payloads are the raw slot bytes in native order.
#[cfg(not(target_endian = "little"))]
compile_error!("the universe snapshot and wire formats are little-endian");
