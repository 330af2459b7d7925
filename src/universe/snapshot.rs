// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Snapshot persistence.
//!
//! A snapshot is the raw slot array: exactly `capacity * 48` bytes in
//! native order, no header, no checksum. Integrity is re-established by
//! recomputing the digest after load.

use std::{fmt::Write as _, fs, io, path::Path, time::Instant};

use thiserror::Error;
use tracing::info;

use super::Universe;
use crate::types::{AssetSlot, SLOT_SIZE};

#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot holds {actual} bytes, expected {expected}")]
    UnexpectedSize { expected: usize, actual: usize },
}

/// Renders the snapshot file name for an epoch: `universe.NNN`, with the
/// epoch's last three decimal digits.
pub fn snapshot_file_name(epoch: u32) -> String {
    format!("universe.{:03}", epoch % 1000)
}

impl Universe {
    /// Saves the raw slot table to `path`, returning the byte count.
    ///
    /// The table is copied under the universe lock and written after the
    /// lock is released; the lock is never held across I/O.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<usize, SnapshotError> {
        let started = Instant::now();
        let raw = {
            let state = self.state.lock();
            bytemuck::cast_slice::<AssetSlot, u8>(&state.slots).to_vec()
        };
        fs::write(&path, &raw)?;
        info!(
            bytes = raw.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "universe snapshot saved"
        );
        Ok(raw.len())
    }

    /// Loads a raw slot table from `path`, replacing the live table.
    ///
    /// Rejects files whose size differs from the table's. On success
    /// every slot is marked dirty and the digest is rebuilt from
    /// scratch, logged, and returned; it is not verified against
    /// anything, since the file carries nothing to verify it against.
    pub fn load_snapshot(&self, path: impl AsRef<Path>) -> Result<[u8; 32], SnapshotError> {
        let raw = fs::read(&path)?;
        let expected = self.capacity * SLOT_SIZE;
        if raw.len() != expected {
            return Err(SnapshotError::UnexpectedSize {
                expected,
                actual: raw.len(),
            });
        }
        let mut state = self.state.lock();
        bytemuck::cast_slice_mut::<AssetSlot, u8>(&mut state.slots).copy_from_slice(&raw);
        state.set_all_dirty();
        let digest = state.digest();
        drop(state);
        info!(digest = %hex_digest(&digest), "universe digest recomputed after load");
        Ok(digest)
    }
}

fn hex_digest(digest: &[u8; 32]) -> String {
    digest.iter().fold(String::with_capacity(64), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::UniverseConfig,
        types::{PublicKey, UnitOfMeasurement},
    };

    fn universe() -> Universe {
        Universe::new(&UniverseConfig {
            depth: 6,
            ..Default::default()
        })
        .unwrap()
    }

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("asset-universe-{}-{tag}", std::process::id()))
    }

    #[test]
    fn file_name_encodes_the_epoch() {
        assert_eq!(snapshot_file_name(88), "universe.088");
        assert_eq!(snapshot_file_name(7), "universe.007");
        assert_eq!(snapshot_file_name(1234), "universe.234");
    }

    #[test]
    fn round_trip_preserves_table_and_digest() {
        let source = universe();
        let issuer = PublicKey([3; 32]);
        source
            .issue_asset(issuer, "DATA".parse().unwrap(), 0, UnitOfMeasurement::DIMENSIONLESS, 99, 1)
            .unwrap();
        let digest = source.digest();

        let path = temp_path("round-trip");
        let written = source.save_snapshot(&path).unwrap();
        assert_eq!(written, 64 * SLOT_SIZE);

        let target = universe();
        let loaded_digest = target.load_snapshot(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(loaded_digest, digest);
        let source_state = source.lock();
        let target_state = target.lock();
        for index in 0..64u32 {
            assert_eq!(
                source_state.slot(index.into()).bytes(),
                target_state.slot(index.into()).bytes()
            );
        }
    }

    #[test]
    fn short_file_is_rejected() {
        let path = temp_path("short");
        fs::write(&path, [0u8; 100]).unwrap();
        let result = universe().load_snapshot(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(
            result,
            Err(SnapshotError::UnexpectedSize {
                expected: 3072,
                actual: 100
            })
        ));
    }
}
