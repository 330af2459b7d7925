// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The incremental Merkle digester.
//!
//! The digest tree is a complete binary tree with one leaf per slot,
//! stored level by level in a flat array of 32-byte nodes. The dirty
//! bitmap drives recomputation: a set bit means the leaf below it is
//! stale, and the inner passes reuse the same bitmap across levels by
//! reading pairs of bits and setting the parent's single bit.

use tiny_keccak::{Hasher, KangarooTwelve};

use super::UniverseState;

/// KangarooTwelve of an arbitrary buffer into 32 bytes.
fn k12(data: &[u8], output: &mut [u8; 32]) {
    let mut hasher = KangarooTwelve::new(b"");
    hasher.update(data);
    hasher.finalize(output);
}

/// KangarooTwelve of two concatenated 32-byte digests into one.
fn k12_pair(left: &[u8; 32], right: &[u8; 32], output: &mut [u8; 32]) {
    let mut hasher = KangarooTwelve::new(b"");
    hasher.update(left);
    hasher.update(right);
    hasher.finalize(output);
}

impl UniverseState {
    /// Computes the 32-byte digest of the whole universe.
    ///
    /// Consumes the dirty bitmap: only slots flagged since the previous
    /// pass are rehashed, and only the tree path above a recomputed node
    /// is revisited. The digest reflects exactly the mutations completed
    /// before the lock was acquired.
    pub fn digest(&mut self) -> [u8; 32] {
        let capacity = self.capacity;
        let Self {
            slots,
            digests,
            change_flags,
            ..
        } = self;

        // Leaf pass: rehash every flagged slot. The flags stay set; the
        // first inner pass consumes them as its pair bits.
        for index in 0..capacity {
            if change_flags[index >> 6] & (1u64 << (index & 63)) != 0 {
                let mut leaf = [0u8; 32];
                k12(slots[index].bytes(), &mut leaf);
                digests[index] = leaf;
            }
        }

        // Inner passes: a node is recomputed when either child's bit is
        // set. The pair must be cleared before the parent bit is set;
        // the bitmap is shared across levels and the parent bit of pair
        // `i` lands in the word the next level reads at `i >> 1`.
        let mut level_start = 0usize;
        let mut level_len = capacity;
        while level_len > 1 {
            let next_level_start = level_start + level_len;
            for i in (0..level_len).step_by(2) {
                if change_flags[i >> 6] & (3u64 << (i & 63)) != 0 {
                    let mut node = [0u8; 32];
                    k12_pair(&digests[level_start + i], &digests[level_start + i + 1], &mut node);
                    digests[next_level_start + (i >> 1)] = node;
                    change_flags[i >> 6] &= !(3u64 << (i & 63));
                    change_flags[i >> 7] |= 1u64 << ((i >> 1) & 63);
                }
            }
            level_start = next_level_start;
            level_len >>= 1;
        }
        change_flags[0] = 0;

        digests[2 * capacity - 2]
    }
}
