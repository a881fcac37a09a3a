// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! MurmurHash3 x64-128, the seeded mixer used by all sketches in this crate.

use std::hash::Hasher;

/// Default update seed shared by sketches that don't specify their own.
pub const DEFAULT_UPDATE_SEED: u64 = 9001;

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

/// A [`Hasher`]-compatible wrapper around MurmurHash3 x64-128.
///
/// Unlike the stock `Hasher` trait (which only exposes a 64-bit `finish`),
/// sketches need the full 128-bit output, so callers should use
/// [`MurmurHash3X64128::finish128`] rather than `Hasher::finish`.
#[derive(Debug, Clone)]
pub struct MurmurHash3X64128 {
    seed: u64,
    buffer: Vec<u8>,
}

impl MurmurHash3X64128 {
    /// Creates a hasher seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            buffer: Vec::new(),
        }
    }

    /// Consumes the buffered bytes and returns the 128-bit hash as `(h0, h1)`.
    pub fn finish128(&self) -> (u64, u64) {
        murmurhash3_x64_128(&self.buffer, self.seed)
    }
}

impl Default for MurmurHash3X64128 {
    fn default() -> Self {
        Self::with_seed(DEFAULT_UPDATE_SEED)
    }
}

impl Hasher for MurmurHash3X64128 {
    fn finish(&self) -> u64 {
        self.finish128().0
    }

    fn write(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }
}

/// Computes the 128-bit MurmurHash3 x64-128 of `data` with the given seed.
///
/// This is the reference public-domain algorithm (Austin Appleby); it is
/// used both directly (coupon derivation) and through [`MurmurHash3X64128`]
/// (generic `Hash` values).
pub fn murmurhash3_x64_128(data: &[u8], seed: u64) -> (u64, u64) {
    let len = data.len();
    let nblocks = len / 16;

    let mut h1 = seed;
    let mut h2 = seed;

    for block in data[..nblocks * 16].chunks_exact(16) {
        let mut k1 = u64::from_le_bytes(block[0..8].try_into().unwrap());
        let mut k2 = u64::from_le_bytes(block[8..16].try_into().unwrap());

        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(31);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;

        h1 = h1.rotate_left(27);
        h1 = h1.wrapping_add(h2);
        h1 = h1.wrapping_mul(5).wrapping_add(0x52dce729);

        k2 = k2.wrapping_mul(C2);
        k2 = k2.rotate_left(33);
        k2 = k2.wrapping_mul(C1);
        h2 ^= k2;

        h2 = h2.rotate_left(31);
        h2 = h2.wrapping_add(h1);
        h2 = h2.wrapping_mul(5).wrapping_add(0x38495ab5);
    }

    let tail = &data[nblocks * 16..];
    let mut k1: u64 = 0;
    let mut k2: u64 = 0;

    if tail.len() > 8 {
        for i in (8..tail.len()).rev() {
            k2 ^= (tail[i] as u64) << (8 * (i - 8));
        }
        k2 = k2.wrapping_mul(C2);
        k2 = k2.rotate_left(33);
        k2 = k2.wrapping_mul(C1);
        h2 ^= k2;
    }

    if !tail.is_empty() {
        let up_to = tail.len().min(8);
        for i in (0..up_to).rev() {
            k1 ^= (tail[i] as u64) << (8 * i);
        }
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(31);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= len as u64;
    h2 ^= len as u64;

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    h1 = fmix64(h1);
    h2 = fmix64(h2);
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    (h1, h2)
}

fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

/// Computes the 16-bit seed hash embedded in a snapshot, used to detect a
/// mismatched seed on `Snapshot::from_bytes`.
///
/// A result of zero is remapped to 1 so that zero can be reserved as "not
/// yet computed" by callers that store this value in an `Option`.
pub fn compute_seed_hash(seed: u64) -> u16 {
    let (h0, _h1) = murmurhash3_x64_128(&seed.to_le_bytes(), 0);
    let seed_hash = (h0 & 0xffff) as u16;
    if seed_hash == 0 { 1 } else { seed_hash }
}
