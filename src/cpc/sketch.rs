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

use std::hash::Hasher;

use crate::common::NumStdDev;
use crate::cpc::icon_estimator::icon_estimate;
use crate::cpc::pair_table::PairTable;
use crate::cpc::snapshot::Snapshot;
use crate::cpc::{
    self, Flavor, MAX_LG_K, MIN_LG_K, bit_matrix, coupon_col, coupon_row, cpc_confidence,
    encode_coupon, hip,
};
use crate::error::Error;
use crate::hash::{DEFAULT_UPDATE_SEED, MurmurHash3X64128, compute_seed_hash};

/// Default log2 of K.
const DEFAULT_LG_K: u8 = 11;

/// A Compressed Probabilistic Counting sketch: a sub-linear cardinality
/// estimator that tolerates arbitrary input order and duplicate updates.
#[derive(Debug, Clone)]
pub struct CpcSketch {
    lg_k: u8,
    seed: u64,

    num_coupons: u64,
    first_interesting_column: u8,
    merge_flag: bool,
    kxp: f64,
    hip_est_accum: f64,

    storage: PhysicalStorage,
}

#[derive(Debug, Clone)]
enum PhysicalStorage {
    Empty,
    Sparse {
        table: PairTable,
    },
    Dense {
        window_offset: u8,
        sliding_window: Vec<u8>,
        table: PairTable,
    },
}

impl Default for CpcSketch {
    fn default() -> Self {
        Self::new(DEFAULT_LG_K)
    }
}

impl CpcSketch {
    /// Creates a new sketch with the given `lg_k` and the default seed.
    ///
    /// # Panics
    ///
    /// Panics if `lg_k` is outside `[4, 26]`.
    pub fn new(lg_k: u8) -> Self {
        Self::with_seed(lg_k, DEFAULT_UPDATE_SEED)
    }

    /// Creates a new sketch with the given `lg_k` and `seed`. A `seed` of
    /// zero is remapped to the default seed.
    ///
    /// # Panics
    ///
    /// Panics if `lg_k` is outside `[4, 26]`.
    pub fn with_seed(lg_k: u8, seed: u64) -> Self {
        assert!(
            (MIN_LG_K..=MAX_LG_K).contains(&lg_k),
            "lg_k out of range [{MIN_LG_K}, {MAX_LG_K}]; got {lg_k}"
        );
        Self::new_unchecked(lg_k, seed)
    }

    /// Fallible counterpart to [`CpcSketch::new`]: returns a
    /// `ConfigurationError` instead of panicking if `lg_k` is out of range.
    pub fn try_new(lg_k: u8) -> Result<Self, Error> {
        Self::try_with_seed(lg_k, DEFAULT_UPDATE_SEED)
    }

    /// Fallible counterpart to [`CpcSketch::with_seed`]: returns a
    /// `ConfigurationError` instead of panicking if `lg_k` is out of range.
    pub fn try_with_seed(lg_k: u8, seed: u64) -> Result<Self, Error> {
        if !(MIN_LG_K..=MAX_LG_K).contains(&lg_k) {
            return Err(Error::lg_k_out_of_range(lg_k, MIN_LG_K, MAX_LG_K));
        }
        Ok(Self::new_unchecked(lg_k, seed))
    }

    fn new_unchecked(lg_k: u8, seed: u64) -> Self {
        let seed = if seed == 0 { DEFAULT_UPDATE_SEED } else { seed };

        Self {
            lg_k,
            seed,
            num_coupons: 0,
            first_interesting_column: 0,
            merge_flag: false,
            kxp: (1u64 << lg_k) as f64,
            hip_est_accum: 0.0,
            storage: PhysicalStorage::Empty,
        }
    }

    /// Returns the parameter `lg_k`.
    pub fn lg_k(&self) -> u8 {
        self.lg_k
    }

    /// Returns `true` iff no items have been observed.
    pub fn is_empty(&self) -> bool {
        self.num_coupons == 0
    }

    /// Returns the sketch's current representational flavor.
    pub fn flavor(&self) -> Flavor {
        cpc::classify_flavor(self.lg_k, self.num_coupons)
    }

    /// Hashes a 64-bit integer into the sketch.
    pub fn update_i64(&mut self, value: i64) {
        self.ingest(&value.to_le_bytes());
    }

    /// Hashes an IEEE-754 double into the sketch.
    ///
    /// `-0.0` is canonicalized to `+0.0`, and any NaN bit pattern is
    /// canonicalized to `f64::NAN`'s, so that all negative zeros and all
    /// NaNs produce the same coupon.
    pub fn update_f64(&mut self, value: f64) {
        let canonical = if value == 0.0 {
            0.0
        } else if value.is_nan() {
            f64::NAN
        } else {
            value
        };
        self.ingest(&canonical.to_bits().to_le_bytes());
    }

    /// Hashes a UTF-8 string into the sketch. Empty strings are no-ops.
    pub fn update_str(&mut self, value: &str) {
        if value.is_empty() {
            return;
        }
        self.ingest(value.as_bytes());
    }

    /// Hashes a raw byte sequence into the sketch. Empty slices are no-ops.
    pub fn update_bytes(&mut self, value: &[u8]) {
        if value.is_empty() {
            return;
        }
        self.ingest(value);
    }

    /// Hashes a sequence of UTF-16 code units into the sketch, as raw native-
    /// endian bytes. Deliberately distinct from [`CpcSketch::update_str`]:
    /// the same logical text hashed as UTF-16 vs UTF-8 yields different
    /// coupons. Empty slices are no-ops.
    pub fn update_utf16(&mut self, value: &[u16]) {
        if value.is_empty() {
            return;
        }
        let mut bytes = Vec::with_capacity(value.len() * 2);
        for &unit in value {
            bytes.extend_from_slice(&unit.to_ne_bytes());
        }
        self.ingest(&bytes);
    }

    /// Hashes a sequence of 32-bit integers into the sketch, as their little-
    /// endian byte representation. Empty slices are no-ops.
    pub fn update_i32_slice(&mut self, value: &[i32]) {
        if value.is_empty() {
            return;
        }
        let mut bytes = Vec::with_capacity(value.len() * 4);
        for &v in value {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        self.ingest(&bytes);
    }

    /// Hashes a sequence of 64-bit integers into the sketch, as their little-
    /// endian byte representation. Empty slices are no-ops.
    pub fn update_i64_slice(&mut self, value: &[i64]) {
        if value.is_empty() {
            return;
        }
        let mut bytes = Vec::with_capacity(value.len() * 8);
        for &v in value {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        self.ingest(&bytes);
    }

    /// Returns the best available estimate of the sketch's cardinality.
    pub fn estimate(&self) -> f64 {
        if self.merge_flag {
            icon_estimate(self.lg_k, self.num_coupons)
        } else {
            self.hip_est_accum
        }
    }

    /// Returns the lower bound of the `kappa`-sigma confidence interval.
    pub fn lower_bound(&self, kappa: NumStdDev) -> f64 {
        if self.merge_flag {
            cpc_confidence::icon_confidence_lb(self.lg_k, self.num_coupons, kappa)
        } else {
            cpc_confidence::hip_confidence_lb(self.lg_k, self.num_coupons, self.hip_est_accum, kappa)
        }
    }

    /// Returns the upper bound of the `kappa`-sigma confidence interval.
    pub fn upper_bound(&self, kappa: NumStdDev) -> f64 {
        if self.merge_flag {
            cpc_confidence::icon_confidence_ub(self.lg_k, self.num_coupons, kappa)
        } else {
            cpc_confidence::get_hip_confidence_ub(
                self.lg_k,
                self.num_coupons,
                self.hip_est_accum,
                kappa,
            )
        }
    }

    /// Resets the sketch to empty, keeping `lg_k` and `seed`.
    pub fn reset(&mut self) {
        self.num_coupons = 0;
        self.first_interesting_column = 0;
        self.merge_flag = false;
        self.kxp = (1u64 << self.lg_k) as f64;
        self.hip_est_accum = 0.0;
        self.storage = PhysicalStorage::Empty;
    }

    /// Returns a deep copy; mutating the copy never affects `self` or vice versa.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Captures an uncompressed snapshot of all live state.
    pub fn snapshot(&self) -> Snapshot {
        let (sliding_window, table) = match &self.storage {
            PhysicalStorage::Empty => (None, None),
            PhysicalStorage::Sparse { table } => (None, Some(table.iter().collect())),
            PhysicalStorage::Dense {
                sliding_window,
                table,
                ..
            } => (Some(sliding_window.clone()), Some(table.iter().collect())),
        };
        let window_offset = match &self.storage {
            PhysicalStorage::Dense { window_offset, .. } => *window_offset,
            _ => 0,
        };

        Snapshot {
            lg_k: self.lg_k,
            seed_hash: compute_seed_hash(self.seed),
            num_coupons: self.num_coupons,
            window_offset,
            first_interesting_column: self.first_interesting_column,
            merge_flag: self.merge_flag,
            kxp: self.kxp,
            hip_est_accum: self.hip_est_accum,
            sliding_window,
            pair_table: table,
        }
    }

    /// Reconstructs a sketch from a snapshot produced by
    /// [`CpcSketch::snapshot`], validating it against `seed`.
    pub fn from_snapshot(snapshot: Snapshot, seed: u64) -> Result<Self, Error> {
        let expected_seed_hash = compute_seed_hash(seed);
        if snapshot.seed_hash != expected_seed_hash {
            return Err(Error::seed_mismatch(expected_seed_hash, snapshot.seed_hash));
        }
        assert!(
            (MIN_LG_K..=MAX_LG_K).contains(&snapshot.lg_k),
            "snapshot lg_k out of range; got {}",
            snapshot.lg_k
        );

        let lg_size_max = 6 + snapshot.lg_k;
        let storage = match (snapshot.sliding_window, snapshot.pair_table) {
            (None, None) => PhysicalStorage::Empty,
            (None, Some(entries)) => {
                let mut table = PairTable::new(lg_size_max);
                for rc in entries {
                    table.maybe_insert(rc);
                }
                PhysicalStorage::Sparse { table }
            }
            (Some(sliding_window), entries) => {
                let mut table = PairTable::new(lg_size_max);
                for rc in entries.into_iter().flatten() {
                    table.maybe_insert(rc);
                }
                PhysicalStorage::Dense {
                    window_offset: snapshot.window_offset,
                    sliding_window,
                    table,
                }
            }
        };

        Ok(Self {
            lg_k: snapshot.lg_k,
            seed,
            num_coupons: snapshot.num_coupons,
            first_interesting_column: snapshot.first_interesting_column,
            merge_flag: snapshot.merge_flag,
            kxp: snapshot.kxp,
            hip_est_accum: snapshot.hip_est_accum,
            storage,
        })
    }

    fn ingest(&mut self, bytes: &[u8]) {
        let mut hasher = MurmurHash3X64128::with_seed(self.seed);
        hasher.write(bytes);
        let (h0, h1) = hasher.finish128();
        self.process_hash(h0, h1);
    }

    fn process_hash(&mut self, h0: u64, h1: u64) {
        let k = 1u64 << self.lg_k;
        let row = (h0 & (k - 1)) as u32;
        let col = (h1.leading_zeros() as u8).min(63);

        if col < self.first_interesting_column {
            return;
        }

        let rc = encode_coupon(row, col);
        self.route_coupon(rc, col);
    }

    fn route_coupon(&mut self, rc: u32, col: u8) {
        let k = 1u64 << self.lg_k;

        if matches!(self.storage, PhysicalStorage::Empty) {
            self.storage = PhysicalStorage::Sparse {
                table: PairTable::new(6 + self.lg_k),
            };
        }

        let is_novel = match &mut self.storage {
            PhysicalStorage::Empty => unreachable!("promoted out of Empty above"),
            PhysicalStorage::Sparse { table } => table.maybe_insert(rc),
            PhysicalStorage::Dense {
                window_offset,
                sliding_window,
                table,
            } => {
                let w = *window_offset;
                if col < w {
                    // Early zone: the table holds *surprising zeros*, so a
                    // present entry means the bit is actually 0. Deleting it
                    // flips the bit to 1 -- a novel coupon.
                    table.maybe_delete(rc)
                } else if col < w + 8 {
                    let row = coupon_row(rc) as usize;
                    let bit = 1u8 << (col - w);
                    let was_set = sliding_window[row] & bit != 0;
                    if !was_set {
                        sliding_window[row] |= bit;
                    }
                    !was_set
                } else {
                    // Late zone: the table holds *surprising ones*, normal
                    // insert semantics.
                    table.maybe_insert(rc)
                }
            }
        };

        if !is_novel {
            return;
        }

        self.num_coupons += 1;
        hip::update_hip(&mut self.kxp, &mut self.hip_est_accum, k, col);

        match &self.storage {
            PhysicalStorage::Sparse { .. } => {
                if 32 * self.num_coupons >= 3 * k {
                    self.promote_sparse_to_windowed();
                }
            }
            PhysicalStorage::Dense { window_offset, .. } => {
                let correct = cpc::correct_offset(self.lg_k, self.num_coupons);
                if correct > *window_offset {
                    self.modify_offset(correct);
                }
            }
            PhysicalStorage::Empty => unreachable!(),
        }
    }

    /// Allocates a fresh sliding window and pair table, moving every coupon
    /// below column 8 into the window and the rest into the new table.
    fn promote_sparse_to_windowed(&mut self) {
        let k = 1usize << self.lg_k;
        let PhysicalStorage::Sparse { table: old_table } =
            std::mem::replace(&mut self.storage, PhysicalStorage::Empty)
        else {
            unreachable!("promotion only runs from Sparse");
        };

        let mut sliding_window = vec![0u8; k];
        let mut new_table = PairTable::new(6 + self.lg_k);
        for rc in old_table.iter() {
            let row = coupon_row(rc) as usize;
            let col = coupon_col(rc);
            if col < 8 {
                sliding_window[row] |= 1u8 << col;
            } else {
                let inserted = new_table.maybe_insert(rc);
                assert!(inserted, "coupon moved from a set cannot already be present");
            }
        }

        self.storage = PhysicalStorage::Dense {
            window_offset: 0,
            sliding_window,
            table: new_table,
        };
    }

    /// Shifts the sliding window forward to `new_offset` (possibly several
    /// columns at once), rewriting the whole matrix in `O(K)`. `kxp` is
    /// refreshed exactly whenever the shift crosses a multiple-of-8 boundary,
    /// matching the byte-lookup table's granularity.
    fn modify_offset(&mut self, new_offset: u8) {
        debug_assert_eq!(new_offset, cpc::correct_offset(self.lg_k, self.num_coupons));

        let PhysicalStorage::Dense {
            window_offset,
            sliding_window,
            table,
        } = &mut self.storage
        else {
            unreachable!("window shift only runs from Dense storage");
        };
        debug_assert!(new_offset > *window_offset);
        let old_offset = *window_offset;

        let matrix = bit_matrix::reconstruct(
            self.lg_k,
            old_offset,
            Some(sliding_window.as_slice()),
            Some(&*table),
        );

        if new_offset / 8 != old_offset / 8 {
            self.kxp = hip::refresh_kxp(&matrix);
        }

        let PhysicalStorage::Dense {
            window_offset,
            sliding_window,
            table,
        } = &mut self.storage
        else {
            unreachable!("window shift only runs from Dense storage");
        };

        table.clear();
        let early_zone_mask = (1u64 << new_offset) - 1;
        let window_mask = !(0xFFu64 << new_offset);
        let mut running_or = 0u64;

        for (row, window_byte) in sliding_window.iter_mut().enumerate() {
            let row_pattern = matrix[row];
            *window_byte = ((row_pattern >> new_offset) & 0xFF) as u8;

            // Strip the window bits, then flip the early zone so a stored
            // "surprising 0" becomes a present 1 in the residual mask.
            let residual = (row_pattern & window_mask) ^ early_zone_mask;
            running_or |= residual;

            let mut remaining = residual;
            while remaining != 0 {
                let col = remaining.trailing_zeros() as u8;
                let rc = encode_coupon(row as u32, col);
                let inserted = table.maybe_insert(rc);
                debug_assert!(inserted, "residual bit must be a fresh surprising value");
                remaining &= remaining - 1;
            }
        }

        self.first_interesting_column = (running_or.trailing_zeros() as u8).min(new_offset);
        *window_offset = new_offset;
    }
}
