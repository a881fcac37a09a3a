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

//! The uncompressed codec boundary. `Snapshot` carries exactly the fields a
//! `CpcSketch` needs to be fully reconstructed, without the Golomb-Rice
//! compression layer used for wire persistence.

use crate::codec::{SketchBytes, SketchSlice};
use crate::error::Error;
use crate::hash::compute_seed_hash;

const HAS_WINDOW_FLAG: u8 = 1;
const HAS_TABLE_FLAG: u8 = 1;

/// Everything needed to reconstruct a `CpcSketch`, in uncompressed form.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub(crate) lg_k: u8,
    pub(crate) seed_hash: u16,
    pub(crate) num_coupons: u64,
    pub(crate) window_offset: u8,
    pub(crate) first_interesting_column: u8,
    pub(crate) merge_flag: bool,
    pub(crate) kxp: f64,
    pub(crate) hip_est_accum: f64,
    pub(crate) sliding_window: Option<Vec<u8>>,
    pub(crate) pair_table: Option<Vec<u32>>,
}

impl Snapshot {
    /// Serializes this snapshot to an uncompressed byte buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = SketchBytes::new();
        buf.write_u8(self.lg_k);
        buf.write_u16_le(self.seed_hash);
        buf.write_u64_le(self.num_coupons);
        buf.write_u8(self.window_offset);
        buf.write_u8(self.first_interesting_column);
        buf.write_u8(self.merge_flag as u8);
        buf.write_f64_le(self.kxp);
        buf.write_f64_le(self.hip_est_accum);

        match &self.sliding_window {
            Some(window) => {
                buf.write_u8(HAS_WINDOW_FLAG);
                buf.write_u32_le(window.len() as u32);
                buf.write(window);
            }
            None => buf.write_u8(0),
        }

        match &self.pair_table {
            Some(entries) => {
                buf.write_u8(HAS_TABLE_FLAG);
                buf.write_u32_le(entries.len() as u32);
                for &rc in entries {
                    buf.write_u32_le(rc);
                }
            }
            None => buf.write_u8(0),
        }

        buf.into_bytes()
    }

    /// Deserializes a snapshot produced by [`Snapshot::to_bytes`], validating
    /// that it was produced with the same `seed` the caller supplies.
    pub fn from_bytes(bytes: &[u8], seed: u64) -> Result<Self, Error> {
        let mut cursor = SketchSlice::new(bytes);

        let lg_k = cursor
            .read_u8()
            .map_err(|e| Error::insufficient_data_of("lg_k", e))?;
        let seed_hash = cursor
            .read_u16_le()
            .map_err(|e| Error::insufficient_data_of("seed_hash", e))?;

        let expected_seed_hash = compute_seed_hash(seed);
        if seed_hash != expected_seed_hash {
            return Err(Error::seed_mismatch(expected_seed_hash, seed_hash));
        }

        let num_coupons = cursor
            .read_u64_le()
            .map_err(|e| Error::insufficient_data_of("num_coupons", e))?;
        let window_offset = cursor
            .read_u8()
            .map_err(|e| Error::insufficient_data_of("window_offset", e))?;
        let first_interesting_column = cursor
            .read_u8()
            .map_err(|e| Error::insufficient_data_of("first_interesting_column", e))?;
        let merge_flag = cursor
            .read_u8()
            .map_err(|e| Error::insufficient_data_of("merge_flag", e))?
            != 0;
        let kxp = cursor
            .read_f64_le()
            .map_err(|e| Error::insufficient_data_of("kxp", e))?;
        let hip_est_accum = cursor
            .read_f64_le()
            .map_err(|e| Error::insufficient_data_of("hip_est_accum", e))?;

        let has_window = cursor
            .read_u8()
            .map_err(|e| Error::insufficient_data_of("has_window", e))?;
        let sliding_window = if has_window != 0 {
            let len = cursor
                .read_u32_le()
                .map_err(|e| Error::insufficient_data_of("window_len", e))? as usize;
            let mut window = vec![0u8; len];
            cursor
                .read_exact(&mut window)
                .map_err(|e| Error::insufficient_data_of("window_bytes", e))?;
            Some(window)
        } else {
            None
        };

        let has_table = cursor
            .read_u8()
            .map_err(|e| Error::insufficient_data_of("has_table", e))?;
        let pair_table = if has_table != 0 {
            let len = cursor
                .read_u32_le()
                .map_err(|e| Error::insufficient_data_of("table_len", e))? as usize;
            let mut entries = Vec::with_capacity(len);
            for _ in 0..len {
                entries.push(
                    cursor
                        .read_u32_le()
                        .map_err(|e| Error::insufficient_data_of("table_entry", e))?,
                );
            }
            Some(entries)
        } else {
            None
        };

        Ok(Snapshot {
            lg_k,
            seed_hash,
            num_coupons,
            window_offset,
            first_interesting_column,
            merge_flag,
            kxp,
            hip_est_accum,
            sliding_window,
            pair_table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot {
            lg_k: 11,
            seed_hash: compute_seed_hash(crate::hash::DEFAULT_UPDATE_SEED),
            num_coupons: 42,
            window_offset: 0,
            first_interesting_column: 0,
            merge_flag: false,
            kxp: 2048.0,
            hip_est_accum: 42.5,
            sliding_window: None,
            pair_table: Some(vec![1, 2, 3]),
        }
    }

    #[test]
    fn round_trips_without_window() {
        let snap = sample();
        let bytes = snap.to_bytes();
        let decoded = Snapshot::from_bytes(&bytes, crate::hash::DEFAULT_UPDATE_SEED).unwrap();
        assert_eq!(snap, decoded);
    }

    #[test]
    fn round_trips_with_window() {
        let mut snap = sample();
        snap.window_offset = 16;
        snap.sliding_window = Some(vec![1, 2, 3, 4]);
        let bytes = snap.to_bytes();
        let decoded = Snapshot::from_bytes(&bytes, crate::hash::DEFAULT_UPDATE_SEED).unwrap();
        assert_eq!(snap, decoded);
    }

    #[test]
    fn wrong_seed_is_rejected() {
        let snap = sample();
        let bytes = snap.to_bytes();
        let err = Snapshot::from_bytes(&bytes, crate::hash::DEFAULT_UPDATE_SEED + 1).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::SeedMismatch);
    }

    #[test]
    fn truncated_bytes_are_rejected() {
        let snap = sample();
        let mut bytes = snap.to_bytes();
        bytes.truncate(5);
        assert!(Snapshot::from_bytes(&bytes, crate::hash::DEFAULT_UPDATE_SEED).is_err());
    }
}
