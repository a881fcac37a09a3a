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

//! Reconstructs the logical `K x 64` bit matrix from sparse and windowed state.

use super::pair_table::PairTable;
use super::{coupon_col, coupon_row};

/// Builds the full bit matrix as one `u64` per row.
///
/// Every row starts at its zone default (the early zone, `[0, window_offset)`,
/// defaults to all 1's); the sliding window (if present) is OR'd in at
/// `window_offset`; each `pair_table` entry then flips its bit, turning the
/// zone default into the "surprising" value it actually represents.
pub(crate) fn reconstruct(
    lg_k: u8,
    window_offset: u8,
    sliding_window: Option<&[u8]>,
    pair_table: Option<&PairTable>,
) -> Vec<u64> {
    let k = 1usize << lg_k;
    let default_row = (1u64 << window_offset) - 1;
    let mut matrix = vec![default_row; k];

    if let Some(window) = sliding_window {
        for (row, &byte) in window.iter().enumerate() {
            matrix[row] |= (byte as u64) << window_offset;
        }
    }

    if let Some(table) = pair_table {
        for rc in table.iter() {
            let row = coupon_row(rc) as usize;
            let col = coupon_col(rc);
            matrix[row] ^= 1u64 << col;
        }
    }

    matrix
}
