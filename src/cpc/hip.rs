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

//! The Historic Inverse Probability (HIP) register: `kxp` and `hipEstAccum`,
//! updated incrementally on every novel coupon and periodically refreshed
//! exactly from the full bit matrix.

use std::sync::LazyLock;

/// `kxpByteLookup[b] = sum over bits set in b of 2^-(bit_index + 1)`, the
/// contribution of one matrix byte to the `kxp` register. Computed once,
/// process-wide, on first use.
pub(crate) static KXP_BYTE_LOOKUP: LazyLock<[f64; 256]> = LazyLock::new(|| {
    let mut table = [0.0f64; 256];
    for (byte, slot) in table.iter_mut().enumerate() {
        let mut sum = 0.0;
        for bit in 0..8u32 {
            if byte & (1 << bit) != 0 {
                sum += 2f64.powi(-((bit + 1) as i32));
            }
        }
        *slot = sum;
    }
    table
});

/// Applies the HIP update rule for one novel coupon observed in column `col`.
pub(crate) fn update_hip(kxp: &mut f64, hip_est_accum: &mut f64, k: u64, col: u8) {
    *hip_est_accum += k as f64 / *kxp;
    *kxp -= 2f64.powi(-((col as i32) + 1));
}

/// Recomputes `kxp` exactly from the full bit matrix.
///
/// Sums each row's 8 byte-partial sums in order of increasing magnitude
/// (most-significant byte, weight `2^-56`, first) so that the largest
/// partial sum (weight `1`) is added last, minimizing precision loss versus
/// building the total top-down.
pub(crate) fn refresh_kxp(matrix: &[u64]) -> f64 {
    let mut byte_sums = [0f64; 8];
    for &row in matrix {
        for (j, sum) in byte_sums.iter_mut().enumerate() {
            let byte = ((row >> (8 * j)) & 0xFF) as usize;
            *sum += KXP_BYTE_LOOKUP[byte];
        }
    }

    let mut total = 0.0;
    for j in (0..8).rev() {
        total += byte_sums[j] * 2f64.powi(-8 * j as i32);
    }
    total
}
