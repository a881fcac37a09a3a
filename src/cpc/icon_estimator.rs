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

//! Offline cardinality estimator for merged sketches: a pure function of
//! `(lgK, numCoupons)`, used whenever `mergeFlag` is set and HIP's
//! incremental accumulator is no longer meaningful.

const MAX_BISECTION_ITERATIONS: u32 = 200;

/// The expected number of set bits in the `k x 64` matrix after `n` distinct
/// items have been hashed in, as a closed-form sum over the 64 column
/// selection probabilities.
fn expected_num_coupons(lg_k: u8, n: f64) -> f64 {
    let k = (1u64 << lg_k) as f64;
    let mut total = 0.0;
    for j in 0..64u32 {
        let p = if j < 63 {
            2f64.powi(-((j + 1) as i32))
        } else {
            2f64.powi(-63)
        };
        total += 1.0 - (1.0 - p / k).powf(n);
    }
    k * total
}

/// Inverts `expected_num_coupons` by bisection: returns the `n` for which
/// the generating function's expectation equals `num_coupons`.
///
/// `expected_num_coupons` is strictly increasing and bounded above by
/// `k * 64` (the matrix's capacity), so any observed `num_coupons` has a
/// unique, well-conditioned root.
pub(crate) fn icon_estimate(lg_k: u8, num_coupons: u64) -> f64 {
    if num_coupons == 0 {
        return 0.0;
    }

    let k = 1u64 << lg_k;
    let target = num_coupons as f64;

    let mut lo = 0.0f64;
    let mut hi = (k as f64) * 64.0 * 4.0;
    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = lo + (hi - lo) / 2.0;
        if expected_num_coupons(lg_k, mid) < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo + (hi - lo) / 2.0
}
