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

use cpc_sketch::cpc::{CpcSketch, Flavor};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn empty_sketch_estimates_zero() {
    let sketch = CpcSketch::new(11);
    assert_eq!(sketch.estimate(), 0.0);
    assert_eq!(sketch.flavor(), Flavor::Empty);
}

#[test]
fn ten_distinct_longs_land_in_sparse_with_positive_hip() {
    let mut sketch = CpcSketch::new(11);
    for i in 0..10i64 {
        sketch.update_i64(i);
    }
    // Collisions are permitted but vanishingly unlikely at K = 2048.
    let estimate = sketch.estimate().round() as i64;
    assert!((9..=10).contains(&estimate), "estimate = {estimate}");
    assert_eq!(sketch.flavor(), Flavor::Sparse);
    assert!(sketch.estimate() > 0.0);
}

#[test]
fn small_k_reaches_sliding_after_enough_distinct_inputs() {
    let mut sketch = CpcSketch::new(4); // K = 16
    for i in 0..200i64 {
        sketch.update_i64(i);
    }
    assert_eq!(sketch.flavor(), Flavor::Sliding);
}

#[test]
fn hundred_thousand_distinct_longs_estimate_within_five_percent() {
    let mut sketch = CpcSketch::new(11);
    for i in 0..100_000i64 {
        sketch.update_i64(i);
    }
    let estimate = sketch.estimate();
    let relative_error = (estimate - 100_000.0).abs() / 100_000.0;
    assert!(relative_error < 0.05, "relative_error = {relative_error}");
}

#[test]
fn empty_values_are_no_ops() {
    let mut sketch = CpcSketch::new(11);
    sketch.update_str("");
    sketch.update_bytes(&[]);
    sketch.update_i64_slice(&[]);
    assert_eq!(sketch.estimate(), 0.0);
}

#[test]
fn zero_and_nan_canonicalize_to_the_same_coupon() {
    let mut sketch = CpcSketch::new(11);
    sketch.update_f64(0.0);
    sketch.update_f64(-0.0);
    sketch.update_f64(f64::NAN);
    sketch.update_f64(-f64::NAN);
    assert_eq!(sketch.estimate(), 1.0);
}

#[test]
fn copy_then_diverge_leaves_copy_untouched() {
    let mut a = CpcSketch::new(11);
    for i in 0..500i64 {
        a.update_i64(i);
    }
    let copy = a.copy();
    let copy_estimate = copy.estimate();
    for i in 500..1000i64 {
        a.update_i64(i);
    }
    assert_eq!(copy.estimate(), copy_estimate);
    assert!(a.estimate() > copy.estimate());
}

/// Property test: across many random streams and several `lgK` values,
/// `numCoupons` only ever increases (novelty-gated), and re-feeding the same
/// stream is idempotent on the resulting estimate.
#[test]
fn idempotence_across_random_streams() {
    let mut rng = StdRng::seed_from_u64(20240615);
    for lg_k in [4u8, 6, 8, 11] {
        let values: Vec<i64> = (0..2000).map(|_| rng.random_range(0..5000)).collect();

        let mut once = CpcSketch::new(lg_k);
        for &v in &values {
            once.update_i64(v);
        }
        let once_estimate = once.estimate();

        let mut twice = CpcSketch::new(lg_k);
        for &v in &values {
            twice.update_i64(v);
        }
        for &v in &values {
            twice.update_i64(v);
        }
        assert_eq!(twice.estimate(), once_estimate, "lg_k = {lg_k}");
    }
}

/// Property test: `hipEstAccum` (exposed through `estimate()` while
/// streaming) never decreases as more items are fed in.
#[test]
fn hip_estimate_is_monotonic_across_random_streams() {
    let mut rng = StdRng::seed_from_u64(987654321);
    for lg_k in [4u8, 8, 11] {
        let mut sketch = CpcSketch::new(lg_k);
        let mut last = 0.0;
        for _ in 0..3000 {
            let v: i64 = rng.random();
            sketch.update_i64(v);
            let estimate = sketch.estimate();
            assert!(estimate >= last, "lg_k = {lg_k}");
            last = estimate;
        }
    }
}
