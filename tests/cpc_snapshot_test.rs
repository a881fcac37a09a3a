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

use cpc_sketch::cpc::CpcSketch;
use cpc_sketch::error::ErrorKind;
use cpc_sketch::hash::DEFAULT_UPDATE_SEED;
use googletest::assert_that;
use googletest::prelude::eq;

#[test]
fn empty_sketch_round_trips() {
    let sketch = CpcSketch::new(11);
    let bytes = sketch.snapshot().to_bytes();
    let restored = cpc_sketch::cpc::Snapshot::from_bytes(&bytes, DEFAULT_UPDATE_SEED).unwrap();
    let restored = CpcSketch::from_snapshot(restored, DEFAULT_UPDATE_SEED).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.estimate(), 0.0);
}

#[test]
fn sparse_sketch_round_trips() {
    let mut sketch = CpcSketch::with_seed(11, 555);
    for i in 0..20i64 {
        sketch.update_i64(i);
    }
    let bytes = sketch.snapshot().to_bytes();
    let restored = cpc_sketch::cpc::Snapshot::from_bytes(&bytes, 555).unwrap();
    let restored = CpcSketch::from_snapshot(restored, 555).unwrap();
    assert_that!(restored.flavor(), eq(sketch.flavor()));
    assert_that!(restored.estimate(), eq(sketch.estimate()));
}

#[test]
fn windowed_sketch_round_trips() {
    let mut sketch = CpcSketch::with_seed(4, 777);
    for i in 0..300i64 {
        sketch.update_i64(i);
    }
    let bytes = sketch.snapshot().to_bytes();
    let restored = cpc_sketch::cpc::Snapshot::from_bytes(&bytes, 777).unwrap();
    let restored = CpcSketch::from_snapshot(restored, 777).unwrap();
    assert_that!(restored.flavor(), eq(sketch.flavor()));
    assert_that!(restored.estimate(), eq(sketch.estimate()));
}

#[test]
fn mismatched_seed_is_rejected_at_the_byte_layer() {
    let mut sketch = CpcSketch::with_seed(8, 111);
    sketch.update_i64(1);
    let bytes = sketch.snapshot().to_bytes();
    let result = cpc_sketch::cpc::Snapshot::from_bytes(&bytes, 222);
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().kind(), ErrorKind::SeedMismatch);
}

#[test]
fn from_snapshot_also_rejects_mismatched_seed() {
    let mut sketch = CpcSketch::with_seed(8, 111);
    sketch.update_i64(1);
    let snap = sketch.snapshot();
    let err = CpcSketch::from_snapshot(snap, 999).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SeedMismatch);
}
