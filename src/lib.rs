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

//! Compressed Probabilistic Counting (CPC): a sub-linear cardinality
//! estimator for streams of arbitrary-order, possibly-duplicated updates.
//!
//! ```
//! use cpc_sketch::cpc::CpcSketch;
//!
//! let mut sketch = CpcSketch::new(11);
//! for i in 0..10_000i64 {
//!     sketch.update_i64(i);
//! }
//! let estimate = sketch.estimate();
//! assert!((estimate - 10_000.0).abs() / 10_000.0 < 0.1);
//! ```

pub mod common;
pub mod cpc;
pub mod error;
pub mod hash;

mod codec;
