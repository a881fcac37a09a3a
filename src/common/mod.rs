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

//! Shared types used across sketch implementations.

/// The number of standard deviations used to express a confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumStdDev {
    /// ~68.3% confidence.
    One,
    /// ~95.4% confidence.
    Two,
    /// ~99.7% confidence.
    Three,
}

impl NumStdDev {
    /// Returns the numeric kappa value (1, 2, or 3).
    pub fn as_u8(self) -> u8 {
        match self {
            NumStdDev::One => 1,
            NumStdDev::Two => 2,
            NumStdDev::Three => 3,
        }
    }
}
