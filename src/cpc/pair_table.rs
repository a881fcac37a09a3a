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

//! Open-addressed set of 32-bit coupons, with growth and backward-shift deletion.

const SENTINEL: u32 = u32::MAX;
const LG_SIZE_INIT: u8 = 2;

/// Table grows once it's more than 3/4 full.
const LOAD_FACTOR_NUMERATOR: usize = 3;
const LOAD_FACTOR_DENOMINATOR: usize = 4;

/// Open-addressed set of "coupons" -- `(row << 6) | col` pairs encoded as
/// `u32` -- used both as the sole store in the sparse flavor and as the
/// surprising-value side table once a sliding window is in play.
///
/// `rc == u32::MAX` is reserved as the empty-slot sentinel; callers must
/// remap the one coupon that collides with it before inserting (see
/// `cpc::encode_coupon`).
#[derive(Clone, Debug)]
pub(crate) struct PairTable {
    lg_size: u8,
    lg_size_max: u8,
    num_entries: usize,
    slots: Vec<u32>,
}

impl PairTable {
    /// Creates an empty table, sized `lgSizeInit = 2`, capped at `lg_size_max`.
    pub fn new(lg_size_max: u8) -> Self {
        Self::with_lg_size(LG_SIZE_INIT.min(lg_size_max), lg_size_max)
    }

    fn with_lg_size(lg_size: u8, lg_size_max: u8) -> Self {
        assert!(lg_size <= lg_size_max, "lg_size must be <= lg_size_max");
        Self {
            lg_size,
            lg_size_max,
            num_entries: 0,
            slots: vec![SENTINEL; 1usize << lg_size],
        }
    }

    /// Number of coupons currently stored.
    pub fn len(&self) -> usize {
        self.num_entries
    }

    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    /// Resets to the initial empty state, discarding all entries.
    pub fn clear(&mut self) {
        *self = Self::with_lg_size(LG_SIZE_INIT.min(self.lg_size_max), self.lg_size_max);
    }

    /// Iterates over all stored coupons, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots.iter().copied().filter(|&v| v != SENTINEL)
    }

    /// Inserts `rc` if not already present.
    ///
    /// Returns `true` iff this was a novel insertion.
    pub fn maybe_insert(&mut self, rc: u32) -> bool {
        debug_assert_ne!(rc, SENTINEL, "coupon collides with the empty-slot sentinel");
        let index = Self::find_slot(&self.slots, self.lg_size, rc);
        if self.slots[index] == rc {
            return false;
        }
        self.slots[index] = rc;
        self.num_entries += 1;
        self.maybe_grow();
        true
    }

    /// Removes `rc` if present, using backward-shift deletion so that later
    /// entries on the same probe sequence stay reachable.
    ///
    /// Returns `true` iff `rc` was present.
    pub fn maybe_delete(&mut self, rc: u32) -> bool {
        debug_assert_ne!(rc, SENTINEL, "coupon collides with the empty-slot sentinel");
        let start = Self::find_slot(&self.slots, self.lg_size, rc);
        if self.slots[start] != rc {
            return false;
        }
        self.slots[start] = SENTINEL;
        self.num_entries -= 1;

        let mask = (1usize << self.lg_size) - 1;
        let mut hole = start;
        let mut probe = (hole + 1) & mask;
        while self.slots[probe] != SENTINEL {
            let home = Self::probe_start(self.slots[probe], self.lg_size);
            // `table[probe]` can fill `hole` unless its natural probe
            // sequence would pass over `hole` on the way to `probe` (in
            // which case it must stay reachable from further back).
            let blocked = if hole <= probe {
                home > hole && home <= probe
            } else {
                home > hole || home <= probe
            };
            if !blocked {
                self.slots[hole] = self.slots[probe];
                self.slots[probe] = SENTINEL;
                hole = probe;
            }
            probe = (probe + 1) & mask;
        }
        true
    }

    fn probe_start(rc: u32, lg_size: u8) -> usize {
        // Fibonacci hashing: multiply by the odd 32-bit approximation of the
        // golden ratio and take the high `lg_size` bits, which spreads
        // adjacent `rc` values (common since row/col are small integers)
        // across the table.
        const GOLDEN: u32 = 0x9E37_79B1;
        let shift = 32 - lg_size;
        (rc.wrapping_mul(GOLDEN) >> shift) as usize
    }

    /// Probes for `rc`, returning either its slot or the first empty slot on
    /// its probe sequence.
    fn find_slot(slots: &[u32], lg_size: u8, rc: u32) -> usize {
        let mask = (1usize << lg_size) - 1;
        let mut index = Self::probe_start(rc, lg_size);
        loop {
            let entry = slots[index];
            if entry == SENTINEL || entry == rc {
                return index;
            }
            index = (index + 1) & mask;
        }
    }

    fn maybe_grow(&mut self) {
        let capacity = self.slots.len();
        if self.lg_size < self.lg_size_max
            && self.num_entries * LOAD_FACTOR_DENOMINATOR > capacity * LOAD_FACTOR_NUMERATOR
        {
            self.grow();
        }
    }

    fn grow(&mut self) {
        let new_lg_size = (self.lg_size + 1).min(self.lg_size_max);
        let new_slots = vec![SENTINEL; 1usize << new_lg_size];
        let old_slots = std::mem::replace(&mut self.slots, new_slots);
        self.lg_size = new_lg_size;
        for rc in old_slots.into_iter().filter(|&v| v != SENTINEL) {
            let index = Self::find_slot(&self.slots, self.lg_size, rc);
            debug_assert_eq!(self.slots[index], SENTINEL);
            self.slots[index] = rc;
        }
    }
}
