// Copyright (c) 2025 Syswonder
// hvisor is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//     http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR
// FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.
//
// Syswonder Website:
//      https://www.syswonder.org
//
// Authors:
//
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::consts::MAX_CPU_NUM;
use crate::error::GicResult;

/// A set of logical cpu ids, lowest id first when iterated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSet {
    max_cpu_id: usize,
    bitmap: u64,
}

impl CpuSet {
    pub fn new(max_cpu_id: usize, bitmap: u64) -> Self {
        let max_cpu_id = max_cpu_id.min(63);
        let valid = if max_cpu_id == 63 {
            u64::MAX
        } else {
            (1u64 << (max_cpu_id + 1)) - 1
        };
        Self {
            max_cpu_id,
            bitmap: bitmap & valid,
        }
    }

    pub fn empty() -> Self {
        Self::new(MAX_CPU_NUM - 1, 0)
    }

    pub fn from_mask(bitmap: u64) -> Self {
        Self::new(MAX_CPU_NUM - 1, bitmap)
    }

    pub fn single(cpu: usize) -> Self {
        let mut set = Self::empty();
        set.set_bit(cpu);
        set
    }

    pub fn set_bit(&mut self, id: usize) {
        if id <= self.max_cpu_id {
            self.bitmap |= 1 << id;
        }
    }

    pub fn clear_bit(&mut self, id: usize) {
        if id <= self.max_cpu_id {
            self.bitmap &= !(1 << id);
        }
    }

    pub fn contains_cpu(&self, id: usize) -> bool {
        id <= self.max_cpu_id && (self.bitmap & (1 << id)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bitmap == 0
    }

    pub fn bitmap(&self) -> u64 {
        self.bitmap
    }

    pub fn first_cpu(&self) -> Option<usize> {
        if self.bitmap == 0 {
            None
        } else {
            Some(self.bitmap.trailing_zeros() as usize)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..=self.max_cpu_id).filter(move |&i| self.contains_cpu(i))
    }
}

/// Redistributor base of every core.
///
/// A slot is written by its owning core during that core's bring-up and read
/// back only by the same core, so the table needs no lock. The API only ever
/// takes the caller's own cpu id, which the driver gets from the executing
/// core, never from an argument.
#[derive(Debug)]
pub struct RedistTable {
    bases: [AtomicUsize; MAX_CPU_NUM],
}

impl RedistTable {
    pub const fn new() -> Self {
        const EMPTY: AtomicUsize = AtomicUsize::new(0);
        Self {
            bases: [EMPTY; MAX_CPU_NUM],
        }
    }

    /// Record the redistributor of the executing core `this_cpu`.
    pub(crate) fn record_this_cpu(&self, this_cpu: usize, base: usize) -> GicResult {
        match self.bases.get(this_cpu) {
            Some(slot) => {
                slot.store(base, Ordering::Release);
                Ok(())
            }
            None => gic_result_err!(ENODEV, "cpu id beyond the redistributor table"),
        }
    }

    /// Redistributor of the executing core `this_cpu`, None if it never came up.
    pub(crate) fn this_cpu(&self, this_cpu: usize) -> Option<usize> {
        self.bases
            .get(this_cpu)
            .map(|slot| slot.load(Ordering::Acquire))
            .filter(|&base| base != 0)
    }
}

impl Default for RedistTable {
    fn default() -> Self {
        Self::new()
    }
}
