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
use aarch64_cpu::registers::{Readable, MPIDR_EL1};

use crate::arch::{mpidr_to_cpuid, MPIDR_AFFINITY_MASK};

pub fn this_cpu_mpidr() -> u64 {
    MPIDR_EL1.get() & MPIDR_AFFINITY_MASK
}

/// Logical id of the executing core on a board with `cpus_per_cluster`
/// cores per cluster.
pub fn this_cpu_id(cpus_per_cluster: usize) -> usize {
    mpidr_to_cpuid(this_cpu_mpidr(), cpus_per_cluster)
}
