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
//! MPIDR affinity arithmetic, plus the aarch64 hardware backend.
#[cfg(target_arch = "aarch64")]
pub mod aarch64;

#[cfg(target_arch = "aarch64")]
pub use aarch64::*;

/// Aff3 | Aff2 | Aff1 | Aff0 bits of MPIDR_EL1.
pub const MPIDR_AFFINITY_MASK: u64 = 0xff_00ff_ffff;

/// Affinity field `level` (0..=3) of `mpidr`.
pub fn mpidr_afflvl(mpidr: u64, level: u32) -> u64 {
    let shift = if level == 3 { 32 } else { level * 8 };
    (mpidr >> shift) & 0xff
}

/// MPIDR of logical core `cpu` on a board with `cpus_per_cluster` cores per Aff1.
pub fn cpuid_to_mpidr(cpu: usize, cpus_per_cluster: usize) -> u64 {
    let aff0 = (cpu % cpus_per_cluster) as u64;
    let cluster = (cpu / cpus_per_cluster) as u64;
    let aff1 = cluster & 0xff;
    let aff2 = (cluster >> 8) & 0xff;
    (aff2 << 16) | (aff1 << 8) | aff0
}

/// Inverse of [`cpuid_to_mpidr`].
pub fn mpidr_to_cpuid(mpidr: u64, cpus_per_cluster: usize) -> usize {
    let cluster = (mpidr_afflvl(mpidr, 2) << 8) | mpidr_afflvl(mpidr, 1);
    cluster as usize * cpus_per_cluster + mpidr_afflvl(mpidr, 0) as usize
}

/// The 32-bit affinity GICR_TYPER.Affinity_Value reports for `mpidr`.
pub fn mpidr_to_typer_affinity(mpidr: u64) -> u32 {
    ((mpidr_afflvl(mpidr, 3) << 24)
        | (mpidr_afflvl(mpidr, 2) << 16)
        | (mpidr_afflvl(mpidr, 1) << 8)
        | mpidr_afflvl(mpidr, 0)) as u32
}
