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
use aarch64_cpu::asm::barrier;
use aarch64_cpu::registers::{Readable, Writeable, DAIF};

use super::cpu::this_cpu_id;
use super::sysreg;
use crate::arch::cpuid_to_mpidr;
use crate::device::irqchip::gicv3::hal::{GicHal, IccReg};
use crate::memory::{mmio_read32, mmio_write32, mmio_write8, MmioOps};

/// GIC access from the core itself: device memory and ICC system registers.
///
/// The GIC frames must be mapped as device memory at their physical address.
pub struct ArchGicHal {
    cpus_per_cluster: usize,
}

impl ArchGicHal {
    pub const fn new(cpus_per_cluster: usize) -> Self {
        Self { cpus_per_cluster }
    }
}

impl MmioOps for ArchGicHal {
    fn read32(&self, addr: usize) -> u32 {
        unsafe { mmio_read32(addr) }
    }

    fn write32(&self, addr: usize, val: u32) {
        unsafe { mmio_write32(addr, val) }
    }

    fn write8(&self, addr: usize, val: u8) {
        unsafe { mmio_write8(addr, val) }
    }
}

impl GicHal for ArchGicHal {
    fn cpu_id(&self) -> usize {
        this_cpu_id(self.cpus_per_cluster)
    }

    fn cpu_mpidr(&self, cpu: usize) -> u64 {
        cpuid_to_mpidr(cpu, self.cpus_per_cluster)
    }

    fn read_icc(&self, reg: IccReg) -> u64 {
        sysreg::read_icc(reg)
    }

    fn write_icc(&self, reg: IccReg, val: u64) {
        sysreg::write_icc(reg, val)
    }

    fn dsb(&self) {
        barrier::dsb(barrier::SY);
    }

    fn isb(&self) {
        barrier::isb(barrier::SY);
    }

    fn irq_save(&self) -> usize {
        let flags = DAIF.get();
        unsafe { core::arch::asm!("msr daifset, #3", options(nostack)) };
        flags as usize
    }

    fn irq_restore(&self, flags: usize) {
        DAIF.set(flags as u64);
    }
}
