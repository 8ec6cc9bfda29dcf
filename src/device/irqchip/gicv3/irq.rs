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
//! Per-interrupt control: enable, disable, priority, trigger, routing, group.
use super::gicd::GICD_LOCK;
use super::hal::GicHal;
use super::layout::{bit_is_set, with_bit, with_cfg, BitReg};
use super::{Gicv3, IntGroup, IntidKind, IrqFlags, GIC_PRI_MASK};
use crate::error::GicResult;
use crate::percpu::CpuSet;

impl<H: GicHal> Gicv3<H> {
    /// Classify `intid`, rejecting identifiers the distributor does not implement.
    pub fn check_intid(&self, intid: u32) -> GicResult<IntidKind> {
        let Some(kind) = IntidKind::of(intid) else {
            return gic_result_err!(EINVAL, "interrupt id out of range");
        };
        if let Some(info) = self.dist.get() {
            let implemented = match kind {
                IntidKind::Spi => intid < info.spi_end(),
                IntidKind::Espi => intid < info.espi_end(),
                IntidKind::Sgi | IntidKind::Ppi => true,
            };
            if !implemented {
                return gic_result_err!(EINVAL, "interrupt not implemented");
            }
        }
        Ok(kind)
    }

    /// Run `f` with local interrupts masked and the configuration lock held.
    fn with_gicd_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let flags = self.hal.irq_save();
        let ret = {
            let _guard = GICD_LOCK.lock();
            f()
        };
        self.hal.irq_restore(flags);
        ret
    }

    /// GICD_ICFGR needs a full 32-bit read-modify-write, so the update is
    /// serialized against other cores sharing the word.
    fn write_trigger(&self, intid: u32, flags: IrqFlags) {
        let (addr, shift) = self.int_regs(intid).cfg_reg();
        let edge = flags.contains(IrqFlags::TYPE_EDGE);
        self.with_gicd_lock(|| {
            let val = self.hal.read32(addr);
            self.hal.write32(addr, with_cfg(val, shift, edge));
        });
    }

    fn write_bit(&self, intid: u32, reg: BitReg) {
        let (addr, bit) = self.int_regs(intid).bit_reg(reg);
        self.hal.write32(addr, 1 << bit);
    }

    /// Disable `intid`, program its priority and, except for SGIs, its
    /// trigger type. The interrupt stays disabled.
    pub fn set_priority(&self, intid: u32, prio: u8, flags: IrqFlags) -> GicResult {
        let kind = self.check_intid(intid)?;
        self.write_bit(intid, BitReg::ClearEnable);
        self.wait_rwp(intid)?;

        self.hal.write8(
            self.int_regs(intid).prio_addr(),
            (prio as u32 & GIC_PRI_MASK) as u8,
        );

        if kind != IntidKind::Sgi {
            self.write_trigger(intid, flags);
        }
        Ok(())
    }

    /// Change only the priority byte.
    pub fn prioritize(&self, intid: u32, priority: u32) -> GicResult {
        self.check_intid(intid)?;
        if priority > 255 {
            return gic_result_err!(EINVAL, "priority above 255");
        }
        self.hal.write8(
            self.int_regs(intid).prio_addr(),
            (priority & GIC_PRI_MASK) as u8,
        );
        Ok(())
    }

    /// Edge or level for `intid`. SGIs have a fixed type and are rejected.
    pub fn set_trigger(&self, intid: u32, flags: IrqFlags) -> GicResult {
        if self.check_intid(intid)? == IntidKind::Sgi {
            return gic_result_err!(EINVAL, "SGI trigger type is fixed");
        }
        self.write_trigger(intid, flags);
        Ok(())
    }

    /// Enable `intid`. Shared interrupts are first routed to the executing core.
    pub fn enable(&self, intid: u32) -> GicResult {
        if self.check_intid(intid)?.is_shared() {
            self.write_irouter(intid, self.hal.cpu_mpidr(self.hal.cpu_id()));
        }
        self.write_bit(intid, BitReg::SetEnable);
        trace!("irq {} enabled", intid);
        Ok(())
    }

    /// Disable `intid`; on return the GIC no longer forwards it.
    pub fn disable(&self, intid: u32) -> GicResult {
        self.check_intid(intid)?;
        self.write_bit(intid, BitReg::ClearEnable);
        self.wait_rwp(intid)
    }

    pub fn is_enabled(&self, intid: u32) -> GicResult<bool> {
        self.check_intid(intid)?;
        let (addr, bit) = self.int_regs(intid).bit_reg(BitReg::SetEnable);
        Ok(bit_is_set(self.hal.read32(addr), bit))
    }

    /// Route a shared interrupt to the lowest numbered core in `cpus`.
    /// Only targeted routing is used, so the rest of the set is ignored.
    pub fn set_affinity(&self, intid: u32, cpus: &CpuSet) -> GicResult {
        if !self.check_intid(intid)?.is_shared() {
            return Ok(());
        }
        let Some(cpu) = cpus.first_cpu() else {
            return gic_result_err!(EINVAL, "empty cpu set");
        };
        if cpu >= self.config.ncpus {
            return gic_result_err!(EINVAL, "cpu not present");
        }
        self.write_irouter(intid, self.hal.cpu_mpidr(cpu));
        Ok(())
    }

    /// Raise `intid` by software: SGIs go to `cpus`, shared interrupts are
    /// set pending in the distributor. PPIs cannot be forced.
    pub fn trigger(&self, intid: u32, cpus: &CpuSet) -> GicResult {
        match self.check_intid(intid)? {
            IntidKind::Sgi => self.raise_sgi(intid, cpus),
            IntidKind::Spi | IntidKind::Espi => {
                self.write_bit(intid, BitReg::SetPending);
                Ok(())
            }
            IntidKind::Ppi => gic_result_err!(ENOSYS, "PPIs cannot be raised by software"),
        }
    }

    /// Group 0 clears IGROUPR and IGRPMODR, group 1 sets both.
    pub fn set_group(&self, intid: u32, group: IntGroup) -> GicResult {
        self.check_intid(intid)?;
        let regs = self.int_regs(intid);
        let (group_addr, bit) = regs.bit_reg(BitReg::Group);
        let (mod_addr, _) = regs.bit_reg(BitReg::GroupMod);
        let set = group == IntGroup::Group1;
        self.with_gicd_lock(|| {
            let igroupr = self.hal.read32(group_addr);
            let igrpmodr = self.hal.read32(mod_addr);
            self.hal.write32(group_addr, with_bit(igroupr, bit, set));
            self.hal.write32(mod_addr, with_bit(igrpmodr, bit, set));
        });
        Ok(())
    }
}
