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
use spin::Mutex;
use tock_registers::{register_bitfields, LocalRegisterCopy};

use super::hal::GicHal;
use super::layout::{
    BitReg, IntRegs, GIC_NUM_CFG_PER_REG, GIC_NUM_INTR_PER_REG, GIC_NUM_PRI_PER_REG,
};
use super::{
    Gicv3, KernelIrq, SmpIpi, ESPI_BASE, GIC_INT_DEF_PRI_X4, GIC_SPURIOUS_BASE, IGROUPR_VAL,
    SPI_BASE,
};
use crate::consts::{SGI_SMP_CALL_ID, SGI_SMP_SCHED_ID};
use crate::error::GicResult;
use crate::memory::{sys_set_bit, sys_test_bit};

/// Serializes read-modify-write of registers packing several interrupts.
pub(crate) static GICD_LOCK: Mutex<()> = Mutex::new(());

pub const GICD_CTLR: usize = 0x0000;
pub const GICD_TYPER: usize = 0x0004;
pub const GICD_PIDR2: usize = 0xffe8;

pub const GICD_CTLR_RWP: u32 = 31;
pub const GICD_CTLR_DS: u32 = 6;

/// ICFGR value putting all sixteen interrupts of a word on edge.
pub const GICD_ICFGR_ALL_EDGE: u32 = 0xaaaa_aaaa;

register_bitfields! {u32,
    pub GICD_CTLR_REG [
        EnableGrp0 OFFSET(0) NUMBITS(1) [],
        EnableGrp1 OFFSET(1) NUMBITS(1) [],
        // ARE_S with DS set, ARE_NS in the non-secure view.
        ARE OFFSET(4) NUMBITS(1) [],
        DS OFFSET(6) NUMBITS(1) [],
        RWP OFFSET(31) NUMBITS(1) []
    ],
    pub GICD_TYPER_REG [
        ITLinesNumber OFFSET(0) NUMBITS(5) [],
        ESPI OFFSET(8) NUMBITS(1) [],
        MBIS OFFSET(16) NUMBITS(1) [],
        RSS OFFSET(26) NUMBITS(1) [],
        ESPI_range OFFSET(27) NUMBITS(5) []
    ],
    pub GIC_PIDR2 [
        ArchRev OFFSET(4) NUMBITS(4) [
            GICv3 = 3,
            GICv4 = 4
        ]
    ]
}

numeric_enum_macro::numeric_enum! {
    #[repr(u32)]
    #[derive(Debug, Eq, PartialEq, Copy, Clone)]
    pub enum GicArchRev {
        V3 = 3,
        V4 = 4,
    }
}

/// Architecture revision from a GICD/GICR PIDR2 value.
pub fn arch_rev(pidr2: u32) -> Option<GicArchRev> {
    let reg = LocalRegisterCopy::<u32, GIC_PIDR2::Register>::new(pidr2);
    GicArchRev::try_from(reg.read(GIC_PIDR2::ArchRev)).ok()
}

/// What GICD_TYPER says the distributor implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistInfo {
    pub arch_rev: GicArchRev,
    /// `32 * (ITLinesNumber + 1)`, spurious range included.
    pub num_ints: u32,
    pub num_spis: u32,
    pub num_espis: u32,
    pub range_selector: bool,
    pub mbis: bool,
}

impl DistInfo {
    pub fn from_regs(arch_rev: GicArchRev, typer: u32) -> Self {
        let typer = LocalRegisterCopy::<u32, GICD_TYPER_REG::Register>::new(typer);
        let lines = typer.read(GICD_TYPER_REG::ITLinesNumber) + 1;
        let num_ints = lines << 5;
        let num_espis = if typer.is_set(GICD_TYPER_REG::ESPI) {
            (typer.read(GICD_TYPER_REG::ESPI_range) + 1) * 32
        } else {
            0
        };
        Self {
            arch_rev,
            num_ints,
            num_spis: (32 * lines).min(GIC_SPURIOUS_BASE) - 32,
            num_espis,
            range_selector: typer.is_set(GICD_TYPER_REG::RSS),
            mbis: typer.is_set(GICD_TYPER_REG::MBIS),
        }
    }

    /// One past the last implemented SPI.
    pub fn spi_end(&self) -> u32 {
        SPI_BASE + self.num_spis
    }

    pub fn espi_end(&self) -> u32 {
        ESPI_BASE + self.num_espis
    }
}

impl<H: GicHal> Gicv3<H> {
    fn gicd_read(&self, reg: usize) -> u32 {
        self.hal.read32(self.config.gicd_base + reg)
    }

    fn gicd_write(&self, reg: usize, val: u32) {
        self.hal.write32(self.config.gicd_base + reg, val)
    }

    /// Probe GICD_PIDR2 and GICD_TYPER; ENODEV unless this is a GICv3 or v4.
    pub fn validate_dist_version(&self) -> GicResult<DistInfo> {
        let arch_rev = match arch_rev(self.gicd_read(GICD_PIDR2)) {
            Some(GicArchRev::V3) => {
                info!("GICv3 version detect");
                GicArchRev::V3
            }
            Some(GicArchRev::V4) => {
                info!("GICv4 version detect");
                GicArchRev::V4
            }
            None => {
                info!("No GIC version detect");
                return gic_result_err!(ENODEV, "distributor reports no GICv3/v4");
            }
        };

        let typer = self.gicd_read(GICD_TYPER);
        let info = DistInfo::from_regs(arch_rev, typer);
        debug!("GICD_TYPER = {:#x}", typer);
        info!("{} SPIs implemented", info.num_spis);
        info!("{} Extended SPIs implemented", info.num_espis);
        info!(
            "Distributor has {}Range Selector support",
            if info.range_selector { "" } else { "no " }
        );
        if info.mbis {
            info!("MBIs is present, But No support");
        }
        Ok(info)
    }

    /// Default shared interrupts `first..end` of one bank: disabled, not
    /// pending, group 1, default priority and trigger.
    fn dist_default_bank(&self, first: u32, end: u32) -> GicResult {
        let base = self.config.gicd_base;
        for intid in (first..end).step_by(GIC_NUM_INTR_PER_REG as usize) {
            let regs = IntRegs::new(base, intid);
            self.hal.write32(regs.bit_reg(BitReg::ClearEnable).0, u32::MAX);
            self.hal.write32(regs.bit_reg(BitReg::ClearPending).0, u32::MAX);
            self.hal.write32(regs.bit_reg(BitReg::Group).0, IGROUPR_VAL);
            self.hal.write32(regs.bit_reg(BitReg::GroupMod).0, u32::MAX);
        }

        self.wait_rwp(SPI_BASE)?;

        for intid in (first..end).step_by(GIC_NUM_PRI_PER_REG as usize) {
            let addr = IntRegs::new(base, intid).prio_word_addr();
            self.hal.write32(addr, GIC_INT_DEF_PRI_X4);
        }

        let cfg = if self.config.spi_edge {
            GICD_ICFGR_ALL_EDGE
        } else {
            0
        };
        for intid in (first..end).step_by(GIC_NUM_CFG_PER_REG as usize) {
            self.hal.write32(IntRegs::new(base, intid).cfg_reg().0, cfg);
        }
        Ok(())
    }

    /// One-time distributor setup, run by the boot core only.
    pub fn dist_init<K: KernelIrq>(&self, kernel: &K) -> GicResult {
        let info = match self.dist.get() {
            Some(info) => *info,
            None => self.validate_dist_version()?,
        };

        self.gicd_write(GICD_CTLR, 0);
        self.wait_rwp(SPI_BASE)?;

        if self.config.single_security_state {
            sys_set_bit(&self.hal, self.config.gicd_base + GICD_CTLR, GICD_CTLR_DS);
            if !sys_test_bit(&self.hal, self.config.gicd_base + GICD_CTLR, GICD_CTLR_DS) {
                error!("Current GIC does not support single security state");
                panic!("GICD_CTLR.DS is not implemented");
            }
        }

        self.dist_default_bank(SPI_BASE, info.num_ints)?;
        if info.num_espis > 0 {
            self.dist_default_bank(ESPI_BASE, info.espi_end())?;
        }

        let mut ctlr = LocalRegisterCopy::<u32, GICD_CTLR_REG::Register>::new(0);
        ctlr.modify(GICD_CTLR_REG::ARE::SET + GICD_CTLR_REG::EnableGrp1::SET);
        if self.config.hipri {
            ctlr.modify(GICD_CTLR_REG::EnableGrp0::SET);
        }
        if self.config.single_security_state {
            ctlr.modify(GICD_CTLR_REG::DS::SET);
        }
        self.gicd_write(GICD_CTLR, ctlr.get());
        debug!("GICD_CTLR = {:#x}", self.gicd_read(GICD_CTLR));

        if self.config.smp {
            kernel.attach_ipi(SGI_SMP_SCHED_ID, SmpIpi::Sched)?;
            kernel.attach_ipi(SGI_SMP_CALL_ID, SmpIpi::Call)?;
        }
        info!("gicv3 distributor up, {} interrupt lines", info.num_ints);
        Ok(())
    }

    /// Program GICD_IROUTER(nE) for `intid` with the affinity of `mpidr`.
    /// Two 32-bit writes, low word first.
    pub(crate) fn write_irouter(&self, intid: u32, mpidr: u64) {
        let Some(addr) = self.int_regs(intid).router_addr() else {
            return;
        };
        let val = mpidr & crate::arch::MPIDR_AFFINITY_MASK;
        self.hal.write32(addr, val as u32);
        self.hal.write32(addr + 4, (val >> 32) as u32);
    }
}
