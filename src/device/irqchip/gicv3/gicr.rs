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
use tock_registers::{register_bitfields, LocalRegisterCopy};

use super::gicd::{arch_rev, GicArchRev};
use super::hal::{GicHal, IccReg};
use super::layout::{BitReg, IntRegs, GIC_NUM_PRI_PER_REG};
use super::{
    Gicv3, GIC_IDLE_PRIO, GIC_INT_DEF_PRI_X4, IGROUPR_VAL, PPI_BASE, SGI_BASE, SPI_BASE,
};
use crate::arch::mpidr_to_typer_affinity;
use crate::config::RedistLayout;
use crate::consts::{MAX_CPU_NUM, PER_GICR_SIZE, PER_GICR_V4_SIZE};
use crate::error::GicResult;
use crate::memory::sys_clear_bit;

pub const GICR_CTLR: usize = 0x0000;
pub const GICR_TYPER: usize = 0x0008;
pub const GICR_WAKER: usize = 0x0014;
/// GIC-600/700 power register.
pub const GICR_PWRR: usize = 0x0024;
pub const GICR_PIDR2: usize = 0xffe8;
pub const GICR_SGI_BASE: usize = 0x10000;

pub const GICR_CTLR_RWP: u32 = 3;
pub const GICR_WAKER_PS: u32 = 1;
pub const GICR_WAKER_CA: u32 = 2;
/// GICR_PWRR.RDPD cleared, RDAG set: request power-up of this redistributor.
pub const GICR_PWRR_POWER_UP: u32 = 0x2;

register_bitfields! {u32,
    pub GICR_WAKER_REG [
        ProcessorSleep OFFSET(1) NUMBITS(1) [],
        ChildrenAsleep OFFSET(2) NUMBITS(1) []
    ]
}

register_bitfields! {u64,
    pub GICR_TYPER_REG [
        VLPIS OFFSET(1) NUMBITS(1) [],
        DirectLPI OFFSET(3) NUMBITS(1) [],
        Last OFFSET(4) NUMBITS(1) [],
        PPInum OFFSET(27) NUMBITS(5) [],
        Affinity_Value OFFSET(32) NUMBITS(32) []
    ],
    pub ICC_SRE_REG [
        SRE OFFSET(0) NUMBITS(1) [],
        DFB OFFSET(1) NUMBITS(1) [],
        DIB OFFSET(2) NUMBITS(1) []
    ]
}

type GicrTyper = LocalRegisterCopy<u64, GICR_TYPER_REG::Register>;

/// PPIs a redistributor implements per GICR_TYPER.PPInum.
pub fn nr_ppis(typer: &GicrTyper) -> u32 {
    match typer.read(GICR_TYPER_REG::PPInum) {
        n @ (1 | 2) => 16 + n as u32 * 32,
        _ => 16,
    }
}

impl<H: GicHal> Gicv3<H> {
    /// GICR_TYPER of the frame at `rdist`, as two 32-bit reads.
    fn read_gicr_typer(&self, rdist: usize) -> GicrTyper {
        let lo = self.hal.read32(rdist + GICR_TYPER) as u64;
        let hi = self.hal.read32(rdist + GICR_TYPER + 4) as u64;
        GicrTyper::new(lo | (hi << 32))
    }

    /// Locate the redistributor serving logical core `cpu`.
    pub fn find_rdist(&self, cpu: usize) -> GicResult<usize> {
        match self.config.redist_layout {
            RedistLayout::Strided => Ok(self.config.gicr_base + cpu * self.config.gicr_stride),
            RedistLayout::Scan => {
                let want = mpidr_to_typer_affinity(self.hal.cpu_mpidr(cpu));
                let mut frame = self.config.gicr_base;
                // a GIC cannot carry more frames than cores we can describe
                for _ in 0..MAX_CPU_NUM {
                    if arch_rev(self.hal.read32(frame + GICR_PIDR2)).is_none() {
                        break;
                    }
                    let typer = self.read_gicr_typer(frame);
                    if typer.read(GICR_TYPER_REG::Affinity_Value) as u32 == want {
                        debug!("cpu {} redistributor at {:#x}", cpu, frame);
                        return Ok(frame);
                    }
                    if typer.is_set(GICR_TYPER_REG::Last) {
                        break;
                    }
                    frame += if typer.is_set(GICR_TYPER_REG::VLPIS) {
                        PER_GICR_V4_SIZE
                    } else {
                        PER_GICR_SIZE
                    };
                }
                warn!("no redistributor matches cpu {} affinity {:#x}", cpu, want);
                gic_result_err!(ENODEV, "redistributor not found")
            }
        }
    }

    /// Probe the executing core's redistributor; ENODEV unless it is v3/v4.
    pub fn validate_redist_version(&self) -> GicResult<GicArchRev> {
        let rdist = self.this_rdist_base();
        let Some(rev) = arch_rev(self.hal.read32(rdist + GICR_PIDR2)) else {
            info!("No redistributor present {:#x}", rdist);
            return gic_result_err!(ENODEV, "redistributor reports no GICv3/v4");
        };

        let typer = self.read_gicr_typer(rdist);
        let has_vlpis = typer.is_set(GICR_TYPER_REG::VLPIS);
        let has_direct_lpi = typer.is_set(GICR_TYPER_REG::DirectLPI);
        debug!("GICR_TYPER = {:#x}", typer.get());
        info!("{} PPIs implemented", nr_ppis(&typer));
        info!(
            "{}VLPI support, {}direct LPI support",
            if has_vlpis { "" } else { "no " },
            if has_direct_lpi { "" } else { "no " }
        );
        Ok(rev)
    }

    /// Wake the executing core's redistributor if it is asleep.
    pub fn rdist_enable(&self) -> GicResult {
        let rdist = self.this_rdist_base();
        let waker = |hal: &H| {
            LocalRegisterCopy::<u32, GICR_WAKER_REG::Register>::new(hal.read32(rdist + GICR_WAKER))
        };
        if !waker(&self.hal).is_set(GICR_WAKER_REG::ChildrenAsleep) {
            return Ok(());
        }

        self.hal.write32(rdist + GICR_PWRR, GICR_PWRR_POWER_UP);
        sys_clear_bit(&self.hal, rdist + GICR_WAKER, GICR_WAKER_PS);
        self.config
            .poll
            .wait_for(|| waker(&self.hal).is_set(GICR_WAKER_REG::ChildrenAsleep))
    }

    /// SGI/PPI defaults and system register interface of the executing core.
    pub fn cpuif_init(&self) -> GicResult {
        let regs = IntRegs::new(self.this_rdist_base() + GICR_SGI_BASE, SGI_BASE);

        self.hal.write32(regs.bit_reg(BitReg::ClearEnable).0, u32::MAX);
        // any SGI/PPI selects GICR_CTLR
        self.wait_rwp(SGI_BASE)?;
        self.hal.write32(regs.bit_reg(BitReg::ClearPending).0, u32::MAX);

        self.hal.write32(regs.bit_reg(BitReg::Group).0, IGROUPR_VAL);
        self.hal.write32(regs.bit_reg(BitReg::GroupMod).0, u32::MAX);

        for intid in (SGI_BASE..SPI_BASE).step_by(GIC_NUM_PRI_PER_REG as usize) {
            let addr = IntRegs::new(regs.base, intid).prio_word_addr();
            self.hal.write32(addr, GIC_INT_DEF_PRI_X4);
        }

        // PPIs level triggered, SGI configuration is read-only
        self.hal.write32(IntRegs::new(regs.base, PPI_BASE).cfg_reg().0, 0);

        let mut sre = LocalRegisterCopy::<u64, ICC_SRE_REG::Register>::new(
            self.hal.read_icc(IccReg::Sre),
        );
        if !sre.is_set(ICC_SRE_REG::SRE) {
            sre.modify(ICC_SRE_REG::SRE::SET + ICC_SRE_REG::DIB::SET + ICC_SRE_REG::DFB::SET);
            self.hal.write_icc(IccReg::Sre, sre.get());
            sre.set(self.hal.read_icc(IccReg::Sre));
            assert!(
                sre.is_set(ICC_SRE_REG::SRE),
                "ICC_SRE_EL1.SRE is locked, enable it from EL3"
            );
        }

        self.hal.write_icc(IccReg::Pmr, GIC_IDLE_PRIO as u64);
        if self.config.hipri {
            self.hal.write_icc(IccReg::Igrpen0, 1);
        }
        self.hal.write_icc(IccReg::Igrpen1, 1);
        Ok(())
    }
}
