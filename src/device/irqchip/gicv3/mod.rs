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
//! GICv3/v4 physical interrupt controller.
//!
//! The distributor is brought up once by the boot core (`primary_init`),
//! then every core brings up its own redistributor and CPU interface
//! (`percpu_init`). SGIs and PPIs live in the executing core's redistributor,
//! SPIs and extended SPIs in the shared distributor.
pub mod gicc;
pub mod gicd;
pub mod gicr;
pub mod hal;
pub mod irq;
pub mod layout;
pub mod sgi;

#[cfg(test)]
pub(crate) mod sim;

use bitflags::bitflags;
use numeric_enum_macro::numeric_enum;
use spin::Once;

use self::gicd::{DistInfo, GICD_CTLR, GICD_CTLR_RWP};
use self::gicr::{GICR_CTLR, GICR_CTLR_RWP, GICR_SGI_BASE};
use self::hal::GicHal;
use self::layout::IntRegs;
use crate::config::GicConfig;
use crate::error::GicResult;
use crate::memory::sys_test_bit;
use crate::percpu::{CpuSet, RedistTable};

pub const SGI_BASE: u32 = 0;
pub const PPI_BASE: u32 = 16;
pub const SPI_BASE: u32 = 32;
/// First identifier of the special range; 1023 means nothing is pending.
pub const GIC_SPURIOUS_BASE: u32 = 1020;
pub const GIC_INTID_SPURIOUS: u32 = 1023;
pub const ESPI_BASE: u32 = 4096;
pub const ESPI_MAX: u32 = 5119;

/// Implemented priority bits.
pub const GIC_PRI_MASK: u32 = 0xff;
/// Priority mask letting every interrupt through.
pub const GIC_IDLE_PRIO: u8 = 0xff;
pub const GIC_INT_DEF_PRI: u8 = 0xa0;
pub const GIC_INT_DEF_PRI_X4: u32 = 0xa0a0_a0a0;

/// Group 1 in IGROUPR, paired with IGRPMODR set, for every interrupt.
pub const IGROUPR_VAL: u32 = 0xffff_ffff;

pub fn is_sgi(intid: u32) -> bool {
    intid < PPI_BASE
}

pub fn is_ppi(intid: u32) -> bool {
    (PPI_BASE..SPI_BASE).contains(&intid)
}

pub fn is_spi(intid: u32) -> bool {
    intid > 31 && intid < 1020
}

pub fn is_espi(intid: u32) -> bool {
    (ESPI_BASE..=ESPI_MAX).contains(&intid)
}

pub fn is_spurious(intid: u32) -> bool {
    (GIC_SPURIOUS_BASE..=GIC_INTID_SPURIOUS).contains(&intid)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntidKind {
    Sgi,
    Ppi,
    Spi,
    Espi,
}

impl IntidKind {
    pub fn of(intid: u32) -> Option<Self> {
        if is_sgi(intid) {
            Some(Self::Sgi)
        } else if is_ppi(intid) {
            Some(Self::Ppi)
        } else if is_spi(intid) {
            Some(Self::Spi)
        } else if is_espi(intid) {
            Some(Self::Espi)
        } else {
            None
        }
    }

    /// Shared interrupts routed through GICD_IROUTER(nE).
    pub fn is_shared(self) -> bool {
        matches!(self, Self::Spi | Self::Espi)
    }
}

bitflags! {
    /// Trigger type requested for an interrupt.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct IrqFlags: u32 {
        const TYPE_LEVEL = 1 << 0;
        const TYPE_EDGE  = 1 << 1;
    }
}

numeric_enum! {
    #[repr(u32)]
    #[derive(Debug, Eq, PartialEq, Copy, Clone)]
    pub enum IntGroup {
        Group0 = 0,
        Group1 = 1,
    }
}

/// Inter-core requests the kernel serves over SGIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmpIpi {
    /// Scheduler pause/resume.
    Sched,
    /// Run a function on another core.
    Call,
}

/// The kernel side of interrupt delivery.
pub trait KernelIrq {
    /// Saved register state handed through dispatch; may be swapped on return.
    type Context;

    fn do_irq(&self, irq: u32, ctx: Self::Context) -> Self::Context;

    fn do_fiq(&self, fiq: u32, ctx: Self::Context) -> Self::Context {
        self.do_irq(fiq, ctx)
    }

    /// Bind the handler for `ipi` to SGI `irq` on every core.
    fn attach_ipi(&self, irq: u32, ipi: SmpIpi) -> GicResult;
}

pub struct Gicv3<H: GicHal> {
    hal: H,
    config: GicConfig,
    rdists: RedistTable,
    dist: Once<DistInfo>,
}

impl<H: GicHal> Gicv3<H> {
    pub fn new(hal: H, config: GicConfig) -> GicResult<Self> {
        config.check()?;
        Ok(Self {
            hal,
            config,
            rdists: RedistTable::new(),
            dist: Once::new(),
        })
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn config(&self) -> &GicConfig {
        &self.config
    }

    /// Distributor capabilities, once the boot core has probed them.
    pub fn dist_info(&self) -> Option<&DistInfo> {
        self.dist.get()
    }

    /// Core set from a raw bitmap; EINVAL if it names a core that is not configured.
    pub fn cpus_from_mask(&self, mask: u64) -> GicResult<CpuSet> {
        let present = match self.config.ncpus {
            n if n >= 64 => u64::MAX,
            n => (1u64 << n) - 1,
        };
        if mask & !present != 0 {
            return gic_result_err!(EINVAL, "cpu set names an absent core");
        }
        Ok(CpuSet::from_mask(mask))
    }

    /// Redistributor of the executing core; 0 before its `percpu_init`.
    pub fn this_rdist_base(&self) -> usize {
        self.rdists.this_cpu(self.hal.cpu_id()).unwrap_or(0)
    }

    /// Register block owning `intid`: the executing core's SGI_base frame
    /// below the SPI range, the distributor otherwise.
    pub fn get_dist_base(&self, intid: u32) -> usize {
        if intid < SPI_BASE {
            self.this_rdist_base() + GICR_SGI_BASE
        } else {
            self.config.gicd_base
        }
    }

    pub(crate) fn int_regs(&self, intid: u32) -> IntRegs {
        IntRegs::new(self.get_dist_base(intid), intid)
    }

    /// Wait until the write-pending bit covering `intid` clears.
    pub fn wait_rwp(&self, intid: u32) -> GicResult {
        let (addr, bit) = if intid < SPI_BASE {
            (self.this_rdist_base() + GICR_CTLR, GICR_CTLR_RWP)
        } else {
            (self.config.gicd_base + GICD_CTLR, GICD_CTLR_RWP)
        };
        self.config
            .poll
            .wait_for(|| sys_test_bit(&self.hal, addr, bit))
    }

    /// Boot-time bring-up: distributor, then the boot core's interface.
    pub fn primary_init<K: KernelIrq>(&self, kernel: &K) -> GicResult {
        let info = match self.validate_dist_version() {
            Ok(info) => info,
            Err(e) => {
                info!("no distributor detected, giving up: {:?}", e);
                return Err(e);
            }
        };
        self.dist.call_once(|| info);
        self.dist_init(kernel)?;
        self.percpu_init()
    }

    /// Bring-up of the executing core's redistributor and CPU interface.
    /// Secondary cores call this once each after boot.
    pub fn percpu_init(&self) -> GicResult {
        let cpu = self.hal.cpu_id();
        if cpu >= self.config.ncpus {
            warn!("cpu {} is not one of the {} configured cores", cpu, self.config.ncpus);
            return gic_result_err!(ENODEV, "cpu id outside the configured cores");
        }
        let base = self.find_rdist(cpu)?;
        self.rdists.record_this_cpu(cpu, base)?;

        if let Err(e) = self.validate_redist_version() {
            info!("no redistributor detected, giving up: {:?}", e);
            return Err(e);
        }

        self.rdist_enable()?;
        self.cpuif_init()?;

        if self.config.smp {
            self.enable(crate::consts::SGI_SMP_CALL_ID)?;
            self.enable(crate::consts::SGI_SMP_SCHED_ID)?;
        }
        info!("gicv3 cpu {} interface up, rdist {:#x}", cpu, base);
        Ok(())
    }
}
