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
//! Behavioral model of a GICv3 for host tests.
//!
//! Registers are word maps. Set/clear register pairs share one backing word,
//! RWP reads back set for a configurable number of polls after a write that
//! needs it, and the CPU interface picks the highest priority pending
//! interrupt the way the hardware acknowledge does. Each test thread acts as
//! one core; `set_current_cpu` selects which.
use std::cell::Cell;
use std::collections::BTreeMap;
use std::vec;
use std::vec::Vec;

use spin::Mutex;
use tock_registers::LocalRegisterCopy;

use super::gicd::{GICD_CTLR, GICD_PIDR2, GICD_TYPER};
use super::gicr::{GICR_CTLR, GICR_PIDR2, GICR_PWRR, GICR_SGI_BASE, GICR_TYPER, GICR_WAKER};
use super::hal::{GicHal, IccReg};
use super::layout::{
    GICD_IGROUPR, GICD_IPRIORITYR, GICD_IROUTER, GICD_IROUTERNE, GICD_ISENABLER, GICD_ISPENDR,
};
use super::sgi::ICC_SGI1R;
use super::{IntGroup, GIC_INTID_SPURIOUS, SPI_BASE};
use crate::arch::{cpuid_to_mpidr, mpidr_to_typer_affinity, MPIDR_AFFINITY_MASK};
use crate::config::{GicConfig, RedistLayout, SpinPolicy};
use crate::memory::MmioOps;

pub const SIM_GICD_BASE: usize = 0x0800_0000;
pub const SIM_GICD_SIZE: usize = 0x10000;
pub const SIM_GICR_BASE: usize = 0x080a_0000;
pub const SIM_GICR_STRIDE: usize = 0x20000;

/// ITLinesNumber 31, 32 ESPIs, Range Selector.
pub const SIM_GICD_TYPER: u32 = 31 | (1 << 8) | (1 << 26);
pub const SIM_PIDR2_V3: u32 = 0x3b;

thread_local! {
    static CURRENT_CPU: Cell<usize> = Cell::new(0);
}

/// Make the calling thread act as core `cpu`.
pub fn set_current_cpu(cpu: usize) {
    CURRENT_CPU.with(|c| c.set(cpu));
}

pub fn current_cpu() -> usize {
    CURRENT_CPU.with(|c| c.get())
}

/// Word-addressed register frame. A set register and its clear twin share
/// the word at the set offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    words: BTreeMap<usize, u32>,
}

/// (set, clear) offsets of the write-1 register pairs, with their span.
const W1_PAIRS: [(usize, usize, usize); 6] = [
    (0x0100, 0x0180, 0x80),
    (0x0200, 0x0280, 0x80),
    (0x0300, 0x0380, 0x80),
    (0x1200, 0x1400, 0x200),
    (0x1600, 0x1800, 0x200),
    (0x1a00, 0x1c00, 0x200),
];

impl Frame {
    fn backing(off: usize) -> (usize, Option<bool>) {
        for (set, clear, span) in W1_PAIRS {
            if (set..set + span).contains(&off) {
                return (off, Some(true));
            }
            if (clear..clear + span).contains(&off) {
                return (set + (off - clear), Some(false));
            }
        }
        (off, None)
    }

    pub fn read(&self, off: usize) -> u32 {
        let (off, _) = Self::backing(off);
        *self.words.get(&off).unwrap_or(&0)
    }

    pub fn write(&mut self, off: usize, val: u32) {
        let (word, w1) = Self::backing(off);
        let old = *self.words.get(&word).unwrap_or(&0);
        let new = match w1 {
            Some(true) => old | val,
            Some(false) => old & !val,
            None => val,
        };
        self.words.insert(word, new);
    }

    pub fn write8(&mut self, off: usize, val: u8) {
        let word = off & !3;
        let shift = (off & 3) * 8;
        let old = self.read(word) & !(0xff << shift);
        self.words.insert(word, old | ((val as u32) << shift));
    }

    pub fn bit(&self, off: usize, n: u32) -> bool {
        let word = off + (n as usize / 32) * 4;
        self.read(word) & (1 << (n % 32)) != 0
    }

    pub fn set_bit(&mut self, off: usize, n: u32) {
        let word = off + (n as usize / 32) * 4;
        let val = self.read(word) | (1 << (n % 32));
        self.words.insert(word, val);
    }

    fn clear_bit(&mut self, off: usize, n: u32) {
        let word = off + (n as usize / 32) * 4;
        let val = self.read(word) & !(1 << (n % 32));
        self.words.insert(word, val);
    }

    pub fn byte(&self, off: usize) -> u8 {
        (self.read(off & !3) >> ((off & 3) * 8)) as u8
    }
}

/// Ordered record of barrier and system register traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    Dsb,
    Isb,
    IccWrite(IccReg, u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimCpu {
    pub mpidr: u64,
    /// SGI_base frame.
    pub sgi: Frame,
    pub waker: u32,
    pub pwrr: u32,
    pub rwp_left: u32,
    pub pidr2: u32,
    pub sre: u64,
    pub pmr: u64,
    pub igrpen0: u64,
    pub igrpen1: u64,
    pub active: Vec<u32>,
    pub irq_masked: bool,
    pub events: Vec<SimEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimState {
    pub gicd_ctlr: u32,
    pub gicd_typer: u32,
    pub gicd_pidr2: u32,
    pub dist: Frame,
    pub dist_rwp_left: u32,
    pub cpus: Vec<SimCpu>,
    /// Polls during which RWP still reads set after a tracked write.
    pub rwp_polls: u32,
    /// RWP never clears.
    pub rwp_stuck: bool,
    /// GICR_WAKER.ChildrenAsleep never clears.
    pub wake_stuck: bool,
    pub ds_supported: bool,
    /// ICC_SRE_EL1.SRE is RAZ/WI.
    pub sre_locked: bool,
    pub sgi_log: Vec<u64>,
}

pub struct SimGic {
    pub state: Mutex<SimState>,
}

impl SimGic {
    pub fn new(ncpus: usize, cpus_per_cluster: usize) -> Self {
        let cpus = (0..ncpus)
            .map(|cpu| SimCpu {
                mpidr: cpuid_to_mpidr(cpu, cpus_per_cluster),
                sgi: Frame::default(),
                waker: (1 << 1) | (1 << 2),
                pwrr: 0,
                rwp_left: 0,
                pidr2: SIM_PIDR2_V3,
                sre: 0,
                pmr: 0,
                igrpen0: 0,
                igrpen1: 0,
                active: vec![],
                irq_masked: false,
                events: vec![],
            })
            .collect();
        Self {
            state: Mutex::new(SimState {
                gicd_ctlr: 0,
                gicd_typer: SIM_GICD_TYPER,
                gicd_pidr2: SIM_PIDR2_V3,
                dist: Frame::default(),
                dist_rwp_left: 0,
                cpus,
                rwp_polls: 2,
                rwp_stuck: false,
                wake_stuck: false,
                ds_supported: true,
                sre_locked: false,
                sgi_log: vec![],
            }),
        }
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        f(&mut self.state.lock())
    }

    pub fn snapshot(&self) -> SimState {
        self.state.lock().clone()
    }
}

/// Board description matching a fresh `SimGic`.
pub fn sim_config(ncpus: usize, cpus_per_cluster: usize) -> GicConfig {
    GicConfig {
        gicd_base: SIM_GICD_BASE,
        gicr_base: SIM_GICR_BASE,
        gicr_stride: SIM_GICR_STRIDE,
        redist_layout: RedistLayout::Strided,
        ncpus,
        cpus_per_cluster,
        hipri: false,
        spi_edge: false,
        single_security_state: false,
        smp: true,
        poll: SpinPolicy::Bounded(1000),
    }
}

enum Target {
    Dist(usize),
    Rd(usize, usize),
    Sgi(usize, usize),
}

impl SimState {
    fn decode(&self, addr: usize) -> Target {
        if (SIM_GICD_BASE..SIM_GICD_BASE + SIM_GICD_SIZE).contains(&addr) {
            return Target::Dist(addr - SIM_GICD_BASE);
        }
        let end = SIM_GICR_BASE + self.cpus.len() * SIM_GICR_STRIDE;
        if (SIM_GICR_BASE..end).contains(&addr) {
            let cpu = (addr - SIM_GICR_BASE) / SIM_GICR_STRIDE;
            let off = (addr - SIM_GICR_BASE) % SIM_GICR_STRIDE;
            return if off >= GICR_SGI_BASE {
                Target::Sgi(cpu, off - GICR_SGI_BASE)
            } else {
                Target::Rd(cpu, off)
            };
        }
        panic!("access to unmapped address {:#x}", addr);
    }

    fn rwp(left: &mut u32, stuck: bool) -> bool {
        if stuck {
            return true;
        }
        if *left > 0 {
            *left -= 1;
            return true;
        }
        false
    }

    fn read32(&mut self, addr: usize) -> u32 {
        match self.decode(addr) {
            Target::Dist(GICD_CTLR) => {
                let busy = Self::rwp(&mut self.dist_rwp_left, self.rwp_stuck);
                self.gicd_ctlr | ((busy as u32) << 31)
            }
            Target::Dist(GICD_TYPER) => self.gicd_typer,
            Target::Dist(GICD_PIDR2) => self.gicd_pidr2,
            Target::Dist(off) => self.dist.read(off),
            Target::Rd(cpu, off) => {
                let last = cpu + 1 == self.cpus.len();
                let stuck = self.rwp_stuck;
                let c = &mut self.cpus[cpu];
                match off {
                    GICR_CTLR => (Self::rwp(&mut c.rwp_left, stuck) as u32) << 3,
                    GICR_TYPER => ((cpu as u32) << 8) | ((last as u32) << 4),
                    o if o == GICR_TYPER + 4 => mpidr_to_typer_affinity(c.mpidr),
                    GICR_WAKER => c.waker,
                    GICR_PWRR => c.pwrr,
                    GICR_PIDR2 => c.pidr2,
                    _ => 0,
                }
            }
            Target::Sgi(cpu, off) => self.cpus[cpu].sgi.read(off),
        }
    }

    fn write32(&mut self, addr: usize, val: u32) {
        match self.decode(addr) {
            Target::Dist(GICD_CTLR) => {
                let mut val = val & !(1 << 31);
                if !self.ds_supported {
                    val &= !(1 << 6);
                }
                self.gicd_ctlr = val;
                self.dist_rwp_left = self.rwp_polls;
            }
            Target::Dist(off) => {
                // ICENABLER(nE) writes are tracked by RWP
                if (0x180..0x200).contains(&off) || (0x1400..0x1600).contains(&off) {
                    self.dist_rwp_left = self.rwp_polls;
                }
                self.dist.write(off, val);
            }
            Target::Rd(cpu, off) => {
                let wake_stuck = self.wake_stuck;
                let c = &mut self.cpus[cpu];
                match off {
                    GICR_WAKER => {
                        c.waker = (c.waker & (1 << 2)) | (val & (1 << 1));
                        if c.waker & (1 << 1) == 0 && c.pwrr == 0x2 && !wake_stuck {
                            c.waker &= !(1 << 2);
                        }
                    }
                    GICR_PWRR => c.pwrr = val,
                    _ => {}
                }
            }
            Target::Sgi(cpu, off) => {
                let rwp_polls = self.rwp_polls;
                let c = &mut self.cpus[cpu];
                if (0x180..0x200).contains(&off) {
                    c.rwp_left = rwp_polls;
                }
                c.sgi.write(off, val);
            }
        }
    }

    fn write8(&mut self, addr: usize, val: u8) {
        match self.decode(addr) {
            Target::Dist(off) => self.dist.write8(off, val),
            Target::Sgi(cpu, off) => self.cpus[cpu].sgi.write8(off, val),
            Target::Rd(..) => panic!("byte access to RD_base at {:#x}", addr),
        }
    }

    fn dist_router(&self, intid: u32) -> u64 {
        let off = if intid >= 4096 {
            GICD_IROUTERNE + 8 * (intid - 4096) as usize
        } else {
            GICD_IROUTER + 8 * intid as usize
        };
        self.dist.read(off) as u64 | ((self.dist.read(off + 4) as u64) << 32)
    }

    /// Highest priority deliverable interrupt of `group` for `cpu`.
    fn best_pending(&self, cpu: usize, group: IntGroup) -> Option<u32> {
        let c = &self.cpus[cpu];
        let grp1 = group == IntGroup::Group1;
        let enabled = match group {
            IntGroup::Group0 => c.igrpen0 & 1 != 0 && self.gicd_ctlr & 1 != 0,
            IntGroup::Group1 => c.igrpen1 & 1 != 0,
        };
        if !enabled {
            return None;
        }
        let mut best: Option<(u8, u32)> = None;
        let mut consider = |frame: &Frame, intid: u32, index: u32| {
            if !frame.bit(GICD_ISENABLER, index)
                || !frame.bit(GICD_ISPENDR, index)
                || frame.bit(GICD_IGROUPR, index) != grp1
            {
                return;
            }
            let prio = frame.byte(GICD_IPRIORITYR + index as usize);
            if (prio as u64) >= c.pmr {
                return;
            }
            if best.map_or(true, |(p, _)| prio < p) {
                best = Some((prio, intid));
            }
        };
        for intid in 0..SPI_BASE {
            consider(&c.sgi, intid, intid);
        }
        let grp1_on = self.gicd_ctlr & (1 << 1) != 0;
        if grp1 && !grp1_on {
            return best.map(|(_, id)| id);
        }
        let here = c.mpidr & MPIDR_AFFINITY_MASK;
        for intid in SPI_BASE..1020 {
            if self.dist_router(intid) & MPIDR_AFFINITY_MASK == here {
                consider(&self.dist, intid, intid);
            }
        }
        best.map(|(_, id)| id)
    }

    fn acknowledge(&mut self, cpu: usize, group: IntGroup) -> u64 {
        let Some(intid) = self.best_pending(cpu, group) else {
            return GIC_INTID_SPURIOUS as u64;
        };
        if intid < SPI_BASE {
            self.cpus[cpu].sgi.clear_bit(GICD_ISPENDR, intid);
        } else {
            self.dist.clear_bit(GICD_ISPENDR, intid);
        }
        self.cpus[cpu].active.push(intid);
        intid as u64
    }

    fn deliver_sgi(&mut self, val: u64) {
        self.sgi_log.push(val);
        let reg = LocalRegisterCopy::<u64, ICC_SGI1R::Register>::new(val);
        let sgi = reg.read(ICC_SGI1R::INTID) as u32;
        let tlist = reg.read(ICC_SGI1R::TargetList);
        let cluster = (reg.read(ICC_SGI1R::Aff3) << 32)
            | (reg.read(ICC_SGI1R::Aff2) << 16)
            | (reg.read(ICC_SGI1R::Aff1) << 8)
            | (reg.read(ICC_SGI1R::RS) << 4);
        for c in self.cpus.iter_mut() {
            if c.mpidr & !0xf == cluster && tlist & (1 << (c.mpidr & 0xf)) != 0 {
                c.sgi.set_bit(GICD_ISPENDR, sgi);
            }
        }
    }
}

impl MmioOps for SimGic {
    fn read32(&self, addr: usize) -> u32 {
        self.state.lock().read32(addr)
    }

    fn write32(&self, addr: usize, val: u32) {
        self.state.lock().write32(addr, val)
    }

    fn write8(&self, addr: usize, val: u8) {
        self.state.lock().write8(addr, val)
    }
}

impl GicHal for SimGic {
    fn cpu_id(&self) -> usize {
        current_cpu()
    }

    fn cpu_mpidr(&self, cpu: usize) -> u64 {
        self.state.lock().cpus[cpu].mpidr | (1 << 31)
    }

    fn read_icc(&self, reg: IccReg) -> u64 {
        let cpu = current_cpu();
        let mut s = self.state.lock();
        match reg {
            IccReg::Iar0 => s.acknowledge(cpu, IntGroup::Group0),
            IccReg::Iar1 => s.acknowledge(cpu, IntGroup::Group1),
            IccReg::Sre => s.cpus[cpu].sre,
            IccReg::Pmr => s.cpus[cpu].pmr,
            IccReg::Igrpen0 => s.cpus[cpu].igrpen0,
            IccReg::Igrpen1 => s.cpus[cpu].igrpen1,
            IccReg::Eoir0 | IccReg::Eoir1 | IccReg::Sgi1r => {
                panic!("{:?} is write-only", reg)
            }
        }
    }

    fn write_icc(&self, reg: IccReg, val: u64) {
        let cpu = current_cpu();
        let mut s = self.state.lock();
        s.cpus[cpu].events.push(SimEvent::IccWrite(reg, val));
        match reg {
            IccReg::Sre => {
                if !s.sre_locked {
                    s.cpus[cpu].sre = val;
                }
            }
            IccReg::Pmr => s.cpus[cpu].pmr = val & 0xff,
            IccReg::Igrpen0 => s.cpus[cpu].igrpen0 = val,
            IccReg::Igrpen1 => s.cpus[cpu].igrpen1 = val,
            IccReg::Eoir0 | IccReg::Eoir1 => {
                let intid = (val & 0xff_ffff) as u32;
                let active = &mut s.cpus[cpu].active;
                if let Some(pos) = active.iter().rposition(|&id| id == intid) {
                    active.remove(pos);
                }
            }
            IccReg::Sgi1r => s.deliver_sgi(val),
            IccReg::Iar0 | IccReg::Iar1 => panic!("{:?} is read-only", reg),
        }
    }

    fn dsb(&self) {
        let cpu = current_cpu();
        self.state.lock().cpus[cpu].events.push(SimEvent::Dsb);
    }

    fn isb(&self) {
        let cpu = current_cpu();
        self.state.lock().cpus[cpu].events.push(SimEvent::Isb);
    }

    fn irq_save(&self) -> usize {
        let cpu = current_cpu();
        let mut s = self.state.lock();
        let was = s.cpus[cpu].irq_masked;
        s.cpus[cpu].irq_masked = true;
        was as usize
    }

    fn irq_restore(&self, flags: usize) {
        let cpu = current_cpu();
        self.state.lock().cpus[cpu].irq_masked = flags != 0;
    }
}
