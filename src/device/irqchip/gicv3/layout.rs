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
//! Register addressing for per-interrupt fields.
//!
//! Every per-interrupt property lives at `bank register + (index / per_reg) * 4`
//! with the field at `(index % per_reg) * width`. `IntRegs` captures the block
//! and local index an interrupt resolves to; the free functions below read and
//! update one field inside a raw register word.
use bit_field::BitField;

use super::{ESPI_BASE, SPI_BASE};

pub const GIC_NUM_INTR_PER_REG: u32 = 32;
pub const GIC_NUM_PRI_PER_REG: u32 = 4;
pub const GIC_NUM_CFG_PER_REG: u32 = 16;

/// Two configuration bits per interrupt; bit 1 selects edge.
pub const GICD_ICFGR_MASK: u32 = 0b11;
pub const GICD_ICFGR_TYPE: u32 = 0b10;

pub const GICD_IGROUPR: usize = 0x0080;
pub const GICD_ISENABLER: usize = 0x0100;
pub const GICD_ICENABLER: usize = 0x0180;
pub const GICD_ISPENDR: usize = 0x0200;
pub const GICD_ICPENDR: usize = 0x0280;
pub const GICD_IPRIORITYR: usize = 0x0400;
pub const GICD_ICFGR: usize = 0x0c00;
pub const GICD_IGRPMODR: usize = 0x0d00;
pub const GICD_IROUTER: usize = 0x6000;

pub const GICD_IGROUPRNE: usize = 0x1000;
pub const GICD_ISENABLERNE: usize = 0x1200;
pub const GICD_ICENABLERNE: usize = 0x1400;
pub const GICD_ISPENDRNE: usize = 0x1600;
pub const GICD_ICPENDRNE: usize = 0x1800;
pub const GICD_IPRIORITYRNE: usize = 0x2000;
pub const GICD_ICFGRNE: usize = 0x3000;
pub const GICD_IGRPMODRNE: usize = 0x3400;
pub const GICD_IROUTERNE: usize = 0x8000;

/// Which register block an interrupt's fields live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    /// SGI_base frame of the executing core's redistributor.
    Redist,
    /// Distributor, SPI range.
    Dist,
    /// Distributor, extended SPI range.
    DistExt,
}

/// One-bit-per-interrupt register families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitReg {
    Group,
    GroupMod,
    SetEnable,
    ClearEnable,
    SetPending,
    ClearPending,
}

impl BitReg {
    fn offset(self, bank: Bank) -> usize {
        let ext = bank == Bank::DistExt;
        match (self, ext) {
            (BitReg::Group, false) => GICD_IGROUPR,
            (BitReg::Group, true) => GICD_IGROUPRNE,
            (BitReg::GroupMod, false) => GICD_IGRPMODR,
            (BitReg::GroupMod, true) => GICD_IGRPMODRNE,
            (BitReg::SetEnable, false) => GICD_ISENABLER,
            (BitReg::SetEnable, true) => GICD_ISENABLERNE,
            (BitReg::ClearEnable, false) => GICD_ICENABLER,
            (BitReg::ClearEnable, true) => GICD_ICENABLERNE,
            (BitReg::SetPending, false) => GICD_ISPENDR,
            (BitReg::SetPending, true) => GICD_ISPENDRNE,
            (BitReg::ClearPending, false) => GICD_ICPENDR,
            (BitReg::ClearPending, true) => GICD_ICPENDRNE,
        }
    }
}

/// Register block and local index an interrupt resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRegs {
    pub base: usize,
    pub bank: Bank,
    /// Index within the bank: the intid itself, or `intid - 4096` for ESPIs.
    pub index: u32,
}

impl IntRegs {
    pub fn new(base: usize, intid: u32) -> Self {
        let (bank, index) = if intid >= ESPI_BASE {
            (Bank::DistExt, intid - ESPI_BASE)
        } else if intid >= SPI_BASE {
            (Bank::Dist, intid)
        } else {
            (Bank::Redist, intid)
        };
        Self { base, bank, index }
    }

    /// Word address and bit number of this interrupt in `reg`.
    pub fn bit_reg(&self, reg: BitReg) -> (usize, u32) {
        let word = (self.index / GIC_NUM_INTR_PER_REG) as usize;
        (
            self.base + reg.offset(self.bank) + word * 4,
            self.index % GIC_NUM_INTR_PER_REG,
        )
    }

    /// Byte address of the priority field.
    pub fn prio_addr(&self) -> usize {
        let off = match self.bank {
            Bank::DistExt => GICD_IPRIORITYRNE,
            _ => GICD_IPRIORITYR,
        };
        self.base + off + self.index as usize
    }

    /// Word address of the IPRIORITYR register holding this interrupt.
    pub fn prio_word_addr(&self) -> usize {
        self.prio_addr() & !0x3
    }

    /// Word address and field shift of the trigger configuration.
    pub fn cfg_reg(&self) -> (usize, u32) {
        let off = match self.bank {
            Bank::DistExt => GICD_ICFGRNE,
            _ => GICD_ICFGR,
        };
        let word = (self.index / GIC_NUM_CFG_PER_REG) as usize;
        (
            self.base + off + word * 4,
            (self.index % GIC_NUM_CFG_PER_REG) * 2,
        )
    }

    /// Address of the 64-bit affinity routing register; None below the SPI range.
    pub fn router_addr(&self) -> Option<usize> {
        match self.bank {
            Bank::Redist => None,
            Bank::Dist => Some(self.base + GICD_IROUTER + 8 * self.index as usize),
            Bank::DistExt => Some(self.base + GICD_IROUTERNE + 8 * self.index as usize),
        }
    }
}

pub fn bit_is_set(word: u32, bit: u32) -> bool {
    word.get_bit(bit as usize)
}

pub fn with_bit(word: u32, bit: u32, set: bool) -> u32 {
    let mut word = word;
    word.set_bit(bit as usize, set);
    word
}

pub fn with_cfg(word: u32, shift: u32, edge: bool) -> u32 {
    let mut word = word & !(GICD_ICFGR_MASK << shift);
    if edge {
        word |= GICD_ICFGR_TYPE << shift;
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: usize = 0x0800_0000;

    #[test]
    fn test_bank_selection() {
        assert_eq!(IntRegs::new(BASE, 15).bank, Bank::Redist);
        assert_eq!(IntRegs::new(BASE, 31).bank, Bank::Redist);
        assert_eq!(IntRegs::new(BASE, 32).bank, Bank::Dist);
        assert_eq!(IntRegs::new(BASE, 1019).bank, Bank::Dist);
        let espi = IntRegs::new(BASE, 4096 + 37);
        assert_eq!(espi.bank, Bank::DistExt);
        assert_eq!(espi.index, 37);
    }

    #[test]
    fn test_register_addresses() {
        let spi = IntRegs::new(BASE, 40);
        assert_eq!(spi.bit_reg(BitReg::SetEnable), (BASE + 0x104, 8));
        assert_eq!(spi.bit_reg(BitReg::ClearPending), (BASE + 0x284, 8));
        assert_eq!(spi.prio_addr(), BASE + 0x400 + 40);
        assert_eq!(spi.prio_word_addr(), BASE + 0x428);
        assert_eq!(spi.cfg_reg(), (BASE + 0xc08, 16));
        assert_eq!(spi.router_addr(), Some(BASE + 0x6000 + 40 * 8));

        let espi = IntRegs::new(BASE, 4096 + 33);
        assert_eq!(espi.bit_reg(BitReg::Group), (BASE + 0x1004, 1));
        assert_eq!(espi.bit_reg(BitReg::SetEnable), (BASE + 0x1204, 1));
        assert_eq!(espi.prio_addr(), BASE + 0x2000 + 33);
        assert_eq!(espi.cfg_reg(), (BASE + 0x3008, 2));
        assert_eq!(espi.router_addr(), Some(BASE + 0x8000 + 33 * 8));

        let ppi = IntRegs::new(BASE + 0x10000, 27);
        assert_eq!(ppi.bit_reg(BitReg::SetEnable), (BASE + 0x10100, 27));
        assert_eq!(ppi.cfg_reg(), (BASE + 0x10c04, 22));
        assert_eq!(ppi.router_addr(), None);
        assert_eq!(IntRegs::new(BASE, 1020).bank, Bank::Dist);

        // bank loops step one register at a time
        let block = IntRegs::new(BASE, 4096 + 64);
        assert_eq!(block.bit_reg(BitReg::ClearEnable), (BASE + 0x1408, 0));
        assert_eq!(block.prio_word_addr(), BASE + 0x2040);
        assert_eq!(IntRegs::new(BASE, 4096 + 48).cfg_reg(), (BASE + 0x300c, 0));
    }

    #[test]
    fn test_field_accessors() {
        let cfg = with_cfg(0, 16, true);
        assert_eq!(cfg, 0b10 << 16);
        assert_eq!(with_cfg(cfg, 16, false), 0);
        assert_eq!(with_cfg(0xffff_ffff, 16, false), 0xfffc_ffff);

        assert!(bit_is_set(with_bit(0, 9, true), 9));
        assert_eq!(with_bit(0xff, 0, false), 0xfe);
    }
}
