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
//! Acknowledge and end-of-interrupt through the ICC system registers.
use super::hal::{GicHal, IccReg};
use super::{is_spurious, Gicv3, IntGroup, KernelIrq};

/// INTID field of ICC_IAR0/1.
const ICC_IAR_INTID_MASK: u64 = 0xff_ffff;

impl<H: GicHal> Gicv3<H> {
    /// Acknowledge the highest priority pending interrupt of `group`,
    /// moving it to active. 1023 when nothing is pending.
    pub fn get_active(&self, group: IntGroup) -> u32 {
        let reg = match group {
            IntGroup::Group0 => IccReg::Iar0,
            IntGroup::Group1 => IccReg::Iar1,
        };
        (self.hal.read_icc(reg) & ICC_IAR_INTID_MASK) as u32
    }

    /// Retire `intid` in `group`.
    ///
    /// The device write that deasserted the line completes before the EOI
    /// write; ICC writes are not ordered against device memory.
    pub fn eoi(&self, group: IntGroup, intid: u32) {
        self.hal.dsb();
        let reg = match group {
            IntGroup::Group0 => IccReg::Eoir0,
            IntGroup::Group1 => IccReg::Eoir1,
        };
        self.hal.write_icc(reg, intid as u64);
    }

    fn decode<K: KernelIrq>(&self, kernel: &K, group: IntGroup, ctx: K::Context) -> K::Context {
        let intid = self.get_active(group);
        if is_spurious(intid) {
            trace!("spurious {:?} acknowledge {}", group, intid);
            return ctx;
        }
        trace!("{:?} irq {} taken", group, intid);
        let ctx = match group {
            IntGroup::Group0 => kernel.do_fiq(intid, ctx),
            IntGroup::Group1 => kernel.do_irq(intid, ctx),
        };
        self.eoi(group, intid);
        ctx
    }

    /// IRQ exception path: acknowledge, dispatch, EOI.
    pub fn decode_irq<K: KernelIrq>(&self, kernel: &K, ctx: K::Context) -> K::Context {
        self.decode(kernel, IntGroup::Group1, ctx)
    }

    /// FIQ exception path for group 0 interrupts.
    pub fn decode_fiq<K: KernelIrq>(&self, kernel: &K, ctx: K::Context) -> K::Context {
        self.decode(kernel, IntGroup::Group0, ctx)
    }
}
