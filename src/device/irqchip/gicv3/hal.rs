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
use crate::memory::MmioOps;

/// GIC CPU interface system registers the driver touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IccReg {
    Sre,
    Pmr,
    Igrpen0,
    Igrpen1,
    Iar0,
    Iar1,
    Eoir0,
    Eoir1,
    Sgi1r,
}

/// Everything the controller logic needs from the core it runs on.
pub trait GicHal: MmioOps + Sync {
    /// Logical id of the executing core.
    fn cpu_id(&self) -> usize;

    /// MPIDR of logical core `cpu`.
    fn cpu_mpidr(&self, cpu: usize) -> u64;

    fn read_icc(&self, reg: IccReg) -> u64;
    fn write_icc(&self, reg: IccReg, val: u64);

    /// Full-system data synchronization barrier.
    fn dsb(&self);
    /// Instruction synchronization barrier.
    fn isb(&self);

    /// Mask IRQ and FIQ on this core, returning the previous mask state.
    fn irq_save(&self) -> usize;
    fn irq_restore(&self, flags: usize);
}
