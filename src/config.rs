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
use crate::consts::{MAX_CPU_NUM, PER_GICR_SIZE};
use crate::error::GicResult;

/// How each core finds its redistributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedistLayout {
    /// `gicr_base + cpu * gicr_stride`.
    Strided,
    /// Walk the frames from `gicr_base` until GICR_TYPER.Last, matching
    /// GICR_TYPER.Affinity_Value against the core's MPIDR.
    Scan,
}

/// Bound applied to every register poll (RWP drain, redistributor wake).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinPolicy {
    /// Spin until the hardware answers.
    Forever,
    /// Give up with ETIMEDOUT after this many unsuccessful polls.
    Bounded(usize),
}

impl SpinPolicy {
    /// Spin while `busy()` holds.
    pub fn wait_for(&self, mut busy: impl FnMut() -> bool) -> GicResult {
        let mut spins: usize = 0;
        while busy() {
            if let SpinPolicy::Bounded(max) = *self {
                if spins >= max {
                    return gic_result_err!(ETIMEDOUT, "register poll did not complete");
                }
            }
            spins += 1;
            core::hint::spin_loop();
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GicConfig {
    pub gicd_base: usize,
    pub gicr_base: usize,
    /// Distance between two consecutive redistributors.
    pub gicr_stride: usize,
    pub redist_layout: RedistLayout,
    pub ncpus: usize,
    /// Cores sharing one Aff1 value; used to map logical ids to MPIDR.
    pub cpus_per_cluster: usize,
    /// Group 0 is delivered as FIQ and enabled on every core.
    pub hipri: bool,
    /// Default trigger type programmed for every SPI at boot.
    pub spi_edge: bool,
    /// Force GICD_CTLR.DS and halt if the GIC refuses it.
    pub single_security_state: bool,
    /// Attach and enable the inter-core SGIs.
    pub smp: bool,
    pub poll: SpinPolicy,
}

impl GicConfig {
    pub fn check(&self) -> GicResult {
        if self.gicd_base == 0 || self.gicr_base == 0 {
            return gic_result_err!(EINVAL, "GIC base address missing");
        }
        if self.ncpus == 0 || self.ncpus > MAX_CPU_NUM {
            return gic_result_err!(EINVAL, "unsupported number of cpus");
        }
        if self.cpus_per_cluster == 0 || self.cpus_per_cluster > 256 {
            return gic_result_err!(EINVAL, "unsupported cluster size");
        }
        if self.redist_layout == RedistLayout::Strided && self.gicr_stride < PER_GICR_SIZE {
            return gic_result_err!(EINVAL, "redistributor stride smaller than one frame");
        }
        Ok(())
    }
}
