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
//! Software generated interrupts through ICC_SGI1R_EL1.
//!
//! Targets are grouped by cluster, where a cluster is every core sharing
//! Aff3.Aff2.Aff1 and the same Range Selector (`Aff0 / 16`). One write
//! reaches up to sixteen cores of one cluster through the target list.
use tock_registers::{register_bitfields, LocalRegisterCopy};

use super::hal::{GicHal, IccReg};
use super::{is_sgi, Gicv3};
use crate::arch::{mpidr_afflvl, MPIDR_AFFINITY_MASK};
use crate::error::GicResult;
use crate::percpu::CpuSet;

register_bitfields! {u64,
    pub ICC_SGI1R [
        TargetList OFFSET(0) NUMBITS(16) [],
        Aff1 OFFSET(16) NUMBITS(8) [],
        INTID OFFSET(24) NUMBITS(4) [],
        Aff2 OFFSET(32) NUMBITS(8) [],
        IRM OFFSET(40) NUMBITS(1) [
            ToAffinity = 0,
            Broadcast = 1
        ],
        RS OFFSET(44) NUMBITS(4) [],
        Aff3 OFFSET(48) NUMBITS(8) []
    ]
}

/// Cluster key of `mpidr`: affinity with the target-list nibble of Aff0 cleared.
pub fn sgi_cluster_id(mpidr: u64) -> u64 {
    mpidr & MPIDR_AFFINITY_MASK & !0xf
}

/// Target list bit of `mpidr` inside its cluster.
pub fn sgi_target_bit(mpidr: u64) -> u16 {
    1 << (mpidr & 0xf)
}

/// ICC_SGI1R_EL1 value sending `sgi` to `tlist` in cluster `cluster`.
pub fn sgi1r_value(cluster: u64, sgi: u32, tlist: u16) -> u64 {
    let mut val = LocalRegisterCopy::<u64, ICC_SGI1R::Register>::new(0);
    val.modify(
        ICC_SGI1R::TargetList.val(tlist as u64)
            + ICC_SGI1R::Aff1.val(mpidr_afflvl(cluster, 1))
            + ICC_SGI1R::INTID.val(sgi as u64)
            + ICC_SGI1R::Aff2.val(mpidr_afflvl(cluster, 2))
            + ICC_SGI1R::IRM::ToAffinity
            + ICC_SGI1R::RS.val(mpidr_afflvl(cluster, 0) >> 4)
            + ICC_SGI1R::Aff3.val(mpidr_afflvl(cluster, 3)),
    );
    val.get()
}

impl<H: GicHal> Gicv3<H> {
    /// One ICC_SGI1R_EL1 write, fenced on both sides.
    pub fn send_sgi(&self, sgi: u32, cluster: u64, tlist: u16) {
        let val = sgi1r_value(cluster, sgi, tlist);
        trace!("sgi {} -> cluster {:#x} tlist {:#x}", sgi, cluster, tlist);
        self.hal.dsb();
        self.hal.write_icc(IccReg::Sgi1r, val);
        self.hal.isb();
    }

    /// Send `sgi` to every core in `targets`, one write per run of
    /// consecutive targets sharing a cluster.
    pub fn raise_sgi(&self, sgi: u32, targets: &CpuSet) -> GicResult {
        if !is_sgi(sgi) {
            return gic_result_err!(EINVAL, "not an SGI");
        }
        if targets.iter().any(|cpu| cpu >= self.config.ncpus) {
            return gic_result_err!(EINVAL, "cpu not present");
        }

        let mut pending: Option<(u64, u16)> = None;
        for cpu in targets.iter() {
            let mpidr = self.hal.cpu_mpidr(cpu);
            let cluster = sgi_cluster_id(mpidr);
            let bit = sgi_target_bit(mpidr);
            pending = match pending {
                Some((prev, tlist)) if prev == cluster => Some((prev, tlist | bit)),
                Some((prev, tlist)) => {
                    self.send_sgi(sgi, prev, tlist);
                    Some((cluster, bit))
                }
                None => Some((cluster, bit)),
            };
        }
        if let Some((cluster, tlist)) = pending {
            self.send_sgi(sgi, cluster, tlist);
        }
        Ok(())
    }
}
