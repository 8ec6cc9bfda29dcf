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
use crate::config::{GicConfig, RedistLayout, SpinPolicy};
use crate::consts::PER_GICR_SIZE;

pub const BOARD_NAME: &str = "qemu-gicv3";

pub const BOARD_NCPUS: usize = 4;

pub const BOARD_CPUS_PER_CLUSTER: usize = 4;

pub const BOARD_GIC_CONFIG: GicConfig = GicConfig {
    gicd_base: 0x8000000,
    gicr_base: 0x80a0000,
    gicr_stride: PER_GICR_SIZE,
    redist_layout: RedistLayout::Strided,
    ncpus: BOARD_NCPUS,
    cpus_per_cluster: BOARD_CPUS_PER_CLUSTER,
    hipri: cfg!(feature = "hipri"),
    spi_edge: cfg!(feature = "spi_edge"),
    single_security_state: cfg!(feature = "single_security_state"),
    smp: cfg!(feature = "smp"),
    poll: SpinPolicy::Forever,
};
