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
/// Upper bound on cores the redistributor table and cpu sets can describe.
pub const MAX_CPU_NUM: usize = 16;

/// Size of one GICv3 redistributor (RD_base + SGI_base frames).
pub const PER_GICR_SIZE: usize = 0x20000;

/// Size of one GICv4 redistributor: RD_base and SGI_base plus the VLPI and reserved frames.
pub const PER_GICR_V4_SIZE: usize = 0x40000;

/// Scheduler pause/resume request between cores.
pub const SGI_SMP_SCHED_ID: u32 = 1;

/// Cross-core function call request.
pub const SGI_SMP_CALL_ID: u32 = 2;
