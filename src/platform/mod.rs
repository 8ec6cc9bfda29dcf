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
use crate::config::GicConfig;

#[cfg(feature = "platform_fvp")]
pub mod fvp_aarch64;

#[cfg(feature = "platform_fvp")]
pub use fvp_aarch64::*;

#[cfg(all(feature = "platform_qemu", not(feature = "platform_fvp")))]
pub mod qemu_aarch64;

#[cfg(all(feature = "platform_qemu", not(feature = "platform_fvp")))]
pub use qemu_aarch64::*;

#[cfg(not(any(feature = "platform_qemu", feature = "platform_fvp")))]
compile_error!("select a board with the platform_qemu or platform_fvp feature");

/// Controller configuration of the selected board with the build switches applied.
pub fn board_gic_config() -> GicConfig {
    BOARD_GIC_CONFIG
}
