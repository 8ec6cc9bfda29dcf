#![cfg_attr(not(test), no_std)]
//! GICv3/v4 interrupt controller driver for a multi-core real-time kernel.
//!
//! The kernel reaches the controller through [`device::irqchip::gicv3::Gicv3`],
//! parameterised over a [`device::irqchip::gicv3::hal::GicHal`]; on aarch64
//! bare metal, `arch::aarch64::entry` exports the C ABI the exception vectors
//! and interrupt management code call.
#[macro_use]
pub mod error;
#[macro_use]
extern crate log;

pub mod arch;
pub mod config;
pub mod consts;
pub mod device;
pub mod logging;
pub mod memory;
pub mod percpu;
pub mod platform;

pub use config::{GicConfig, RedistLayout, SpinPolicy};
pub use device::irqchip::gicv3::{Gicv3, IntGroup, IrqFlags, KernelIrq, SmpIpi};
pub use error::{GicError, GicErrorNum, GicResult};
pub use percpu::CpuSet;
