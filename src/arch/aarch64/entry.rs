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
//! C ABI the kernel calls, and the kernel hooks this driver calls back.
//!
//! Every function returns 0 or a negated errno.
use spin::Once;

use super::hal::ArchGicHal;
use crate::device::irqchip::gicv3::{Gicv3, IrqFlags, KernelIrq, SmpIpi};
use crate::error::GicResult;
use crate::logging::{self, Console};
use crate::platform::{board_gic_config, BOARD_NAME};

extern "C" {
    /// Generic dispatch of interrupt `irq`; returns the context to resume.
    fn kernel_irq_dispatch(irq: u32, regs: *mut u64) -> *mut u64;
    fn kernel_fiq_dispatch(fiq: u32, regs: *mut u64) -> *mut u64;
    /// Attach the kernel's handler for `ipi` (0 scheduler, 1 call) to SGI `irq`.
    fn kernel_ipi_attach(irq: u32, ipi: u32) -> i32;
    fn kernel_console_putc(c: u8);
}

struct KernelConsole;

impl Console for KernelConsole {
    fn putchar(&self, c: u8) {
        unsafe { kernel_console_putc(c) }
    }

    fn cpu_id(&self) -> usize {
        super::cpu::this_cpu_id(board_gic_config().cpus_per_cluster)
    }
}

static KERNEL_CONSOLE: KernelConsole = KernelConsole;

struct ExternKernel;

impl KernelIrq for ExternKernel {
    type Context = *mut u64;

    fn do_irq(&self, irq: u32, ctx: *mut u64) -> *mut u64 {
        unsafe { kernel_irq_dispatch(irq, ctx) }
    }

    fn do_fiq(&self, fiq: u32, ctx: *mut u64) -> *mut u64 {
        unsafe { kernel_fiq_dispatch(fiq, ctx) }
    }

    fn attach_ipi(&self, irq: u32, ipi: SmpIpi) -> GicResult {
        let which = match ipi {
            SmpIpi::Sched => 0,
            SmpIpi::Call => 1,
        };
        match unsafe { kernel_ipi_attach(irq, which) } {
            0 => Ok(()),
            _ => gic_result_err!(EBUSY, "kernel refused the IPI handler"),
        }
    }
}

static GIC: Once<Gicv3<ArchGicHal>> = Once::new();

fn gic() -> GicResult<&'static Gicv3<ArchGicHal>> {
    GIC.get()
        .ok_or_else(|| gic_err!(ENODEV, "controller not initialized"))
}

fn intid(irq: i32) -> GicResult<u32> {
    u32::try_from(irq).map_err(|_| gic_err!(EINVAL, "negative interrupt id"))
}

fn status(res: GicResult) -> i32 {
    match res {
        Ok(()) => 0,
        Err(e) => {
            debug!("gic call failed: {:?}", e);
            e.code() as i32
        }
    }
}

fn irq_flags(flags: u32) -> IrqFlags {
    IrqFlags::from_bits_truncate(flags)
}

/// Route driver log records to the kernel console.
#[no_mangle]
pub extern "C" fn gic_log_init() -> i32 {
    status(logging::init(&KERNEL_CONSOLE))
}

/// Boot core: probe and set up the distributor and this core's interface.
#[no_mangle]
pub extern "C" fn gic_initialize() -> i32 {
    let config = board_gic_config();
    info!("gicv3 on {}", BOARD_NAME);
    let gic = match Gicv3::new(ArchGicHal::new(config.cpus_per_cluster), config) {
        Ok(gic) => gic,
        Err(e) => return status(Err(e)),
    };
    status(GIC.call_once(|| gic).primary_init(&ExternKernel))
}

/// Secondary cores, once each.
#[no_mangle]
pub extern "C" fn gic_secondary_init() -> i32 {
    status(gic().and_then(|gic| gic.percpu_init()))
}

#[no_mangle]
pub extern "C" fn gic_enable_irq(irq: i32) -> i32 {
    status(gic().and_then(|gic| gic.enable(intid(irq)?)))
}

#[no_mangle]
pub extern "C" fn gic_disable_irq(irq: i32) -> i32 {
    status(gic().and_then(|gic| gic.disable(intid(irq)?)))
}

/// 1 if enabled, 0 if not.
#[no_mangle]
pub extern "C" fn gic_irq_is_enabled(irq: i32) -> i32 {
    match gic().and_then(|gic| gic.is_enabled(intid(irq)?)) {
        Ok(enabled) => enabled as i32,
        Err(e) => e.code() as i32,
    }
}

#[no_mangle]
pub extern "C" fn gic_prioritize_irq(irq: i32, priority: i32) -> i32 {
    status(gic().and_then(|gic| {
        let priority = u32::try_from(priority).map_err(|_| gic_err!(EINVAL))?;
        gic.prioritize(intid(irq)?, priority)
    }))
}

#[no_mangle]
pub extern "C" fn gic_irq_set_priority(irq: i32, priority: u8, flags: u32) -> i32 {
    status(gic().and_then(|gic| gic.set_priority(intid(irq)?, priority, irq_flags(flags))))
}

#[no_mangle]
pub extern "C" fn gic_irq_trigger(irq: i32, flags: u32) -> i32 {
    status(gic().and_then(|gic| gic.set_trigger(intid(irq)?, irq_flags(flags))))
}

#[no_mangle]
pub extern "C" fn gic_affinity_irq(irq: i32, cpuset: u64) -> i32 {
    status(gic().and_then(|gic| {
        let cpus = gic.cpus_from_mask(cpuset)?;
        gic.set_affinity(intid(irq)?, &cpus)
    }))
}

#[no_mangle]
pub extern "C" fn gic_trigger_irq(irq: i32, cpuset: u64) -> i32 {
    status(gic().and_then(|gic| {
        let cpus = gic.cpus_from_mask(cpuset)?;
        gic.trigger(intid(irq)?, &cpus)
    }))
}

#[no_mangle]
pub extern "C" fn gic_raise_sgi(sgi: u32, cpuset: u64) -> i32 {
    status(gic().and_then(|gic| {
        let cpus = gic.cpus_from_mask(cpuset)?;
        gic.raise_sgi(sgi, &cpus)
    }))
}

/// Called from the IRQ vector with the saved registers.
#[no_mangle]
pub extern "C" fn gic_decode_irq(regs: *mut u64) -> *mut u64 {
    match GIC.get() {
        Some(gic) => gic.decode_irq(&ExternKernel, regs),
        None => regs,
    }
}

/// Called from the FIQ vector with the saved registers.
#[no_mangle]
pub extern "C" fn gic_decode_fiq(regs: *mut u64) -> *mut u64 {
    match GIC.get() {
        Some(gic) => gic.decode_fiq(&ExternKernel, regs),
        None => regs,
    }
}
