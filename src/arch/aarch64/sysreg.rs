// Copyright 2023 The arm-gic Authors.
// This project is dual-licensed under Apache 2.0 and MIT terms.
// See LICENSE-APACHE and LICENSE-MIT for details.
use crate::device::irqchip::gicv3::hal::IccReg;

/// Reads and returns the value of the given aarch64 system register.
/// let intid = read_sysreg!(icc_iar1_el1) as u32;
macro_rules! read_sysreg {
    ($name:ident) => {
        {
            let mut value: u64;
            unsafe{::core::arch::asm!(
                concat!("mrs {value:x}, ", ::core::stringify!($name)),
                value = out(reg) value,
                options(nomem, nostack),
            );}
            value
        }
    }
}
pub(crate) use read_sysreg;

/// Writes the given value to the given aarch64 system register.
/// write_sysreg!(icc_sgi1r_el1, val);
macro_rules! write_sysreg {
    ($name:ident, $value:expr) => {
        {
            let v: u64 = $value;
            unsafe{::core::arch::asm!(
                concat!("msr ", ::core::stringify!($name), ", {value:x}"),
                value = in(reg) v,
                options(nomem, nostack),
            )}
        }
    }
}
pub(crate) use write_sysreg;

pub fn read_icc(reg: IccReg) -> u64 {
    match reg {
        IccReg::Sre => read_sysreg!(icc_sre_el1),
        IccReg::Pmr => read_sysreg!(icc_pmr_el1),
        IccReg::Igrpen0 => read_sysreg!(icc_igrpen0_el1),
        IccReg::Igrpen1 => read_sysreg!(icc_igrpen1_el1),
        IccReg::Iar0 => read_sysreg!(icc_iar0_el1),
        IccReg::Iar1 => read_sysreg!(icc_iar1_el1),
        IccReg::Eoir0 | IccReg::Eoir1 | IccReg::Sgi1r => {
            warn!("read of write-only {:?}", reg);
            0
        }
    }
}

pub fn write_icc(reg: IccReg, val: u64) {
    match reg {
        IccReg::Sre => write_sysreg!(icc_sre_el1, val),
        IccReg::Pmr => write_sysreg!(icc_pmr_el1, val),
        IccReg::Igrpen0 => write_sysreg!(icc_igrpen0_el1, val),
        IccReg::Igrpen1 => write_sysreg!(icc_igrpen1_el1, val),
        IccReg::Eoir0 => write_sysreg!(icc_eoir0_el1, val),
        IccReg::Eoir1 => write_sysreg!(icc_eoir1_el1, val),
        IccReg::Sgi1r => write_sysreg!(icc_sgi1r_el1, val),
        IccReg::Iar0 | IccReg::Iar1 => warn!("write of read-only {:?}", reg),
    }
}
