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
use core::ptr;

/// 32-bit and 8-bit access to memory-mapped controller registers.
///
/// Addresses are absolute. The hardware implementation performs volatile
/// accesses; tests substitute a register model.
pub trait MmioOps {
    fn read32(&self, addr: usize) -> u32;
    fn write32(&self, addr: usize, val: u32);
    fn write8(&self, addr: usize, val: u8);
}

/// # Safety
///
/// `addr` must be a mapped, 4-byte aligned device register.
pub unsafe fn mmio_read32(addr: usize) -> u32 {
    ptr::read_volatile(addr as *const u32)
}

/// # Safety
///
/// `addr` must be a mapped, 4-byte aligned device register.
pub unsafe fn mmio_write32(addr: usize, val: u32) {
    ptr::write_volatile(addr as *mut u32, val)
}

/// # Safety
///
/// `addr` must be a mapped, byte-accessible device register.
pub unsafe fn mmio_write8(addr: usize, val: u8) {
    ptr::write_volatile(addr as *mut u8, val)
}

/// Read-modify-write that sets `bit` of the word at `addr`.
pub fn sys_set_bit<M: MmioOps + ?Sized>(mmio: &M, addr: usize, bit: u32) {
    let val = mmio.read32(addr);
    mmio.write32(addr, val | (1 << bit));
}

pub fn sys_clear_bit<M: MmioOps + ?Sized>(mmio: &M, addr: usize, bit: u32) {
    let val = mmio.read32(addr);
    mmio.write32(addr, val & !(1 << bit));
}

pub fn sys_test_bit<M: MmioOps + ?Sized>(mmio: &M, addr: usize, bit: u32) -> bool {
    mmio.read32(addr) & (1 << bit) != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    struct Regs(RefCell<BTreeMap<usize, u32>>);

    impl MmioOps for Regs {
        fn read32(&self, addr: usize) -> u32 {
            *self.0.borrow().get(&addr).unwrap_or(&0)
        }
        fn write32(&self, addr: usize, val: u32) {
            self.0.borrow_mut().insert(addr, val);
        }
        fn write8(&self, addr: usize, val: u8) {
            let word = addr & !3;
            let shift = (addr & 3) * 8;
            let old = self.read32(word) & !(0xff << shift);
            self.write32(word, old | ((val as u32) << shift));
        }
    }

    #[test]
    fn test_sys_bit_helpers() {
        let regs = Regs(RefCell::new(BTreeMap::new()));
        regs.write32(0x14, 0b100);
        sys_set_bit(&regs, 0x14, 1);
        assert_eq!(regs.read32(0x14), 0b110);
        assert!(sys_test_bit(&regs, 0x14, 2));
        sys_clear_bit(&regs, 0x14, 2);
        assert_eq!(regs.read32(0x14), 0b010);
        assert!(!sys_test_bit(&regs, 0x14, 2));
    }

    #[test]
    fn test_volatile_access_on_plain_memory() {
        let mut word: u32 = 0;
        let addr = &mut word as *mut u32 as usize;
        unsafe {
            mmio_write32(addr, 0xa0a0_a0a0);
            mmio_write8(addr + 1, 0x10);
            assert_eq!(mmio_read32(addr), u32::from_le_bytes([0xa0, 0x10, 0xa0, 0xa0]));
        }
    }
}
