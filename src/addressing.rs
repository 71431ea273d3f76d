//! Operand resolution for the twelve addressing modes.
//!
//! Each resolver runs right after the opcode fetch. It advances PC past the
//! operand bytes and leaves the operand in `fetched` and/or the target in
//! `absolute_address` / `relative_address` for the operation to consume.

use crate::cpu::CPU;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// No operand bytes. Also covers accumulator-mode shifts.
    Implied,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    /// `(zp,X)`
    IndexedIndirect,
    /// `(zp),Y`
    IndirectIndexed,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode.
    pub fn operand_len(self) -> u16 {
        match self {
            AddressingMode::Implied => 0,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::Relative
            | AddressingMode::IndexedIndirect
            | AddressingMode::IndirectIndexed => 1,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
        }
    }
}

/// True when two addresses sit on different 256-byte pages.
#[inline]
pub fn page_crossed(a: u16, b: u16) -> bool {
    (a & 0xFF00) != (b & 0xFF00)
}

impl CPU {
    pub(crate) fn resolve(&mut self, mode: AddressingMode) {
        self.mode = mode;

        match mode {
            AddressingMode::Implied => {
                self.fetched = self.a;
            }
            AddressingMode::Immediate => {
                self.fetched = self.fetch_byte();
            }
            AddressingMode::ZeroPage => {
                let addr = self.fetch_byte() as u16;
                self.load_operand(addr);
            }
            AddressingMode::ZeroPageX => {
                let addr = self.fetch_byte().wrapping_add(self.x) as u16;
                self.load_operand(addr);
            }
            AddressingMode::ZeroPageY => {
                let addr = self.fetch_byte().wrapping_add(self.y) as u16;
                self.load_operand(addr);
            }
            AddressingMode::Relative => {
                let offset = self.fetch_byte() as i8;
                self.relative_address = self.pc.wrapping_add_signed(offset as i16);
            }
            AddressingMode::Absolute => {
                let addr = self.fetch_word();
                self.load_operand(addr);
            }
            AddressingMode::AbsoluteX => {
                let base = self.fetch_word();
                self.load_indexed(base, self.x);
            }
            AddressingMode::AbsoluteY => {
                let base = self.fetch_word();
                self.load_indexed(base, self.y);
            }
            AddressingMode::Indirect => {
                // No page-wrap quirk: the pointer's high byte may come from
                // the next page.
                let ptr = self.fetch_word();
                self.absolute_address = self.memory.read_u16(ptr);
            }
            AddressingMode::IndexedIndirect => {
                let ptr = self.fetch_byte().wrapping_add(self.x) as u16;
                let addr = self.memory.read_u16(ptr);
                self.load_operand(addr);
            }
            AddressingMode::IndirectIndexed => {
                let ptr = self.fetch_byte() as u16;
                let base = self.memory.read_u16(ptr);
                self.load_indexed(base, self.y);
            }
        }
    }

    fn load_operand(&mut self, addr: u16) {
        self.absolute_address = addr;
        self.fetched = self.memory.read(addr);
    }

    fn load_indexed(&mut self, base: u16, index: u8) {
        let addr = base.wrapping_add(index as u16);
        self.load_operand(addr);

        if page_crossed(base, addr) {
            self.wait_cycles += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_at(pc: u16, operands: &[u8]) -> CPU {
        let mut cpu = CPU::new();
        cpu.load(pc, operands);
        cpu.pc = pc;
        cpu
    }

    #[test]
    fn test_implied_takes_accumulator() {
        let mut cpu = cpu_at(0x0200, &[]);
        cpu.a = 0x5A;

        cpu.resolve(AddressingMode::Implied);

        assert_eq!(cpu.fetched, 0x5A);
        assert_eq!(cpu.pc, 0x0200);
    }

    #[test]
    fn test_immediate() {
        let mut cpu = cpu_at(0x0200, &[0x42]);

        cpu.resolve(AddressingMode::Immediate);

        assert_eq!(cpu.fetched, 0x42);
        assert_eq!(cpu.pc, 0x0201);
    }

    #[test]
    fn test_zero_page_x_wraps_within_page_zero() {
        let mut cpu = cpu_at(0x0200, &[0xF0]);
        cpu.x = 0x20;
        cpu.memory.write(0x0010, 0x77);

        cpu.resolve(AddressingMode::ZeroPageX);

        assert_eq!(cpu.absolute_address, 0x0010);
        assert_eq!(cpu.fetched, 0x77);
    }

    #[test]
    fn test_zero_page_y_wraps_within_page_zero() {
        let mut cpu = cpu_at(0x0200, &[0xFF]);
        cpu.y = 0x01;

        cpu.resolve(AddressingMode::ZeroPageY);

        assert_eq!(cpu.absolute_address, 0x0000);
    }

    #[test]
    fn test_relative_backwards() {
        let mut cpu = cpu_at(0x0200, &[0xFE]); // -2

        cpu.resolve(AddressingMode::Relative);

        assert_eq!(cpu.pc, 0x0201);
        assert_eq!(cpu.relative_address, 0x01FF);
    }

    #[test]
    fn test_absolute_reads_operand() {
        let mut cpu = cpu_at(0x0200, &[0x34, 0x12]);
        cpu.memory.write(0x1234, 0x99);

        cpu.resolve(AddressingMode::Absolute);

        assert_eq!(cpu.absolute_address, 0x1234);
        assert_eq!(cpu.fetched, 0x99);
        assert_eq!(cpu.pc, 0x0202);
    }

    #[test]
    fn test_absolute_x_page_cross_adds_cycle() {
        let mut cpu = cpu_at(0x0200, &[0xFF, 0x10]);
        cpu.x = 0x01;

        cpu.resolve(AddressingMode::AbsoluteX);

        assert_eq!(cpu.absolute_address, 0x1100);
        assert_eq!(cpu.wait_cycles, 1);
    }

    #[test]
    fn test_absolute_y_same_page_no_penalty() {
        let mut cpu = cpu_at(0x0200, &[0x00, 0x10]);
        cpu.y = 0xFF;

        cpu.resolve(AddressingMode::AbsoluteY);

        assert_eq!(cpu.absolute_address, 0x10FF);
        assert_eq!(cpu.wait_cycles, 0);
    }

    #[test]
    fn test_absolute_x_wraps_address_space() {
        let mut cpu = cpu_at(0x0200, &[0xFF, 0xFF]);
        cpu.x = 0x02;

        cpu.resolve(AddressingMode::AbsoluteX);

        assert_eq!(cpu.absolute_address, 0x0001);
        assert_eq!(cpu.wait_cycles, 1);
    }

    #[test]
    fn test_indirect_has_no_page_wrap_quirk() {
        let mut cpu = cpu_at(0x0200, &[0xFF, 0x30]);
        cpu.memory.write(0x30FF, 0x80);
        cpu.memory.write(0x3100, 0x50);
        cpu.memory.write(0x3000, 0x40);

        cpu.resolve(AddressingMode::Indirect);

        assert_eq!(cpu.absolute_address, 0x5080);
    }

    #[test]
    fn test_indexed_indirect() {
        let mut cpu = cpu_at(0x0200, &[0x20]);
        cpu.x = 0x04;
        cpu.memory.write(0x0024, 0x74);
        cpu.memory.write(0x0025, 0x20);
        cpu.memory.write(0x2074, 0xAB);

        cpu.resolve(AddressingMode::IndexedIndirect);

        assert_eq!(cpu.absolute_address, 0x2074);
        assert_eq!(cpu.fetched, 0xAB);
        assert_eq!(cpu.pc, 0x0201);
    }

    #[test]
    fn test_indexed_indirect_pointer_wraps_in_zero_page() {
        let mut cpu = cpu_at(0x0200, &[0xFF]);
        cpu.x = 0x02;
        cpu.memory.write(0x0001, 0x00);
        cpu.memory.write(0x0002, 0x40);

        cpu.resolve(AddressingMode::IndexedIndirect);

        assert_eq!(cpu.absolute_address, 0x4000);
    }

    #[test]
    fn test_indirect_indexed_page_cross() {
        let mut cpu = cpu_at(0x0200, &[0x86]);
        cpu.y = 0x10;
        cpu.memory.write(0x0086, 0xF8);
        cpu.memory.write(0x0087, 0x40);
        cpu.memory.write(0x4108, 0x3C);

        cpu.resolve(AddressingMode::IndirectIndexed);

        assert_eq!(cpu.absolute_address, 0x4108);
        assert_eq!(cpu.fetched, 0x3C);
        assert_eq!(cpu.wait_cycles, 1);
    }

    #[test]
    fn test_resolver_records_mode() {
        let mut cpu = cpu_at(0x0200, &[0x00]);

        cpu.resolve(AddressingMode::ZeroPage);

        assert_eq!(cpu.mode, AddressingMode::ZeroPage);
    }

    #[test]
    fn test_operand_lengths() {
        assert_eq!(AddressingMode::Implied.operand_len(), 0);
        assert_eq!(AddressingMode::Relative.operand_len(), 1);
        assert_eq!(AddressingMode::IndirectIndexed.operand_len(), 1);
        assert_eq!(AddressingMode::Indirect.operand_len(), 2);
    }
}
