//! The dispatch table: for every opcode byte, the operation it runs, the
//! addressing mode that feeds it, and its base cycle count.
//!
//! All 256 entries are spelled out. Bytes with no documented instruction
//! are marked `undocumented` and run as a one-byte NOP that still takes the
//! cycle count the real opcode would.

use crate::addressing::AddressingMode;
use crate::addressing::AddressingMode::*;
use crate::instructions::Operation;
use crate::instructions::Operation::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub operation: Operation,
    pub mode: AddressingMode,
    /// Base cycles, before page-crossing or branch penalties.
    pub cycles: u8,
    /// False for bytes outside the documented instruction set.
    pub official: bool,
}

const fn op(operation: Operation, mode: AddressingMode, cycles: u8) -> OpcodeInfo {
    OpcodeInfo {
        operation,
        mode,
        cycles,
        official: true,
    }
}

const fn undocumented(cycles: u8) -> OpcodeInfo {
    OpcodeInfo {
        operation: Nop,
        mode: Implied,
        cycles,
        official: false,
    }
}

pub static OPCODE_TABLE: [OpcodeInfo; 256] = [
    /* 00 */ op(Brk, Implied, 7),
    /* 01 */ op(Ora, IndexedIndirect, 6),
    /* 02 */ undocumented(2),
    /* 03 */ undocumented(8),
    /* 04 */ undocumented(3),
    /* 05 */ op(Ora, ZeroPage, 3),
    /* 06 */ op(Asl, ZeroPage, 5),
    /* 07 */ undocumented(5),
    /* 08 */ op(Php, Implied, 3),
    /* 09 */ op(Ora, Immediate, 2),
    /* 0A */ op(Asl, Implied, 2),
    /* 0B */ undocumented(2),
    /* 0C */ undocumented(4),
    /* 0D */ op(Ora, Absolute, 4),
    /* 0E */ op(Asl, Absolute, 6),
    /* 0F */ undocumented(6),
    /* 10 */ op(Bpl, Relative, 2),
    /* 11 */ op(Ora, IndirectIndexed, 5),
    /* 12 */ undocumented(2),
    /* 13 */ undocumented(8),
    /* 14 */ undocumented(4),
    /* 15 */ op(Ora, ZeroPageX, 4),
    /* 16 */ op(Asl, ZeroPageX, 6),
    /* 17 */ undocumented(6),
    /* 18 */ op(Clc, Implied, 2),
    /* 19 */ op(Ora, AbsoluteY, 4),
    /* 1A */ undocumented(2),
    /* 1B */ undocumented(7),
    /* 1C */ undocumented(4),
    /* 1D */ op(Ora, AbsoluteX, 4),
    /* 1E */ op(Asl, AbsoluteX, 7),
    /* 1F */ undocumented(7),
    /* 20 */ op(Jsr, Absolute, 6),
    /* 21 */ op(And, IndexedIndirect, 6),
    /* 22 */ undocumented(2),
    /* 23 */ undocumented(8),
    /* 24 */ op(Bit, ZeroPage, 3),
    /* 25 */ op(And, ZeroPage, 3),
    /* 26 */ op(Rol, ZeroPage, 5),
    /* 27 */ undocumented(5),
    /* 28 */ op(Plp, Implied, 4),
    /* 29 */ op(And, Immediate, 2),
    /* 2A */ op(Rol, Implied, 2),
    /* 2B */ undocumented(2),
    /* 2C */ op(Bit, Absolute, 4),
    /* 2D */ op(And, Absolute, 4),
    /* 2E */ op(Rol, Absolute, 6),
    /* 2F */ undocumented(6),
    /* 30 */ op(Bmi, Relative, 2),
    /* 31 */ op(And, IndirectIndexed, 5),
    /* 32 */ undocumented(2),
    /* 33 */ undocumented(8),
    /* 34 */ undocumented(4),
    /* 35 */ op(And, ZeroPageX, 4),
    /* 36 */ op(Rol, ZeroPageX, 6),
    /* 37 */ undocumented(6),
    /* 38 */ op(Sec, Implied, 2),
    /* 39 */ op(And, AbsoluteY, 4),
    /* 3A */ undocumented(2),
    /* 3B */ undocumented(7),
    /* 3C */ undocumented(4),
    /* 3D */ op(And, AbsoluteX, 4),
    /* 3E */ op(Rol, AbsoluteX, 7),
    /* 3F */ undocumented(7),
    /* 40 */ op(Rti, Implied, 6),
    /* 41 */ op(Eor, IndexedIndirect, 6),
    /* 42 */ undocumented(2),
    /* 43 */ undocumented(8),
    /* 44 */ undocumented(3),
    /* 45 */ op(Eor, ZeroPage, 3),
    /* 46 */ op(Lsr, ZeroPage, 5),
    /* 47 */ undocumented(5),
    /* 48 */ op(Pha, Implied, 3),
    /* 49 */ op(Eor, Immediate, 2),
    /* 4A */ op(Lsr, Implied, 2),
    /* 4B */ undocumented(2),
    /* 4C */ op(Jmp, Absolute, 3),
    /* 4D */ op(Eor, Absolute, 4),
    /* 4E */ op(Lsr, Absolute, 6),
    /* 4F */ undocumented(6),
    /* 50 */ op(Bvc, Relative, 2),
    /* 51 */ op(Eor, IndirectIndexed, 5),
    /* 52 */ undocumented(2),
    /* 53 */ undocumented(8),
    /* 54 */ undocumented(4),
    /* 55 */ op(Eor, ZeroPageX, 4),
    /* 56 */ op(Lsr, ZeroPageX, 6),
    /* 57 */ undocumented(6),
    /* 58 */ op(Cli, Implied, 2),
    /* 59 */ op(Eor, AbsoluteY, 4),
    /* 5A */ undocumented(2),
    /* 5B */ undocumented(7),
    /* 5C */ undocumented(4),
    /* 5D */ op(Eor, AbsoluteX, 4),
    /* 5E */ op(Lsr, AbsoluteX, 7),
    /* 5F */ undocumented(7),
    /* 60 */ op(Rts, Implied, 6),
    /* 61 */ op(Adc, IndexedIndirect, 6),
    /* 62 */ undocumented(2),
    /* 63 */ undocumented(8),
    /* 64 */ undocumented(3),
    /* 65 */ op(Adc, ZeroPage, 3),
    /* 66 */ op(Ror, ZeroPage, 5),
    /* 67 */ undocumented(5),
    /* 68 */ op(Pla, Implied, 4),
    /* 69 */ op(Adc, Immediate, 2),
    /* 6A */ op(Ror, Implied, 2),
    /* 6B */ undocumented(2),
    /* 6C */ op(Jmp, Indirect, 5),
    /* 6D */ op(Adc, Absolute, 4),
    /* 6E */ op(Ror, Absolute, 6),
    /* 6F */ undocumented(6),
    /* 70 */ op(Bvs, Relative, 2),
    /* 71 */ op(Adc, IndirectIndexed, 5),
    /* 72 */ undocumented(2),
    /* 73 */ undocumented(8),
    /* 74 */ undocumented(4),
    /* 75 */ op(Adc, ZeroPageX, 4),
    /* 76 */ op(Ror, ZeroPageX, 6),
    /* 77 */ undocumented(6),
    /* 78 */ op(Sei, Implied, 2),
    /* 79 */ op(Adc, AbsoluteY, 4),
    /* 7A */ undocumented(2),
    /* 7B */ undocumented(7),
    /* 7C */ undocumented(4),
    /* 7D */ op(Adc, AbsoluteX, 4),
    /* 7E */ op(Ror, AbsoluteX, 7),
    /* 7F */ undocumented(7),
    /* 80 */ undocumented(2),
    /* 81 */ op(Sta, IndexedIndirect, 6),
    /* 82 */ undocumented(2),
    /* 83 */ undocumented(6),
    /* 84 */ op(Sty, ZeroPage, 3),
    /* 85 */ op(Sta, ZeroPage, 3),
    /* 86 */ op(Stx, ZeroPage, 3),
    /* 87 */ undocumented(3),
    /* 88 */ op(Dey, Implied, 2),
    /* 89 */ undocumented(2),
    /* 8A */ op(Txa, Implied, 2),
    /* 8B */ undocumented(2),
    /* 8C */ op(Sty, Absolute, 4),
    /* 8D */ op(Sta, Absolute, 4),
    /* 8E */ op(Stx, Absolute, 4),
    /* 8F */ undocumented(4),
    /* 90 */ op(Bcc, Relative, 2),
    /* 91 */ op(Sta, IndirectIndexed, 6),
    /* 92 */ undocumented(2),
    /* 93 */ undocumented(6),
    /* 94 */ op(Sty, ZeroPageX, 4),
    /* 95 */ op(Sta, ZeroPageX, 4),
    /* 96 */ op(Stx, ZeroPageY, 4),
    /* 97 */ undocumented(4),
    /* 98 */ op(Tya, Implied, 2),
    /* 99 */ op(Sta, AbsoluteY, 5),
    /* 9A */ op(Txs, Implied, 2),
    /* 9B */ undocumented(5),
    /* 9C */ undocumented(5),
    /* 9D */ op(Sta, AbsoluteX, 5),
    /* 9E */ undocumented(5),
    /* 9F */ undocumented(5),
    /* A0 */ op(Ldy, Immediate, 2),
    /* A1 */ op(Lda, IndexedIndirect, 6),
    /* A2 */ op(Ldx, Immediate, 2),
    /* A3 */ undocumented(6),
    /* A4 */ op(Ldy, ZeroPage, 3),
    /* A5 */ op(Lda, ZeroPage, 3),
    /* A6 */ op(Ldx, ZeroPage, 3),
    /* A7 */ undocumented(3),
    /* A8 */ op(Tay, Implied, 2),
    /* A9 */ op(Lda, Immediate, 2),
    /* AA */ op(Tax, Implied, 2),
    /* AB */ undocumented(2),
    /* AC */ op(Ldy, Absolute, 4),
    /* AD */ op(Lda, Absolute, 4),
    /* AE */ op(Ldx, Absolute, 4),
    /* AF */ undocumented(4),
    /* B0 */ op(Bcs, Relative, 2),
    /* B1 */ op(Lda, IndirectIndexed, 5),
    /* B2 */ undocumented(2),
    /* B3 */ undocumented(5),
    /* B4 */ op(Ldy, ZeroPageX, 4),
    /* B5 */ op(Lda, ZeroPageX, 4),
    /* B6 */ op(Ldx, ZeroPageY, 4),
    /* B7 */ undocumented(4),
    /* B8 */ op(Clv, Implied, 2),
    /* B9 */ op(Lda, AbsoluteY, 4),
    /* BA */ op(Tsx, Implied, 2),
    /* BB */ undocumented(4),
    /* BC */ op(Ldy, AbsoluteX, 4),
    /* BD */ op(Lda, AbsoluteX, 4),
    /* BE */ op(Ldx, AbsoluteY, 4),
    /* BF */ undocumented(4),
    /* C0 */ op(Cpy, Immediate, 2),
    /* C1 */ op(Cmp, IndexedIndirect, 6),
    /* C2 */ undocumented(2),
    /* C3 */ undocumented(8),
    /* C4 */ op(Cpy, ZeroPage, 3),
    /* C5 */ op(Cmp, ZeroPage, 3),
    /* C6 */ op(Dec, ZeroPage, 5),
    /* C7 */ undocumented(5),
    /* C8 */ op(Iny, Implied, 2),
    /* C9 */ op(Cmp, Immediate, 2),
    /* CA */ op(Dex, Implied, 2),
    /* CB */ undocumented(2),
    /* CC */ op(Cpy, Absolute, 4),
    /* CD */ op(Cmp, Absolute, 4),
    /* CE */ op(Dec, Absolute, 6),
    /* CF */ undocumented(6),
    /* D0 */ op(Bne, Relative, 2),
    /* D1 */ op(Cmp, IndirectIndexed, 5),
    /* D2 */ undocumented(2),
    /* D3 */ undocumented(8),
    /* D4 */ undocumented(4),
    /* D5 */ op(Cmp, ZeroPageX, 4),
    /* D6 */ op(Dec, ZeroPageX, 6),
    /* D7 */ undocumented(6),
    /* D8 */ op(Cld, Implied, 2),
    /* D9 */ op(Cmp, AbsoluteY, 4),
    /* DA */ undocumented(2),
    /* DB */ undocumented(7),
    /* DC */ undocumented(4),
    /* DD */ op(Cmp, AbsoluteX, 4),
    /* DE */ op(Dec, AbsoluteX, 7),
    /* DF */ undocumented(7),
    /* E0 */ op(Cpx, Immediate, 2),
    /* E1 */ op(Sbc, IndexedIndirect, 6),
    /* E2 */ undocumented(2),
    /* E3 */ undocumented(8),
    /* E4 */ op(Cpx, ZeroPage, 3),
    /* E5 */ op(Sbc, ZeroPage, 3),
    /* E6 */ op(Inc, ZeroPage, 5),
    /* E7 */ undocumented(5),
    /* E8 */ op(Inx, Implied, 2),
    /* E9 */ op(Sbc, Immediate, 2),
    /* EA */ op(Nop, Implied, 2),
    /* EB */ undocumented(2),
    /* EC */ op(Cpx, Absolute, 4),
    /* ED */ op(Sbc, Absolute, 4),
    /* EE */ op(Inc, Absolute, 6),
    /* EF */ undocumented(6),
    /* F0 */ op(Beq, Relative, 2),
    /* F1 */ op(Sbc, IndirectIndexed, 5),
    /* F2 */ undocumented(2),
    /* F3 */ undocumented(8),
    /* F4 */ undocumented(4),
    /* F5 */ op(Sbc, ZeroPageX, 4),
    /* F6 */ op(Inc, ZeroPageX, 6),
    /* F7 */ undocumented(6),
    /* F8 */ op(Sed, Implied, 2),
    /* F9 */ op(Sbc, AbsoluteY, 4),
    /* FA */ undocumented(2),
    /* FB */ undocumented(7),
    /* FC */ undocumented(4),
    /* FD */ op(Sbc, AbsoluteX, 4),
    /* FE */ op(Inc, AbsoluteX, 7),
    /* FF */ undocumented(7),
];

/// Looks up the table entry for an opcode byte.
pub fn lookup(opcode: u8) -> &'static OpcodeInfo {
    &OPCODE_TABLE[opcode as usize]
}
