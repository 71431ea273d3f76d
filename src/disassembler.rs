//! Renders instructions from memory as assembly text, driven by the same
//! table the processor dispatches on.

use serde::Serialize;

use crate::addressing::AddressingMode;
use crate::memory::Memory;
use crate::opcodes::lookup;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisassembledInstruction {
    pub address: u16,
    pub bytes: Vec<u8>,
    pub mnemonic: &'static str,
    pub operand: String,
    pub official: bool,
}

impl DisassembledInstruction {
    /// Size of the instruction in bytes.
    pub fn len(&self) -> u16 {
        self.bytes.len() as u16
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Assembly text, e.g. `LDA ($10),Y`. Undocumented bytes are shown as a
    /// starred NOP.
    pub fn text(&self) -> String {
        let marker = if self.official { "" } else { "*" };
        if self.operand.is_empty() {
            format!("{}{}", marker, self.mnemonic)
        } else {
            format!("{}{} {}", marker, self.mnemonic, self.operand)
        }
    }
}

pub fn disassemble(memory: &Memory, address: u16) -> DisassembledInstruction {
    let opcode = memory.read(address);
    let entry = lookup(opcode);
    let length = 1 + entry.mode.operand_len();
    let bytes = memory.read_range(address, length as usize);

    let byte = bytes.get(1).copied().unwrap_or(0);
    let word = u16::from_le_bytes([byte, bytes.get(2).copied().unwrap_or(0)]);

    let operand = match entry.mode {
        AddressingMode::Implied if entry.operation.uses_accumulator() => "A".to_string(),
        AddressingMode::Implied => String::new(),
        AddressingMode::Immediate => format!("#${:02X}", byte),
        AddressingMode::ZeroPage => format!("${:02X}", byte),
        AddressingMode::ZeroPageX => format!("${:02X},X", byte),
        AddressingMode::ZeroPageY => format!("${:02X},Y", byte),
        AddressingMode::Relative => {
            let target = address
                .wrapping_add(2)
                .wrapping_add_signed(byte as i8 as i16);
            format!("${:04X}", target)
        }
        AddressingMode::Absolute => format!("${:04X}", word),
        AddressingMode::AbsoluteX => format!("${:04X},X", word),
        AddressingMode::AbsoluteY => format!("${:04X},Y", word),
        AddressingMode::Indirect => format!("(${:04X})", word),
        AddressingMode::IndexedIndirect => format!("(${:02X},X)", byte),
        AddressingMode::IndirectIndexed => format!("(${:02X}),Y", byte),
    };

    DisassembledInstruction {
        address,
        bytes,
        mnemonic: entry.operation.mnemonic(),
        operand,
        official: entry.official,
    }
}

/// Disassembles `count` consecutive instructions starting at `address`.
pub fn disassemble_range(memory: &Memory, address: u16, count: usize) -> Vec<DisassembledInstruction> {
    let mut lines = Vec::with_capacity(count);
    let mut addr = address;

    for _ in 0..count {
        let instruction = disassemble(memory, addr);
        addr = addr.wrapping_add(instruction.len());
        lines.push(instruction);
    }

    lines
}
