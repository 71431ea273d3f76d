use crate::addressing::{page_crossed, AddressingMode};
use crate::cpu::{BRK_VECTOR, CPU};
use crate::status::{Flag, Status};

/// The documented 6502 operations. Undocumented opcode bytes dispatch to
/// `Nop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi,
    Bne, Bpl, Brk, Bvc, Bvs, Clc, Cld, Cli,
    Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor,
    Inc, Inx, Iny, Jmp, Jsr, Lda, Ldx, Ldy,
    Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol,
    Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta,
    Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

impl Operation {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Operation::Adc => "ADC",
            Operation::And => "AND",
            Operation::Asl => "ASL",
            Operation::Bcc => "BCC",
            Operation::Bcs => "BCS",
            Operation::Beq => "BEQ",
            Operation::Bit => "BIT",
            Operation::Bmi => "BMI",
            Operation::Bne => "BNE",
            Operation::Bpl => "BPL",
            Operation::Brk => "BRK",
            Operation::Bvc => "BVC",
            Operation::Bvs => "BVS",
            Operation::Clc => "CLC",
            Operation::Cld => "CLD",
            Operation::Cli => "CLI",
            Operation::Clv => "CLV",
            Operation::Cmp => "CMP",
            Operation::Cpx => "CPX",
            Operation::Cpy => "CPY",
            Operation::Dec => "DEC",
            Operation::Dex => "DEX",
            Operation::Dey => "DEY",
            Operation::Eor => "EOR",
            Operation::Inc => "INC",
            Operation::Inx => "INX",
            Operation::Iny => "INY",
            Operation::Jmp => "JMP",
            Operation::Jsr => "JSR",
            Operation::Lda => "LDA",
            Operation::Ldx => "LDX",
            Operation::Ldy => "LDY",
            Operation::Lsr => "LSR",
            Operation::Nop => "NOP",
            Operation::Ora => "ORA",
            Operation::Pha => "PHA",
            Operation::Php => "PHP",
            Operation::Pla => "PLA",
            Operation::Plp => "PLP",
            Operation::Rol => "ROL",
            Operation::Ror => "ROR",
            Operation::Rti => "RTI",
            Operation::Rts => "RTS",
            Operation::Sbc => "SBC",
            Operation::Sec => "SEC",
            Operation::Sed => "SED",
            Operation::Sei => "SEI",
            Operation::Sta => "STA",
            Operation::Stx => "STX",
            Operation::Sty => "STY",
            Operation::Tax => "TAX",
            Operation::Tay => "TAY",
            Operation::Tsx => "TSX",
            Operation::Txa => "TXA",
            Operation::Txs => "TXS",
            Operation::Tya => "TYA",
        }
    }

    /// Shift and rotate operations, which act on A in implied mode.
    pub fn uses_accumulator(self) -> bool {
        matches!(self, Operation::Asl | Operation::Lsr | Operation::Rol | Operation::Ror)
    }
}

impl CPU {
    pub(crate) fn execute(&mut self, operation: Operation) {
        match operation {
            // Load / store
            Operation::Lda => {
                self.a = self.fetched;
                self.update_zero_and_negative_flags(self.a);
            }
            Operation::Ldx => {
                self.x = self.fetched;
                self.update_zero_and_negative_flags(self.x);
            }
            Operation::Ldy => {
                self.y = self.fetched;
                self.update_zero_and_negative_flags(self.y);
            }
            Operation::Sta => self.memory.write(self.absolute_address, self.a),
            Operation::Stx => self.memory.write(self.absolute_address, self.x),
            Operation::Sty => self.memory.write(self.absolute_address, self.y),

            // Arithmetic
            Operation::Adc => self.add_with_carry(self.fetched),
            Operation::Sbc => self.add_with_carry(!self.fetched),
            Operation::Cmp => self.compare(self.a),
            Operation::Cpx => self.compare(self.x),
            Operation::Cpy => self.compare(self.y),

            // Logical
            Operation::And => {
                self.a &= self.fetched;
                self.update_zero_and_negative_flags(self.a);
            }
            Operation::Ora => {
                self.a |= self.fetched;
                self.update_zero_and_negative_flags(self.a);
            }
            Operation::Eor => {
                self.a ^= self.fetched;
                self.update_zero_and_negative_flags(self.a);
            }
            Operation::Bit => self.bit(),

            // Shifts and rotates
            Operation::Asl => self.asl(),
            Operation::Lsr => self.lsr(),
            Operation::Rol => self.rol(),
            Operation::Ror => self.ror(),

            // Increment / decrement
            Operation::Inc => {
                let value = self.fetched.wrapping_add(1);
                self.update_zero_and_negative_flags(value);
                self.memory.write(self.absolute_address, value);
            }
            Operation::Dec => {
                let value = self.fetched.wrapping_sub(1);
                self.update_zero_and_negative_flags(value);
                self.memory.write(self.absolute_address, value);
            }
            Operation::Inx => {
                self.x = self.x.wrapping_add(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Operation::Iny => {
                self.y = self.y.wrapping_add(1);
                self.update_zero_and_negative_flags(self.y);
            }
            Operation::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Operation::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.y);
            }

            // Transfers
            Operation::Tax => {
                self.x = self.a;
                self.update_zero_and_negative_flags(self.x);
            }
            Operation::Tay => {
                self.y = self.a;
                self.update_zero_and_negative_flags(self.y);
            }
            Operation::Txa => {
                self.a = self.x;
                self.update_zero_and_negative_flags(self.a);
            }
            Operation::Tya => {
                self.a = self.y;
                self.update_zero_and_negative_flags(self.a);
            }
            Operation::Tsx => {
                self.x = self.sp;
                self.update_zero_and_negative_flags(self.x);
            }
            Operation::Txs => self.sp = self.x,

            // Stack
            Operation::Pha => self.push_u8(self.a),
            Operation::Php => self.push_u8(self.status.to_stack()),
            Operation::Pla => {
                self.a = self.pull_u8();
                self.update_zero_and_negative_flags(self.a);
            }
            Operation::Plp => {
                let value = self.pull_u8();
                self.status = Status::from_stack(value);
            }

            // Jumps and subroutines
            Operation::Jmp => self.pc = self.absolute_address,
            Operation::Jsr => self.jsr(),
            Operation::Rts => self.pc = self.pull_u16().wrapping_add(1),
            Operation::Brk => self.brk(),
            Operation::Rti => self.rti(),

            // Branches
            Operation::Bcc => self.branch_if(!self.get_flag(Flag::Carry)),
            Operation::Bcs => self.branch_if(self.get_flag(Flag::Carry)),
            Operation::Beq => self.branch_if(self.get_flag(Flag::Zero)),
            Operation::Bne => self.branch_if(!self.get_flag(Flag::Zero)),
            Operation::Bmi => self.branch_if(self.get_flag(Flag::Negative)),
            Operation::Bpl => self.branch_if(!self.get_flag(Flag::Negative)),
            Operation::Bvc => self.branch_if(!self.get_flag(Flag::Overflow)),
            Operation::Bvs => self.branch_if(self.get_flag(Flag::Overflow)),

            // Flag manipulation
            Operation::Clc => self.set_flag(Flag::Carry, false),
            Operation::Cld => self.set_flag(Flag::Decimal, false),
            Operation::Cli => self.set_flag(Flag::InterruptDisable, false),
            Operation::Clv => self.set_flag(Flag::Overflow, false),
            Operation::Sec => self.set_flag(Flag::Carry, true),
            Operation::Sed => self.set_flag(Flag::Decimal, true),
            Operation::Sei => self.set_flag(Flag::InterruptDisable, true),

            Operation::Nop => {}
        }
    }

    /// Binary-mode ADC. SBC comes through here with the operand inverted,
    /// which makes the borrow fall out of the carry.
    fn add_with_carry(&mut self, value: u8) {
        let carry = if self.get_flag(Flag::Carry) { 1 } else { 0 };
        let result = self.a as u16 + value as u16 + carry;

        let overflow = (!(self.a ^ value) & (self.a ^ result as u8)) & 0x80 != 0;

        self.set_flag(Flag::Carry, result > 0xFF);
        self.set_flag(Flag::Overflow, overflow);

        self.a = result as u8;
        self.update_zero_and_negative_flags(self.a);
    }

    fn compare(&mut self, register: u8) {
        let result = register.wrapping_sub(self.fetched);

        self.set_flag(Flag::Carry, register >= self.fetched);
        self.update_zero_and_negative_flags(result);
    }

    fn bit(&mut self) {
        let value = self.fetched;

        self.set_flag(Flag::Zero, (self.a & value) == 0);
        self.set_flag(Flag::Overflow, (value & 0x40) != 0);
        self.set_flag(Flag::Negative, (value & 0x80) != 0);
    }

    fn asl(&mut self) {
        let value = self.fetched;
        let result = value << 1;

        self.set_flag(Flag::Carry, (value & 0x80) != 0);
        self.write_result(result);
    }

    fn lsr(&mut self) {
        let value = self.fetched;
        let result = value >> 1;

        self.set_flag(Flag::Carry, (value & 0x01) != 0);
        self.write_result(result);
    }

    fn rol(&mut self) {
        let value = self.fetched;
        let carry_in = if self.get_flag(Flag::Carry) { 0x01 } else { 0x00 };
        let result = (value << 1) | carry_in;

        self.set_flag(Flag::Carry, (value & 0x80) != 0);
        self.write_result(result);
    }

    fn ror(&mut self) {
        let value = self.fetched;
        let carry_in = if self.get_flag(Flag::Carry) { 0x80 } else { 0x00 };
        let result = (value >> 1) | carry_in;

        self.set_flag(Flag::Carry, (value & 0x01) != 0);
        self.write_result(result);
    }

    /// Stores a shift/rotate result in A for implied mode, or back to the
    /// effective address otherwise, and sets Z/N from it.
    fn write_result(&mut self, value: u8) {
        self.update_zero_and_negative_flags(value);

        if self.mode == AddressingMode::Implied {
            self.a = value;
        } else {
            self.memory.write(self.absolute_address, value);
        }
    }

    fn branch_if(&mut self, condition: bool) {
        if !condition {
            return;
        }

        let target = self.relative_address;
        self.wait_cycles += 1;
        if page_crossed(target, self.pc) {
            self.wait_cycles += 1;
        }

        self.pc = target;
    }

    fn jsr(&mut self) {
        // Return address is the last byte of the JSR itself
        let return_addr = self.pc.wrapping_sub(1);
        self.push_u16(return_addr);
        self.pc = self.absolute_address;
    }

    fn brk(&mut self) {
        // Skip the padding byte after the opcode
        self.pc = self.pc.wrapping_add(1);

        self.set_flag(Flag::InterruptDisable, true);
        self.push_u16(self.pc);
        self.push_u8(self.status.to_stack());

        self.pc = self.memory.read_u16(BRK_VECTOR);
    }

    fn rti(&mut self) {
        let value = self.pull_u8();
        self.status = Status::from_stack(value);
        self.pc = self.pull_u16();
    }
}
