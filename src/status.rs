// Status register flags
pub const CARRY_FLAG: u8 = 0x01;
pub const ZERO_FLAG: u8 = 0x02;
pub const INTERRUPT_DISABLE: u8 = 0x04;
pub const DECIMAL_MODE: u8 = 0x08;
pub const BREAK_COMMAND: u8 = 0x10;
pub const UNUSED_FLAG: u8 = 0x20;
pub const OVERFLOW_FLAG: u8 = 0x40;
pub const NEGATIVE_FLAG: u8 = 0x80;

/// One named bit of the processor status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Flag {
    Carry = CARRY_FLAG,
    Zero = ZERO_FLAG,
    InterruptDisable = INTERRUPT_DISABLE,
    Decimal = DECIMAL_MODE,
    Break = BREAK_COMMAND,
    Unused = UNUSED_FLAG,
    Overflow = OVERFLOW_FLAG,
    Negative = NEGATIVE_FLAG,
}

impl Flag {
    pub const ALL: [Flag; 8] = [
        Flag::Carry,
        Flag::Zero,
        Flag::InterruptDisable,
        Flag::Decimal,
        Flag::Break,
        Flag::Unused,
        Flag::Overflow,
        Flag::Negative,
    ];

    pub fn mask(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Flag::Carry => "carry",
            Flag::Zero => "zero",
            Flag::InterruptDisable => "interrupt_disable",
            Flag::Decimal => "decimal_mode",
            Flag::Break => "break_command",
            Flag::Unused => "unused",
            Flag::Overflow => "overflow",
            Flag::Negative => "negative",
        }
    }
}

/// The 8-bit status register. Bit 5 is kept set at all times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(u8);

impl Status {
    pub fn new() -> Self {
        Status(UNUSED_FLAG)
    }

    /// Builds a status register from a byte taken off the stack. Break has no
    /// storage in the register itself, so it is dropped.
    pub fn from_stack(value: u8) -> Self {
        Status((value | UNUSED_FLAG) & !BREAK_COMMAND)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// The byte PHP and BRK push: Break and Unused both set.
    pub fn to_stack(self) -> u8 {
        self.0 | BREAK_COMMAND | UNUSED_FLAG
    }

    #[inline]
    pub fn set(&mut self, flag: Flag, value: bool) {
        if value {
            self.0 |= flag.mask();
        } else {
            self.0 &= !flag.mask();
        }
    }

    #[inline]
    pub fn is_set(self, flag: Flag) -> bool {
        (self.0 & flag.mask()) != 0
    }

    /// Loads a saved register byte. Same masking as `from_stack`.
    pub(crate) fn set_bits(&mut self, value: u8) {
        *self = Self::from_stack(value);
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}
