use crate::addressing::AddressingMode;
use crate::memory::Memory;
use crate::metrics::{record_cycles, record_instruction, Timer};
use crate::opcodes::OPCODE_TABLE;
use crate::status::{Flag, Status};

/// First byte of the hardware stack page.
pub const STACK_BASE: u16 = 0x0100;
/// Where reset reads the start address from.
pub const RESET_VECTOR: u16 = 0xFFFC;
/// Where BRK reads the handler address from.
pub const BRK_VECTOR: u16 = 0xFFFE;
/// Length of the reset sequence in cycles.
pub const RESET_CYCLES: u8 = 7;

/// The whole processor: registers, the 64KB address space it owns, and the
/// per-instruction micro-state used while an opcode is being executed.
#[derive(Debug, Clone)]
pub struct CPU {
    // Registers
    pub(crate) a: u8,      // Accumulator
    pub(crate) x: u8,      // X Index Register
    pub(crate) y: u8,      // Y Index Register
    pub(crate) pc: u16,    // Program Counter
    pub(crate) sp: u8,     // Stack Pointer
    pub(crate) status: Status,

    pub(crate) memory: Memory,

    // Instruction micro-state, rebuilt on every fetch
    pub(crate) opcode: u8,
    pub(crate) mode: AddressingMode,
    pub(crate) fetched: u8,
    pub(crate) absolute_address: u16,
    pub(crate) relative_address: u16,

    // Only field that survives between ticks of one instruction
    pub(crate) wait_cycles: u8,

    // Bookkeeping for inspectors, not processor state
    pub(crate) cycles: u64,
    pub(crate) instructions: u64,
}

impl CPU {
    pub fn new() -> Self {
        CPU {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0,
            status: Status::new(),
            memory: Memory::new(),
            opcode: 0,
            mode: AddressingMode::Implied,
            fetched: 0,
            absolute_address: 0,
            relative_address: 0,
            wait_cycles: 0,
            cycles: 0,
            instructions: 0,
        }
    }

    /// Copies an image into memory at `offset`. This is the only way for a
    /// caller to change memory besides running instructions.
    pub fn load(&mut self, offset: u16, data: &[u8]) -> usize {
        self.memory.load(offset, data)
    }

    /// Power-on reset: PC from the reset vector, I and the unused bit set,
    /// D cleared. Everything else is left as it was.
    pub fn reset(&mut self) {
        self.pc = self.memory.read_u16(RESET_VECTOR);

        self.status.set(Flag::InterruptDisable, true);
        self.status.set(Flag::Unused, true);
        self.status.set(Flag::Decimal, false);

        // This call is the first of the seven reset cycles
        self.wait_cycles = RESET_CYCLES - 1;
        record_cycles((RESET_CYCLES - 1) as u64);
    }

    /// Advances the processor by one clock cycle.
    ///
    /// While the current instruction still has cycles outstanding this only
    /// counts one of them down. Otherwise the next opcode is fetched and
    /// executed in full, and its remaining latency (base cycles plus any
    /// page-crossing or branch penalties, minus this cycle) is loaded into
    /// the wait counter.
    pub fn tick(&mut self) {
        self.cycles += 1;

        if self.wait_cycles != 0 {
            self.wait_cycles -= 1;
            return;
        }

        self.execute_next();
    }

    /// Runs exactly one instruction to completion, skipping any cycles still
    /// owed by the previous one. Returns the cycle cost of the instruction.
    pub fn step(&mut self) -> u8 {
        self.skip_wait_cycles();
        self.tick();

        let cost = self.wait_cycles + 1;
        self.skip_wait_cycles();
        cost
    }

    fn skip_wait_cycles(&mut self) {
        self.cycles += self.wait_cycles as u64;
        self.wait_cycles = 0;
    }

    fn execute_next(&mut self) {
        let timer = Timer::new();

        self.opcode = self.fetch_byte();
        let entry = &OPCODE_TABLE[self.opcode as usize];

        self.resolve(entry.mode);
        self.execute(entry.operation);

        // Penalties were added to the counter while resolving and executing
        self.wait_cycles += entry.cycles - 1;
        self.instructions += 1;

        // The whole cost is charged here so waiting ticks stay metric-free
        record_cycles(self.wait_cycles as u64 + 1);
        record_instruction(self.opcode, entry.operation.mnemonic(), timer.elapsed());
    }

    pub(crate) fn fetch_byte(&mut self) -> u8 {
        let value = self.memory.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    pub(crate) fn fetch_word(&mut self) -> u16 {
        let value = self.memory.read_u16(self.pc);
        self.pc = self.pc.wrapping_add(2);
        value
    }

    // Stack operations

    pub fn push_u8(&mut self, value: u8) {
        self.memory.write(STACK_BASE + self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    /// Pushes high byte then low byte, so the low byte sits at the lower
    /// address and `pull_u16` reads it back first.
    pub fn push_u16(&mut self, value: u16) {
        self.push_u8((value >> 8) as u8);
        self.push_u8((value & 0xFF) as u8);
    }

    pub fn pull_u8(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.memory.read(STACK_BASE + self.sp as u16)
    }

    pub fn pull_u16(&mut self) -> u16 {
        let low = self.pull_u8() as u16;
        let high = self.pull_u8() as u16;
        (high << 8) | low
    }

    // Getters
    pub fn get_register_a(&self) -> u8 { self.a }
    pub fn get_register_x(&self) -> u8 { self.x }
    pub fn get_register_y(&self) -> u8 { self.y }
    pub fn get_pc(&self) -> u16 { self.pc }
    pub fn get_sp(&self) -> u8 { self.sp }
    pub fn get_status(&self) -> u8 { self.status.bits() }
    pub fn status(&self) -> Status { self.status }

    /// Opcode byte of the instruction most recently fetched.
    pub fn opcode(&self) -> u8 { self.opcode }

    /// Cycles the current instruction still owes before the next fetch.
    pub fn wait_cycles(&self) -> u8 { self.wait_cycles }

    /// Clock cycles elapsed since the processor was created.
    pub fn cycles(&self) -> u64 { self.cycles }

    /// Instructions fetched since the processor was created.
    pub fn instructions(&self) -> u64 { self.instructions }

    pub fn memory(&self) -> &Memory { &self.memory }

    pub fn read_range(&self, address: u16, length: usize) -> Vec<u8> {
        self.memory.read_range(address, length)
    }

    // Flag operations
    pub fn get_flag(&self, flag: Flag) -> bool {
        self.status.is_set(flag)
    }

    pub(crate) fn set_flag(&mut self, flag: Flag, value: bool) {
        self.status.set(flag, value);
    }

    pub(crate) fn update_zero_and_negative_flags(&mut self, value: u8) {
        self.set_flag(Flag::Zero, value == 0);
        self.set_flag(Flag::Negative, (value & 0x80) != 0);
    }
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_with_program(origin: u16, program: &[u8]) -> CPU {
        let mut cpu = CPU::new();
        cpu.load(origin, program);
        cpu.load(RESET_VECTOR, &[(origin & 0xFF) as u8, (origin >> 8) as u8]);
        cpu.reset();
        cpu
    }

    #[test]
    fn test_reset_loads_vector_and_forces_flags() {
        let mut cpu = CPU::new();
        cpu.load(RESET_VECTOR, &[0x34, 0x12]);
        cpu.status.set(Flag::Decimal, true);
        cpu.status.set(Flag::Carry, true);
        cpu.pc = 0xBEEF;

        cpu.reset();

        assert_eq!(cpu.get_pc(), 0x1234);
        assert!(cpu.get_flag(Flag::InterruptDisable));
        assert!(cpu.get_flag(Flag::Unused));
        assert!(!cpu.get_flag(Flag::Decimal));
        assert!(cpu.get_flag(Flag::Carry));
        assert_eq!(cpu.wait_cycles(), 6);
    }

    #[test]
    fn test_reset_leaves_registers_alone() {
        let mut cpu = CPU::new();
        cpu.a = 0x11;
        cpu.x = 0x22;
        cpu.y = 0x33;
        cpu.sp = 0x44;

        cpu.reset();

        assert_eq!(cpu.get_register_a(), 0x11);
        assert_eq!(cpu.get_register_x(), 0x22);
        assert_eq!(cpu.get_register_y(), 0x33);
        assert_eq!(cpu.get_sp(), 0x44);
    }

    #[test]
    fn test_first_fetch_happens_on_seventh_tick_after_reset() {
        let mut cpu = cpu_with_program(0x8000, &[0xEA]); // NOP

        for _ in 0..6 {
            cpu.tick();
            assert_eq!(cpu.get_pc(), 0x8000);
        }

        cpu.tick();
        assert_eq!(cpu.get_pc(), 0x8001);
        assert_eq!(cpu.instructions(), 1);
    }

    #[test]
    fn test_waiting_tick_touches_nothing() {
        let mut cpu = cpu_with_program(0x8000, &[0xA9, 0x42]); // LDA #$42
        cpu.step();
        let before = (cpu.get_register_a(), cpu.get_pc(), cpu.get_status());

        cpu.wait_cycles = 3;
        cpu.tick();

        assert_eq!(cpu.wait_cycles(), 2);
        assert_eq!((cpu.get_register_a(), cpu.get_pc(), cpu.get_status()), before);
    }

    #[test]
    fn test_clc_fetch_tick_leaves_one_wait_cycle() {
        let mut cpu = cpu_with_program(0x8000, &[0x18]); // CLC
        cpu.status.set(Flag::Carry, true);
        cpu.wait_cycles = 0;

        cpu.tick();

        assert!(!cpu.get_flag(Flag::Carry));
        assert_eq!(cpu.wait_cycles(), 1);
        assert_eq!(cpu.opcode(), 0x18);
    }

    #[test]
    fn test_step_discards_pending_cycles() {
        let mut cpu = cpu_with_program(0x8000, &[0x18, 0xEA]); // CLC, NOP

        assert_eq!(cpu.wait_cycles(), 6);
        let cost = cpu.step();

        assert_eq!(cost, 2);
        assert_eq!(cpu.wait_cycles(), 0);
        assert_eq!(cpu.get_pc(), 0x8001);
        assert_eq!(cpu.cycles(), 8);
    }

    #[test]
    fn test_tick_counts_match_instruction_length() {
        // LDA $1234 takes four cycles: one fetch tick, three waiting ticks
        let mut cpu = cpu_with_program(0x8000, &[0xAD, 0x34, 0x12, 0xEA]);
        cpu.wait_cycles = 0;

        cpu.tick();
        assert_eq!(cpu.get_pc(), 0x8003);
        for _ in 0..3 {
            cpu.tick();
            assert_eq!(cpu.get_pc(), 0x8003);
        }
        cpu.tick();
        assert_eq!(cpu.get_pc(), 0x8004);
    }

    #[test]
    fn test_push_pull_word_round_trip() {
        let mut cpu = CPU::new();
        cpu.sp = 0xFD;

        cpu.push_u16(0xBEEF);
        assert_eq!(cpu.get_sp(), 0xFB);
        assert_eq!(cpu.memory().read(0x01FD), 0xBE);
        assert_eq!(cpu.memory().read(0x01FC), 0xEF);

        assert_eq!(cpu.pull_u16(), 0xBEEF);
        assert_eq!(cpu.get_sp(), 0xFD);
    }

    #[test]
    fn test_stack_pointer_wraps_on_push() {
        let mut cpu = CPU::new();
        cpu.sp = 0x00;

        cpu.push_u8(0x42);

        assert_eq!(cpu.get_sp(), 0xFF);
        assert_eq!(cpu.memory().read(0x0100), 0x42);
        assert_eq!(cpu.pull_u8(), 0x42);
        assert_eq!(cpu.get_sp(), 0x00);
    }

    #[test]
    fn test_stack_pointer_wraps_on_pull() {
        let mut cpu = CPU::new();
        cpu.sp = 0xFF;
        cpu.memory.write(0x0100, 0x99);

        assert_eq!(cpu.pull_u8(), 0x99);
        assert_eq!(cpu.get_sp(), 0x00);
    }

    #[test]
    fn test_instances_are_independent() {
        let mut first = cpu_with_program(0x8000, &[0xA9, 0x01]);
        let second = cpu_with_program(0x8000, &[0xA9, 0x02]);

        first.step();

        assert_eq!(first.get_register_a(), 0x01);
        assert_eq!(second.get_register_a(), 0x00);
        assert_eq!(second.get_pc(), 0x8000);
    }
}
