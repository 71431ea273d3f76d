//! # step6502
//!
//! A cycle-stepped MOS 6502 processor core. The processor advances one clock
//! cycle per [`CPU::tick`]: the first tick of an instruction fetches and
//! executes it in full, the remaining ticks count down its latency. Page
//! crossings on indexed reads and taken branches add cycles the way the
//! silicon does.
//!
//! ## Features
//!
//! - All 151 documented opcodes, dispatched through a 256-entry table
//! - Undocumented opcodes run as timed NOPs
//! - Cycle counting with page-crossing and branch penalties
//! - Seven-cycle reset sequence through the vector at `$FFFC`
//! - Disassembler sharing the dispatch table
//! - Raw image loader and a headless command-line runner
//! - HTTP inspection service with Prometheus metrics and snapshots
//!
//! ## Example
//!
//! ```rust
//! use step6502::cpu::{CPU, RESET_VECTOR};
//!
//! let mut cpu = CPU::new();
//!
//! // LDA #$42
//! cpu.load(0x8000, &[0xA9, 0x42]);
//! cpu.load(RESET_VECTOR, &[0x00, 0x80]);
//!
//! cpu.reset();
//! let cycles = cpu.step(); // Execute LDA
//!
//! assert_eq!(cycles, 2);
//! assert_eq!(cpu.get_register_a(), 0x42);
//! ```

#![recursion_limit = "2048"]

pub mod addressing;
pub mod config;
pub mod cpu;
pub mod disassembler;
pub mod instructions;
pub mod loader;
pub mod memory;
pub mod metrics;
pub mod opcodes;
pub mod server;
pub mod snapshots;
pub mod status;

pub use addressing::AddressingMode;
pub use cpu::CPU;
pub use instructions::Operation;
pub use memory::Memory;
pub use opcodes::{lookup, OpcodeInfo, OPCODE_TABLE};
pub use status::{Flag, Status};
