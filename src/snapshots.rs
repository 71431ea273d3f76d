use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::cpu::CPU;
use crate::memory::MEMORY_SIZE;

/// Frozen copy of a processor, taken between ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    pub cpu_state: CpuSnapshot,
    /// Run-length encoded 64KB memory image
    pub memory_dump: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub status: u8,
    pub opcode: u8,
    pub wait_cycles: u8,
    pub cycles: u64,
    pub instructions: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub pc: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    TruncatedRun(usize),
    WrongSize(usize),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedRun(offset) => {
                write!(f, "truncated RLE sequence at byte {}", offset)
            }
            Self::WrongSize(size) => {
                write!(f, "decompressed size {} != {}", size, MEMORY_SIZE)
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

pub type SnapshotStore = Arc<Mutex<HashMap<String, Snapshot>>>;

impl CpuSnapshot {
    pub fn capture(cpu: &CPU) -> Self {
        Self {
            a: cpu.get_register_a(),
            x: cpu.get_register_x(),
            y: cpu.get_register_y(),
            pc: cpu.get_pc(),
            sp: cpu.get_sp(),
            status: cpu.get_status(),
            opcode: cpu.opcode(),
            wait_cycles: cpu.wait_cycles(),
            cycles: cpu.cycles(),
            instructions: cpu.instructions(),
        }
    }
}

impl Snapshot {
    pub fn capture(name: String, cpu: &CPU) -> Self {
        let memory_dump = compress_memory(cpu.memory().as_slice());

        Self {
            id: Uuid::new_v4().to_string(),
            name,
            cpu_state: CpuSnapshot::capture(cpu),
            size_bytes: memory_dump.len() as u64,
            memory_dump,
            created_at: Utc::now(),
        }
    }

    /// Puts the processor back into the captured state. The memory dump is
    /// validated before anything is touched.
    pub fn restore_into(&self, cpu: &mut CPU) -> Result<(), SnapshotError> {
        let memory = decompress_memory(&self.memory_dump)?;

        let state = &self.cpu_state;
        cpu.a = state.a;
        cpu.x = state.x;
        cpu.y = state.y;
        cpu.pc = state.pc;
        cpu.sp = state.sp;
        cpu.status.set_bits(state.status);
        cpu.opcode = state.opcode;
        cpu.wait_cycles = state.wait_cycles;
        cpu.cycles = state.cycles;
        cpu.instructions = state.instructions;
        cpu.memory.load(0x0000, &memory);

        Ok(())
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            size_bytes: self.size_bytes,
            pc: self.cpu_state.pc,
        }
    }
}

const RLE_MARKER: u8 = 0xFF;

// Simple run-length encoding for memory compression
fn compress_memory(memory: &[u8]) -> Vec<u8> {
    let mut compressed = Vec::new();
    let mut i = 0;

    while i < memory.len() {
        let current_byte = memory[i];
        let mut count = 1;

        // Count consecutive identical bytes (max 255)
        while i + count < memory.len() && memory[i + count] == current_byte && count < 255 {
            count += 1;
        }

        if count > 3 || current_byte == 0 {
            compressed.push(RLE_MARKER);
            compressed.push(count as u8);
            compressed.push(current_byte);
        } else {
            for _ in 0..count {
                if current_byte == RLE_MARKER {
                    // Escape literal 0xFF
                    compressed.push(RLE_MARKER);
                    compressed.push(0x00);
                } else {
                    compressed.push(current_byte);
                }
            }
        }

        i += count;
    }

    compressed
}

fn decompress_memory(compressed: &[u8]) -> Result<Vec<u8>, SnapshotError> {
    let mut decompressed = Vec::with_capacity(MEMORY_SIZE);
    let mut i = 0;

    while i < compressed.len() {
        if compressed[i] != RLE_MARKER {
            decompressed.push(compressed[i]);
            i += 1;
            continue;
        }

        match compressed.get(i + 1) {
            None => return Err(SnapshotError::TruncatedRun(i)),
            Some(0x00) => {
                decompressed.push(RLE_MARKER);
                i += 2;
            }
            Some(&count) => {
                let value = *compressed
                    .get(i + 2)
                    .ok_or(SnapshotError::TruncatedRun(i))?;
                decompressed.extend(std::iter::repeat(value).take(count as usize));
                i += 3;
            }
        }
    }

    if decompressed.len() != MEMORY_SIZE {
        return Err(SnapshotError::WrongSize(decompressed.len()));
    }

    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::RESET_VECTOR;

    #[test]
    fn test_memory_compression() {
        let mut memory = vec![0u8; MEMORY_SIZE];

        memory[0x1000] = 0xFF;
        memory[0x1001] = 0xFF;
        memory[0x1002] = 0xFF;
        memory[0x1003] = 0xFF;

        memory[0x2000] = 0xAA;
        memory[0x2001] = 0xBB;
        memory[0x2002] = 0xCC;

        let compressed = compress_memory(&memory);
        let decompressed = decompress_memory(&compressed).unwrap();

        assert_eq!(memory, decompressed);
        assert!(compressed.len() < memory.len());
    }

    #[test]
    fn test_rle_escape() {
        let mut memory = vec![0x00; MEMORY_SIZE];
        memory[0] = 0xFF;
        memory[1] = 0xFF;
        memory[2] = 0xAA;
        memory[3] = 0xFF;
        memory[4] = 0x00;

        let compressed = compress_memory(&memory);
        let decompressed = decompress_memory(&compressed).unwrap();

        assert_eq!(memory, decompressed);
    }

    #[test]
    fn test_truncated_dump_is_rejected() {
        assert_eq!(decompress_memory(&[0x01, 0xFF]), Err(SnapshotError::TruncatedRun(1)));
        assert_eq!(decompress_memory(&[0xFF, 0x10]), Err(SnapshotError::TruncatedRun(0)));
        assert_eq!(decompress_memory(&[0x01, 0x02]), Err(SnapshotError::WrongSize(2)));
    }

    #[test]
    fn test_capture_and_restore() {
        let mut cpu = CPU::new();
        cpu.load(0x8000, &[0xA9, 0x42, 0x85, 0x10, 0xE8]); // LDA #$42, STA $10, INX
        cpu.load(RESET_VECTOR, &[0x00, 0x80]);
        cpu.reset();
        cpu.step();
        cpu.step();

        let snapshot = Snapshot::capture("after store".to_string(), &cpu);

        cpu.step();
        assert_eq!(cpu.get_register_x(), 1);

        snapshot.restore_into(&mut cpu).unwrap();
        assert_eq!(cpu.get_register_a(), 0x42);
        assert_eq!(cpu.get_register_x(), 0);
        assert_eq!(cpu.get_pc(), 0x8004);
        assert_eq!(cpu.memory().read(0x10), 0x42);
        assert_eq!(CpuSnapshot::capture(&cpu), snapshot.cpu_state);
    }

    #[test]
    fn test_restore_drops_break_bit() {
        let mut cpu = CPU::new();
        let mut snapshot = Snapshot::capture("stored with B".to_string(), &cpu);
        snapshot.cpu_state.status = 0xFF;

        snapshot.restore_into(&mut cpu).unwrap();

        assert_eq!(cpu.get_status(), 0xEF);
        assert!(!cpu.get_flag(crate::status::Flag::Break));
    }

    #[test]
    fn test_bad_restore_leaves_cpu_untouched() {
        let mut cpu = CPU::new();
        cpu.load(RESET_VECTOR, &[0x00, 0x80]);
        cpu.reset();

        let mut snapshot = Snapshot::capture("broken".to_string(), &cpu);
        snapshot.cpu_state.pc = 0x1234;
        snapshot.memory_dump.truncate(3);

        assert!(snapshot.restore_into(&mut cpu).is_err());
        assert_eq!(cpu.get_pc(), 0x8000);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let cpu = CPU::new();
        let snapshot = Snapshot::capture("json".to_string(), &cpu);

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.cpu_state, snapshot.cpu_state);
        assert_eq!(parsed.memory_dump, snapshot.memory_dump);
    }
}
