use std::fmt;

/// Size of the flat address space.
pub const MEMORY_SIZE: usize = 0x10000;

#[derive(Clone)]
pub struct Memory {
    data: [u8; MEMORY_SIZE], // 64KB memory space
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            data: [0; MEMORY_SIZE],
        }
    }

    pub fn read(&self, address: u16) -> u8 {
        self.data[address as usize]
    }

    pub fn write(&mut self, address: u16, value: u8) {
        self.data[address as usize] = value;
    }

    /// Copies `data` into memory starting at `start_address`.
    ///
    /// Bytes that would land past 0xFFFF are dropped. Returns the number of
    /// bytes actually written.
    pub fn load(&mut self, start_address: u16, data: &[u8]) -> usize {
        let start = start_address as usize;
        let end = (start + data.len()).min(MEMORY_SIZE);
        let len = end - start;
        self.data[start..end].copy_from_slice(&data[..len]);
        len
    }

    // Read a 16-bit value in little-endian format
    pub fn read_u16(&self, address: u16) -> u16 {
        let low = self.read(address) as u16;
        let high = self.read(address.wrapping_add(1)) as u16;
        (high << 8) | low
    }

    /// Copies `length` bytes starting at `address`, wrapping past 0xFFFF.
    pub fn read_range(&self, address: u16, length: usize) -> Vec<u8> {
        (0..length)
            .map(|i| self.read(address.wrapping_add(i as u16)))
            .collect()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("size", &self.data.len())
            .finish()
    }
}
