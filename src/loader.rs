//! Reads a raw binary image from disk and places it in processor memory.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::cpu::CPU;
use crate::memory::MEMORY_SIZE;

#[derive(Debug)]
pub enum LoadError {
    Open { path: PathBuf, source: io::Error },
    Read { path: PathBuf, source: io::Error },
    OutOfRange { offset: u16, size: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open image {}: {}", path.display(), source)
            }
            Self::Read { path, source } => {
                write!(f, "cannot read image {}: {}", path.display(), source)
            }
            Self::OutOfRange { offset, size } => write!(
                f,
                "load window ${:04X} + ${:X} bytes runs past the end of memory",
                offset, size
            ),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Read { source, .. } => Some(source),
            Self::OutOfRange { .. } => None,
        }
    }
}

/// A raw image and where it belongs in the address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub offset: u16,
    pub bytes: Vec<u8>,
}

impl Image {
    /// Wraps in-memory bytes, keeping at most `max_len` of them.
    pub fn from_bytes(offset: u16, bytes: &[u8], max_len: usize) -> Result<Self, LoadError> {
        check_window(offset, max_len)?;
        let len = bytes.len().min(max_len);
        Ok(Self {
            offset,
            bytes: bytes[..len].to_vec(),
        })
    }

    /// Reads up to `config.load_size` bytes from the configured file. A file
    /// shorter than that is loaded as-is.
    pub fn read(config: &Config) -> Result<Self, LoadError> {
        Self::read_file(&config.image_path, config.load_offset, config.load_size)
    }

    pub fn read_file(path: &Path, offset: u16, max_len: usize) -> Result<Self, LoadError> {
        check_window(offset, max_len)?;

        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut bytes = Vec::with_capacity(max_len);
        file.take(max_len as u64)
            .read_to_end(&mut bytes)
            .map_err(|source| LoadError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self { offset, bytes })
    }

    /// Copies the image into the processor's memory. Returns bytes written.
    pub fn load_into(&self, cpu: &mut CPU) -> usize {
        cpu.load(self.offset, &self.bytes)
    }
}

fn check_window(offset: u16, size: usize) -> Result<(), LoadError> {
    if offset as usize + size > MEMORY_SIZE {
        return Err(LoadError::OutOfRange { offset, size });
    }
    Ok(())
}
