//! Command-line configuration.

use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_LOAD_SIZE: usize = 0x8000;
pub const DEFAULT_LOAD_OFFSET: u16 = 0x8000;
pub const DEFAULT_CYCLES: u64 = 1000;

pub const USAGE: &str = "\
Usage: step6502 -i <file> [OPTIONS]

Options:
  -i, --image <file>    Raw binary image to execute
  -s, --size <n>        Maximum number of bytes to load [default: 0x8000]
  -o, --offset <n>      Address to load the image at [default: 0x8000]
      --cycles <n>      Clock cycles to run in headless mode [default: 1000]
      --trace           Print registers and disassembly for every instruction
      --serve <port>    Run the HTTP inspection service instead
  -h, --help            Display this message

Numbers may be decimal, 0x-prefixed or $-prefixed hex.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Tick the processor for a fixed number of cycles, then print state.
    Headless { cycles: u64, trace: bool },
    /// Serve the HTTP API on localhost.
    Serve { port: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub image_path: PathBuf,
    pub load_size: usize,
    pub load_offset: u16,
    pub mode: RunMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Run(Config),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingImage,
    MissingValue(String),
    InvalidNumber { flag: String, value: String },
    UnknownArgument(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingImage => write!(f, "No binary file provided."),
            Self::MissingValue(flag) => write!(f, "Missing value for {}", flag),
            Self::InvalidNumber { flag, value } => {
                write!(f, "Invalid number for {}: {}", flag, value)
            }
            Self::UnknownArgument(arg) => write!(f, "Unknown argument: {}", arg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parses a decimal, `0x` hex or `$` hex number.
pub fn parse_number(text: &str) -> Option<u64> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix('$') {
        u64::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

fn number_arg<T: TryFrom<u64>>(flag: &str, value: Option<&String>) -> Result<T, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::MissingValue(flag.to_string()))?;
    parse_number(value)
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| ConfigError::InvalidNumber {
            flag: flag.to_string(),
            value: value.clone(),
        })
}

/// Parses the arguments that follow the program name.
pub fn parse_args(args: &[String]) -> Result<Command, ConfigError> {
    let mut image_path = None;
    let mut load_size = DEFAULT_LOAD_SIZE;
    let mut load_offset = DEFAULT_LOAD_OFFSET;
    let mut cycles = DEFAULT_CYCLES;
    let mut trace = false;
    let mut serve = None;

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "-i" | "--image" => {
                i += 1;
                let path = args
                    .get(i)
                    .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))?;
                image_path = Some(PathBuf::from(path));
            }
            "-s" | "--size" => {
                i += 1;
                load_size = number_arg(flag, args.get(i))?;
            }
            "-o" | "--offset" => {
                i += 1;
                load_offset = number_arg(flag, args.get(i))?;
            }
            "--cycles" => {
                i += 1;
                cycles = number_arg(flag, args.get(i))?;
            }
            "--trace" => {
                trace = true;
            }
            "--serve" => {
                i += 1;
                serve = Some(number_arg(flag, args.get(i))?);
            }
            "-h" | "--help" => return Ok(Command::Help),
            other => return Err(ConfigError::UnknownArgument(other.to_string())),
        }
        i += 1;
    }

    let image_path = image_path.ok_or(ConfigError::MissingImage)?;
    let mode = match serve {
        Some(port) => RunMode::Serve { port },
        None => RunMode::Headless { cycles, trace },
    };

    Ok(Command::Run(Config {
        image_path,
        load_size,
        load_offset,
        mode,
    }))
}
