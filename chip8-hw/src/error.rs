//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::{constants::*, keyboard::InvalidKeyCode};

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chip8Error {
    /// Attempt to load a bytecode program that can't fit in memory.
    ProgramTooLarge { size: usize, max: usize },
    /// Subroutine call nested deeper than the call stack allows.
    StackOverflow,
    /// Return executed with an empty call stack.
    StackUnderflow,
    /// Memory access outside of the addressable space.
    AddressOutOfRange(usize),
    /// Key instruction with a register value that is not a key.
    InvalidKey(u8),
    /// Machine was started without a program.
    NotLoaded,
    /// Operation is not allowed while the machine is running.
    Running,
    /// Machine halted on a fault and needs a program loaded before it runs again.
    Crashed,
    /// The operating system refused to spawn a machine thread.
    Spawn(String),
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProgramTooLarge { size, max } => {
                write!(f, "program too large for VM memory: {size} bytes, maximum is {max}")
            }
            Self::StackOverflow => write!(f, "call stack overflow, max depth is {STACK_SIZE}"),
            Self::StackUnderflow => write!(f, "call stack underflow"),
            Self::AddressOutOfRange(addr) => write!(f, "memory address 0x{addr:04X} out of range"),
            Self::InvalidKey(key) => write!(f, "invalid key 0x{key:02X}"),
            Self::NotLoaded => write!(f, "no program loaded"),
            Self::Running => write!(f, "machine is running"),
            Self::Crashed => write!(f, "machine crashed, load a program to run again"),
            Self::Spawn(msg) => write!(f, "failed to spawn thread: {msg}"),
        }
    }
}

impl std::error::Error for Chip8Error {}

impl From<InvalidKeyCode> for Chip8Error {
    fn from(err: InvalidKeyCode) -> Self {
        Chip8Error::InvalidKey(err.0)
    }
}
