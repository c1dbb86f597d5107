//! Main memory.
use std::fmt::{self, Write as FmtWrite};

use crate::{
    constants::*,
    error::{Chip8Error, Chip8Result},
};

/// Flat byte addressable RAM.
///
/// Addresses at or beyond [`MEM_SIZE`] are rejected with
/// [`Chip8Error::AddressOutOfRange`] instead of wrapping, so a
/// misbehaving program halts the machine where it went wrong.
pub struct Memory {
    ram: Box<[u8; MEM_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        let mut ram = Box::new([0; MEM_SIZE]);
        let start = FONTSET_START as usize;
        ram[start..start + FONTSET_DATA_LENGTH].copy_from_slice(&FONTSET);
        Self { ram }
    }
}

impl Memory {
    /// Creates memory with the built-in font glyphs written at the bottom.
    pub fn new() -> Self {
        Default::default()
    }

    /// Copy a program into memory at [`MEM_START`].
    ///
    /// Memory outside of the program's range is left untouched, and nothing
    /// is written when the program is too large.
    pub fn load(&mut self, program: &[u8]) -> Chip8Result<()> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }

        self.ram[MEM_START..MEM_START + program.len()].copy_from_slice(program);

        Ok(())
    }

    #[inline]
    pub fn read(&self, addr: usize) -> Chip8Result<u8> {
        self.ram
            .get(addr)
            .copied()
            .ok_or(Chip8Error::AddressOutOfRange(addr))
    }

    #[inline]
    pub fn write(&mut self, addr: usize, value: u8) -> Chip8Result<()> {
        let cell = self
            .ram
            .get_mut(addr)
            .ok_or(Chip8Error::AddressOutOfRange(addr))?;
        *cell = value;
        Ok(())
    }

    /// Read a big-endian 16-bit word, as instructions are stored.
    #[inline]
    pub fn read_word(&self, addr: usize) -> Chip8Result<u16> {
        let a = self.read(addr)?;
        let b = self.read(addr + 1)?;
        Ok(u16::from_be_bytes([a, b]))
    }

    /// Borrow `len` bytes starting at `addr`.
    pub fn slice(&self, addr: usize, len: usize) -> Chip8Result<&[u8]> {
        let end = addr + len;
        if end > MEM_SIZE {
            // Report the first address that doesn't exist.
            return Err(Chip8Error::AddressOutOfRange(addr.max(MEM_SIZE)));
        }
        Ok(&self.ram[addr..end])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.ram[..]
    }

    /// Returns the program area of memory as a human readable string.
    pub fn dump(&self, count: usize) -> Result<String, fmt::Error> {
        let iter = self
            .ram
            .iter()
            .enumerate()
            .skip(MEM_START)
            .take(count)
            .step_by(2);
        let mut buf = String::new();

        for (i, op) in iter {
            let next = self.ram.get(i + 1).copied().unwrap_or_default();
            writeln!(buf, "{:04X}: {:02X}{:02X}", i, op, next)?;
        }

        Ok(buf)
    }
}
