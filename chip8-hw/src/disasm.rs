//! Disassembler.
use std::fmt::{self, Write as FmtWrite};

use crate::{bytecode::*, constants::*, instr::Op};

/// Prints bytecode as a listing of addresses, raw instructions and mnemonics.
///
/// Addresses are as the program would be laid out in memory, starting
/// at [`MEM_START`]. Data mixed in with code is shown as whatever
/// instruction it happens to decode to.
pub struct Disassembler<'a> {
    bytecode: &'a [u8],
    cursor: usize,
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self {
            bytecode,
            cursor: 0,
        }
    }

    /// Disassemble the whole program into a string, one instruction per line.
    pub fn listing(&mut self) -> Result<String, fmt::Error> {
        let mut s = String::new();
        self.cursor = 0;
        while self.cursor < self.bytecode.len() {
            self.disassemble(&mut s)?;
            self.cursor += INSTR_SIZE as usize;
        }
        self.cursor = 0;

        Ok(s)
    }

    /// Write a single instruction to the given writer.
    pub fn disassemble<W: FmtWrite>(&self, w: &mut W) -> fmt::Result {
        let instr = instr_at(self.bytecode, self.cursor);
        let addr = MEM_START + self.cursor;
        writeln!(w, "{:04X}: {:04X}  {}", addr, instr, Op::decode(instr))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[rustfmt::skip]
    fn test_listing() {
        let bytecode = [
            0x00, 0xE0, // CLS
            0x6A, 0x02, // LD VA, 0x02
            0xD0, 0x15, // DRW V0, V1, 5
            0x12, 0x00, // JP 0x200
            0xFF,
        ];
        let listing = Disassembler::new(&bytecode).listing().unwrap();
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(
            lines,
            [
                "0200: 00E0  CLS",
                "0202: 6A02  LD VA, 0x02",
                "0204: D015  DRW V0, V1, 5",
                "0206: 1200  JP 0x200",
                "0208: FF00  0xFF00",
            ]
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(Disassembler::new(&[]).listing(), Ok(String::new()));
    }
}
