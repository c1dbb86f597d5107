//! Instruction decoding.
use std::fmt::{self, Formatter};

use crate::{bytecode::*, constants::Address};

/// Decoded instruction.
///
/// Operands `vx` and `vy` are register nibbles, so they always index
/// into the 16 general purpose registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Op {
    /// 0nnn (SYS addr)
    ///
    /// Machine code routine on the original hardware. Treated as a jump to `nnn`.
    Sys { address: Address },
    /// 00E0 (CLS)
    ///
    /// Clear the screen.
    ClearScreen,
    /// 00EE (RET)
    ///
    /// Return from the sub-routine.
    Return,
    /// 1nnn (JP addr)
    ///
    /// Jump to the address in `nnn`.
    Jump { address: Address },
    /// 2nnn (CALL addr)
    ///
    /// Call the sub-routine at address `nnn`.
    Call { address: Address },
    /// 3xnn (SE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` equals value `nn`
    Skip_Eq_Byte { vx: u8, nn: u8 },
    /// 4xnn (SNE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` does not equal value `nn`.
    Skip_NotEq_Byte { vx: u8, nn: u8 },
    /// 5xy0 (SE Vx, Vy)
    ///
    /// Skip the next instruction if register `Vx` equals register `Vy`.
    Skip_Eq { vx: u8, vy: u8 },
    /// 6xnn (LD Vx, byte)
    Load_Byte { vx: u8, nn: u8 },
    /// 7xnn (ADD Vx, byte)
    ///
    /// Add byte to the value in register `Vx`, store the result in `Vx`.
    Add_Byte { vx: u8, nn: u8 },

    // ------------------------------------------------------------------------
    // Math
    /// 8xy0 (LD Vx, Vy)
    Load_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy1 (OR Vx, Vy)
    Or_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy2 (AND Vx, Vy)
    And_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy3 (XOR Vx, Vy)
    Xor_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy4 (ADD Vx, Vy)
    Add_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy5 (SUB Vx, Vy)
    Sub_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy6 (SHR Vx, Vy)
    ShiftRight { vx: u8, vy: u8 },
    /// 8xy7 (SUBN Vx, Vy)
    SubReverse_Vx_Vy { vx: u8, vy: u8 },
    /// 8xyE (SHL Vx, Vy)
    ShiftLeft { vx: u8, vy: u8 },

    /// 9xy0 (SNE Vx, Vy)
    Skip_NotEq { vx: u8, vy: u8 },
    /// Annn (LD I, addr)
    ///
    /// Load address into register `I`.
    Load_Address { address: Address },
    /// Bnnn (JP V0, addr)
    ///
    /// Jump to location nnn + V0.
    Jump_V0 { address: Address },
    /// Cxnn (RND Vx, byte)
    Random { vx: u8, nn: u8 },
    /// Dxyn (DRW Vx, Vy, nibble)
    ///
    /// Draw sprite to the display buffer.
    Draw { vx: u8, vy: u8, n: u8 },

    // ------------------------------------------------------------------------
    // Keyboard
    /// Ex9E (SKP Vx)
    Skip_Key { vx: u8 },
    /// ExA1 (SKNP Vx)
    Skip_NotKey { vx: u8 },

    // ------------------------------------------------------------------------
    // Misc
    /// Fx07 (LD Vx, DT)
    Load_Vx_Delay { vx: u8 },
    /// Fx0A (LD Vx, K)
    Load_Vx_Key { vx: u8 },
    /// Fx15 (LD DT, Vx)
    Load_Delay_Vx { vx: u8 },
    /// Fx18 (LD ST, Vx)
    Load_Sound_Vx { vx: u8 },
    /// Fx1E (ADD I, Vx)
    Add_Address_Vx { vx: u8 },
    /// Fx29 (LD F, Vx)
    Load_Font { vx: u8 },
    /// Fx33 (LD B, Vx)
    Load_Bcd { vx: u8 },
    /// Fx55 (LD [I], Vx)
    Store_Registers { vx: u8 },
    /// Fx65 (LD Vx, [I])
    Load_Registers { vx: u8 },

    /// Opcode that is not part of the instruction set.
    ///
    /// Executed as a no-op.
    Unknown(u16),
}

impl Op {
    /// Decode a 16-bit instruction.
    ///
    /// The upper nibble selects the group, and the 0, 8, E and F groups are
    /// further identified by their lower nibble or byte.
    pub fn decode(instr: u16) -> Self {
        let (vx, vy) = (op_x(instr), op_y(instr));
        let (n, nn, nnn) = (op_n(instr), op_nn(instr), op_nnn(instr));

        match op_code(instr) {
            0x0 => match instr {
                0x00E0 => Op::ClearScreen,
                0x00EE => Op::Return,
                _ => Op::Sys { address: nnn },
            },
            0x1 => Op::Jump { address: nnn },
            0x2 => Op::Call { address: nnn },
            0x3 => Op::Skip_Eq_Byte { vx, nn },
            0x4 => Op::Skip_NotEq_Byte { vx, nn },
            0x5 => Op::Skip_Eq { vx, vy },
            0x6 => Op::Load_Byte { vx, nn },
            0x7 => Op::Add_Byte { vx, nn },
            0x8 => match n {
                0x0 => Op::Load_Vx_Vy { vx, vy },
                0x1 => Op::Or_Vx_Vy { vx, vy },
                0x2 => Op::And_Vx_Vy { vx, vy },
                0x3 => Op::Xor_Vx_Vy { vx, vy },
                0x4 => Op::Add_Vx_Vy { vx, vy },
                0x5 => Op::Sub_Vx_Vy { vx, vy },
                0x6 => Op::ShiftRight { vx, vy },
                0x7 => Op::SubReverse_Vx_Vy { vx, vy },
                0xE => Op::ShiftLeft { vx, vy },
                _ => Op::Unknown(instr),
            },
            0x9 => Op::Skip_NotEq { vx, vy },
            0xA => Op::Load_Address { address: nnn },
            0xB => Op::Jump_V0 { address: nnn },
            0xC => Op::Random { vx, nn },
            0xD => Op::Draw { vx, vy, n },
            0xE => match nn {
                0x9E => Op::Skip_Key { vx },
                0xA1 => Op::Skip_NotKey { vx },
                _ => Op::Unknown(instr),
            },
            0xF => match nn {
                0x07 => Op::Load_Vx_Delay { vx },
                0x0A => Op::Load_Vx_Key { vx },
                0x15 => Op::Load_Delay_Vx { vx },
                0x18 => Op::Load_Sound_Vx { vx },
                0x1E => Op::Add_Address_Vx { vx },
                0x29 => Op::Load_Font { vx },
                0x33 => Op::Load_Bcd { vx },
                0x55 => Op::Store_Registers { vx },
                0x65 => Op::Load_Registers { vx },
                _ => Op::Unknown(instr),
            },
            _ => unreachable!("opcode group is a 4-bit nibble"),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Op::Sys { address } => write!(f, "SYS 0x{address:03X}"),
            Op::ClearScreen => write!(f, "CLS"),
            Op::Return => write!(f, "RET"),
            Op::Jump { address } => write!(f, "JP 0x{address:03X}"),
            Op::Call { address } => write!(f, "CALL 0x{address:03X}"),
            Op::Skip_Eq_Byte { vx, nn } => write!(f, "SE V{vx:X}, 0x{nn:02X}"),
            Op::Skip_NotEq_Byte { vx, nn } => write!(f, "SNE V{vx:X}, 0x{nn:02X}"),
            Op::Skip_Eq { vx, vy } => write!(f, "SE V{vx:X}, V{vy:X}"),
            Op::Load_Byte { vx, nn } => write!(f, "LD V{vx:X}, 0x{nn:02X}"),
            Op::Add_Byte { vx, nn } => write!(f, "ADD V{vx:X}, 0x{nn:02X}"),
            // ------
            Op::Load_Vx_Vy { vx, vy } => write!(f, "LD V{vx:X}, V{vy:X}"),
            Op::Or_Vx_Vy { vx, vy } => write!(f, "OR V{vx:X}, V{vy:X}"),
            Op::And_Vx_Vy { vx, vy } => write!(f, "AND V{vx:X}, V{vy:X}"),
            Op::Xor_Vx_Vy { vx, vy } => write!(f, "XOR V{vx:X}, V{vy:X}"),
            Op::Add_Vx_Vy { vx, vy } => write!(f, "ADD V{vx:X}, V{vy:X}"),
            Op::Sub_Vx_Vy { vx, vy } => write!(f, "SUB V{vx:X}, V{vy:X}"),
            Op::ShiftRight { vx, vy } => write!(f, "SHR V{vx:X}, V{vy:X}"),
            Op::SubReverse_Vx_Vy { vx, vy } => write!(f, "SUBN V{vx:X}, V{vy:X}"),
            Op::ShiftLeft { vx, vy } => write!(f, "SHL V{vx:X}, V{vy:X}"),
            // ------
            Op::Skip_NotEq { vx, vy } => write!(f, "SNE V{vx:X}, V{vy:X}"),
            Op::Load_Address { address } => write!(f, "LD I, 0x{address:03X}"),
            Op::Jump_V0 { address } => write!(f, "JP V0, 0x{address:03X}"),
            Op::Random { vx, nn } => write!(f, "RND V{vx:X}, 0x{nn:02X}"),
            Op::Draw { vx, vy, n } => write!(f, "DRW V{vx:X}, V{vy:X}, {n}"),
            // ------
            Op::Skip_Key { vx } => write!(f, "SKP V{vx:X}"),
            Op::Skip_NotKey { vx } => write!(f, "SKNP V{vx:X}"),
            // ------
            Op::Load_Vx_Delay { vx } => write!(f, "LD V{vx:X}, DT"),
            Op::Load_Vx_Key { vx } => write!(f, "LD V{vx:X}, K"),
            Op::Load_Delay_Vx { vx } => write!(f, "LD DT, V{vx:X}"),
            Op::Load_Sound_Vx { vx } => write!(f, "LD ST, V{vx:X}"),
            Op::Add_Address_Vx { vx } => write!(f, "ADD I, V{vx:X}"),
            Op::Load_Font { vx } => write!(f, "LD F, V{vx:X}"),
            Op::Load_Bcd { vx } => write!(f, "LD B, V{vx:X}"),
            Op::Store_Registers { vx } => write!(f, "LD [I], V{vx:X}"),
            Op::Load_Registers { vx } => write!(f, "LD V{vx:X}, [I]"),
            Op::Unknown(instr) => write!(f, "0x{instr:04X}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[rustfmt::skip]
    fn test_decode_all() {
        let cases = [
            (0x0123, Op::Sys { address: 0x123 }),
            (0x00E0, Op::ClearScreen),
            (0x00EE, Op::Return),
            (0x1ABC, Op::Jump { address: 0xABC }),
            (0x2ABC, Op::Call { address: 0xABC }),
            (0x3A42, Op::Skip_Eq_Byte { vx: 0xA, nn: 0x42 }),
            (0x4A42, Op::Skip_NotEq_Byte { vx: 0xA, nn: 0x42 }),
            (0x5AB0, Op::Skip_Eq { vx: 0xA, vy: 0xB }),
            (0x6A42, Op::Load_Byte { vx: 0xA, nn: 0x42 }),
            (0x7A42, Op::Add_Byte { vx: 0xA, nn: 0x42 }),
            (0x8AB0, Op::Load_Vx_Vy { vx: 0xA, vy: 0xB }),
            (0x8AB1, Op::Or_Vx_Vy { vx: 0xA, vy: 0xB }),
            (0x8AB2, Op::And_Vx_Vy { vx: 0xA, vy: 0xB }),
            (0x8AB3, Op::Xor_Vx_Vy { vx: 0xA, vy: 0xB }),
            (0x8AB4, Op::Add_Vx_Vy { vx: 0xA, vy: 0xB }),
            (0x8AB5, Op::Sub_Vx_Vy { vx: 0xA, vy: 0xB }),
            (0x8AB6, Op::ShiftRight { vx: 0xA, vy: 0xB }),
            (0x8AB7, Op::SubReverse_Vx_Vy { vx: 0xA, vy: 0xB }),
            (0x8ABE, Op::ShiftLeft { vx: 0xA, vy: 0xB }),
            (0x9AB0, Op::Skip_NotEq { vx: 0xA, vy: 0xB }),
            (0xA123, Op::Load_Address { address: 0x123 }),
            (0xB123, Op::Jump_V0 { address: 0x123 }),
            (0xCA0F, Op::Random { vx: 0xA, nn: 0x0F }),
            (0xDAB5, Op::Draw { vx: 0xA, vy: 0xB, n: 5 }),
            (0xEA9E, Op::Skip_Key { vx: 0xA }),
            (0xEAA1, Op::Skip_NotKey { vx: 0xA }),
            (0xFA07, Op::Load_Vx_Delay { vx: 0xA }),
            (0xFA0A, Op::Load_Vx_Key { vx: 0xA }),
            (0xFA15, Op::Load_Delay_Vx { vx: 0xA }),
            (0xFA18, Op::Load_Sound_Vx { vx: 0xA }),
            (0xFA1E, Op::Add_Address_Vx { vx: 0xA }),
            (0xFA29, Op::Load_Font { vx: 0xA }),
            (0xFA33, Op::Load_Bcd { vx: 0xA }),
            (0xFA55, Op::Store_Registers { vx: 0xA }),
            (0xFA65, Op::Load_Registers { vx: 0xA }),
        ];

        // The full instruction set.
        assert_eq!(cases.len(), 35);

        for (instr, op) in cases {
            assert_eq!(Op::decode(instr), op, "decoding 0x{instr:04X}");
        }
    }

    #[test]
    fn test_decode_unknown() {
        for instr in [0x8AB8, 0x8ABF, 0xEA00, 0xEA9F, 0xFA00, 0xFAFF] {
            assert_eq!(Op::decode(instr), Op::Unknown(instr));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Op::decode(0x6A2B).to_string(), "LD VA, 0x2B");
        assert_eq!(Op::decode(0xD015).to_string(), "DRW V0, V1, 5");
        assert_eq!(Op::decode(0xF355).to_string(), "LD [I], V3");
        assert_eq!(Op::decode(0x2208).to_string(), "CALL 0x208");
        assert_eq!(Op::decode(0xFAFF).to_string(), "0xFAFF");
    }
}
