//! Helpers for extracting data from opcodes.
//!
//! ```text
//! Var  Bits  Mask    Description
//! c    4     0xF000  Opcode group
//! x    4     0x0F00  Register VX
//! y    4     0x00F0  Register VY
//! n    4     0x000F  Nibble operand, or sub-opcode
//! nn   8     0x00FF  Byte operand, or sub-opcode
//! nnn  12    0x0FFF  Memory address
//! ```

/// Assemble an instruction from the big-endian bytes at the cursor.
#[inline(always)]
pub fn instr_at(bytecode: &[u8], cursor: usize) -> u16 {
    let a = bytecode[cursor];
    let b = bytecode.get(cursor + 1).copied().unwrap_or_default();
    u16::from_be_bytes([a, b])
}

/// Extract the opcode group from the upper nibble.
#[inline(always)]
pub fn op_code(instr: u16) -> u8 {
    ((instr & 0xF000) >> 12) as u8
}

/// Extract operand VX.
#[inline(always)]
pub fn op_x(instr: u16) -> u8 {
    ((instr & 0x0F00) >> 8) as u8
}

/// Extract operand VY.
#[inline(always)]
pub fn op_y(instr: u16) -> u8 {
    ((instr & 0x00F0) >> 4) as u8
}

/// Extract operand N.
#[inline(always)]
pub fn op_n(instr: u16) -> u8 {
    (instr & 0x000F) as u8
}

/// Extract operand NN.
#[inline(always)]
pub fn op_nn(instr: u16) -> u8 {
    (instr & 0x00FF) as u8
}

/// Extract operand NNN.
#[inline(always)]
pub fn op_nnn(instr: u16) -> u16 {
    instr & 0x0FFF
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_operands() {
        let instr = 0xD12F;
        assert_eq!(op_code(instr), 0xD);
        assert_eq!(op_x(instr), 0x1);
        assert_eq!(op_y(instr), 0x2);
        assert_eq!(op_n(instr), 0xF);
        assert_eq!(op_nn(instr), 0x2F);
        assert_eq!(op_nnn(instr), 0x12F);
    }

    #[test]
    fn test_instr_at() {
        let bytecode = [0x00, 0xE0, 0xA2];
        assert_eq!(instr_at(&bytecode, 0), 0x00E0);
        // Odd trailing byte is padded.
        assert_eq!(instr_at(&bytecode, 2), 0xA200);
    }
}
