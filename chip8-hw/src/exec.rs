//! Instruction execution.
use rand::Rng;

use crate::{
    constants::*,
    cpu::Chip8Cpu,
    error::Chip8Result,
    instr::Op,
    keyboard::KeyCode,
    vm::Flow,
};

impl Chip8Cpu {
    /// Execute a decoded instruction.
    ///
    /// The program counter has already been advanced past the instruction.
    pub(crate) fn exec(&mut self, op: Op) -> Chip8Result<Flow> {
        let mut control_flow = Flow::Ok;

        match op {
            // 0NNN (SYS addr)
            //
            // Treated as a jump, since there is no machine code to run.
            Op::Sys { address } => {
                self.registers.pc = address;
                control_flow = Flow::Jump;
            }
            // 00E0 (CLS)
            //
            // Clear display
            Op::ClearScreen => {
                self.write_display().clear();
                control_flow = Flow::Draw;
            }
            // 00EE (RET)
            //
            // Return from a subroutine.
            // Set the program counter to the value at the top of the stack.
            Op::Return => {
                self.registers.pc = self.stack.pop()?;
                control_flow = Flow::Jump;
            }
            // 1NNN (JP addr)
            Op::Jump { address } => {
                self.registers.pc = address;
                control_flow = Flow::Jump;
            }
            // 2NNN (CALL addr)
            //
            // The return address is the instruction after the call.
            Op::Call { address } => {
                self.stack.push(self.registers.pc)?;
                self.registers.pc = address;
                control_flow = Flow::Jump;
            }
            // 3XNN (SE Vx, byte)
            Op::Skip_Eq_Byte { vx, nn } => {
                if self.registers[vx] == nn {
                    self.skip();
                }
            }
            // 4XNN (SNE Vx, byte)
            Op::Skip_NotEq_Byte { vx, nn } => {
                if self.registers[vx] != nn {
                    self.skip();
                }
            }
            // 5XY0 (SE Vx, Vy)
            Op::Skip_Eq { vx, vy } => {
                if self.registers[vx] == self.registers[vy] {
                    self.skip();
                }
            }
            // 6XNN (LD Vx, byte)
            Op::Load_Byte { vx, nn } => {
                self.registers[vx] = nn;
            }
            // 7XNN (ADD Vx, byte)
            //
            // VF is raised when the sum overflows, but never lowered.
            // The flag is written before the sum, so `ADD VF, byte` adds to the flag.
            Op::Add_Byte { vx, nn } => {
                if self.registers[vx] as u16 + nn as u16 > 0xFF {
                    self.registers.set_flag(true);
                }
                self.registers[vx] = self.registers[vx].wrapping_add(nn);
            }
            // Arithmetic instructions identified by n
            Op::Load_Vx_Vy { .. }
            | Op::Or_Vx_Vy { .. }
            | Op::And_Vx_Vy { .. }
            | Op::Xor_Vx_Vy { .. }
            | Op::Add_Vx_Vy { .. }
            | Op::Sub_Vx_Vy { .. }
            | Op::ShiftRight { .. }
            | Op::SubReverse_Vx_Vy { .. }
            | Op::ShiftLeft { .. } => self.exec_math(op),
            // 9XY0 (SNE Vx, Vy)
            Op::Skip_NotEq { vx, vy } => {
                if self.registers[vx] != self.registers[vy] {
                    self.skip();
                }
            }
            // ANNN (LD I, addr)
            Op::Load_Address { address } => {
                self.registers.i = address;
            }
            // BNNN (JP V0, addr)
            //
            // Jump to NNN offset by V0.
            Op::Jump_V0 { address } => {
                self.registers.pc = address.wrapping_add(self.registers[0] as Address);
                control_flow = Flow::Jump;
            }
            // CXNN (RND Vx, byte)
            //
            // Set register VX to the result of bitwise AND between a random number and NN.
            Op::Random { vx, nn } => {
                self.registers[vx] = self.rng.gen::<u8>() & nn;
            }
            // DXYN (DRW Vx, Vy, nibble)
            Op::Draw { vx, vy, n } => {
                self.exec_draw(vx, vy, n)?;
                control_flow = Flow::Draw;
            }
            // EX9E (SKP Vx)
            Op::Skip_Key { vx } => {
                let key = KeyCode::try_from(self.registers[vx])?;
                if self.keyboard.is_pressed(key) {
                    self.skip();
                }
            }
            // EXA1 (SKNP Vx)
            Op::Skip_NotKey { vx } => {
                let key = KeyCode::try_from(self.registers[vx])?;
                if !self.keyboard.is_pressed(key) {
                    self.skip();
                }
            }
            // Miscellaneous instructions identified by nn
            Op::Load_Vx_Delay { .. }
            | Op::Load_Vx_Key { .. }
            | Op::Load_Delay_Vx { .. }
            | Op::Load_Sound_Vx { .. }
            | Op::Add_Address_Vx { .. }
            | Op::Load_Font { .. }
            | Op::Load_Bcd { .. }
            | Op::Store_Registers { .. }
            | Op::Load_Registers { .. } => control_flow = self.exec_misc(op)?,
            // Unsupported operations are ignored.
            Op::Unknown(instr) => {
                slog::debug!(self.log, "ignoring unknown instruction";
                    "instr" => format!("{instr:04X}"), "pc" => format!("{:04X}", self.instr_pc));
            }
        }

        Ok(control_flow)
    }

    /// Skip over the next instruction.
    #[inline(always)]
    fn skip(&mut self) {
        self.registers.pc = self.registers.pc.wrapping_add(INSTR_SIZE);
    }

    /// Execute an arithmetic instruction
    #[inline]
    fn exec_math(&mut self, op: Op) {
        let regs = &mut self.registers;

        match op {
            // 8XY0 (LD Vx, Vy)
            //
            // Store the value of register VY in register VX.
            Op::Load_Vx_Vy { vx, vy } => {
                regs[vx] = regs[vy];
            }
            // 8XY1 (OR Vx, Vy)
            //
            // Performs bitwise OR on VX and VY, and stores the result in VX.
            // VF is reset as a side effect.
            Op::Or_Vx_Vy { vx, vy } => {
                let y = regs[vy];
                regs[vx] |= y;
                regs.set_flag(false);
            }
            // 8XY2 (AND Vx, Vy)
            Op::And_Vx_Vy { vx, vy } => {
                let y = regs[vy];
                regs[vx] &= y;
                regs.set_flag(false);
            }
            // 8XY3 (XOR Vx, Vy)
            Op::Xor_Vx_Vy { vx, vy } => {
                let y = regs[vy];
                regs[vx] ^= y;
                regs.set_flag(false);
            }
            // 8XY4 (ADD Vx, Vy)
            //
            // ADDs VY to VX, and stores the result in VX.
            // Overflow is wrapped. If overflow, set VF to 1, else 0.
            Op::Add_Vx_Vy { vx, vy } => {
                let (result, carry) = regs[vx].overflowing_add(regs[vy]);
                regs[vx] = result;
                regs.set_flag(carry);
            }
            // 8XY5 (SUB Vx, Vy)
            //
            // Subtracts VY from VX, and stores the result in VX.
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            Op::Sub_Vx_Vy { vx, vy } => {
                let no_borrow = regs[vx] >= regs[vy];
                regs[vx] = regs[vx].wrapping_sub(regs[vy]);
                regs.set_flag(no_borrow);
            }
            // 8XY6 (SHR Vx, Vy)
            //
            // Copy VY into VX, then shift VX right by 1.
            // VF is set to the bit that was shifted out.
            Op::ShiftRight { vx, vy } => {
                regs[vx] = regs[vy];
                let lsb = regs[vx] & 1;
                regs[vx] >>= 1;
                regs[FLAG_REGISTER] = lsb;
            }
            // 8XY7 (SUBN Vx, Vy)
            //
            // Subtracts VX from VY, and stores the result in VX.
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            Op::SubReverse_Vx_Vy { vx, vy } => {
                let no_borrow = regs[vy] >= regs[vx];
                regs[vx] = regs[vy].wrapping_sub(regs[vx]);
                regs.set_flag(no_borrow);
            }
            // 8XYE (SHL Vx, Vy)
            //
            // Copy VY into VX, then shift VX left by 1.
            // VF is set to the bit that was shifted out.
            Op::ShiftLeft { vx, vy } => {
                regs[vx] = regs[vy];
                let msb = regs[vx] >> 7;
                regs[vx] <<= 1;
                regs[FLAG_REGISTER] = msb;
            }
            _ => unreachable!("not an arithmetic instruction: {op}"),
        }
    }

    /// Draw a sprite to the display buffer, at coordinate as per registers Vx and Vy.
    ///
    /// Sprite is encoded as 8 pixels wide, N pixels high, stored in bits located in
    /// memory pointed to by address register I.
    ///
    /// When the sprite's origin lies outside of the display area, every pixel
    /// is wrapped around to the other side. When the origin is inside, pixels
    /// that fall off the edge are clipped.
    ///
    /// If the drawing operation erases existing pixels in the display buffer, register VF is set to
    /// 1, and set to 0 if no display bits are unset. This is used for collision detection.
    fn exec_draw(&mut self, vx: u8, vy: u8, n: u8) -> Chip8Result<()> {
        let (x, y) = (
            self.registers[vx] as usize,
            self.registers[vy] as usize,
        );
        let wrap = x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT;
        let sprite = self.memory.slice(self.registers.i as usize, n as usize)?;

        let mut display = self.display.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut is_erased = false;

        for (r, row) in sprite.iter().enumerate() {
            // Each row is 8 bits representing the 8 pixels of the sprite.
            for c in 0..SPRITE_WIDTH {
                if (row >> (7 - c)) & 1 == 0 {
                    continue;
                }

                let (px, py) = if wrap {
                    ((x + c) % DISPLAY_WIDTH, (y + r) % DISPLAY_HEIGHT)
                } else if x + c < DISPLAY_WIDTH && y + r < DISPLAY_HEIGHT {
                    (x + c, y + r)
                } else {
                    continue;
                };

                // XOR erases a pixel when both the old and new values are both 1.
                let old_px = display.get_pixel(px, py);
                is_erased |= old_px;
                display.set_pixel(px, py, !old_px);
            }
        }

        // If a pixel was erased, then a collision occurred.
        self.registers.set_flag(is_erased);

        Ok(())
    }

    /// Execute a miscellaneous instruction
    fn exec_misc(&mut self, op: Op) -> Chip8Result<Flow> {
        let mut control_flow = Flow::Ok;

        match op {
            // FX07 (LD Vx, DT)
            //
            // Set Vx = delay timer value.
            Op::Load_Vx_Delay { vx } => {
                let delay = self.lock_timers().delay;
                self.registers[vx] = delay;
            }
            // FX0A (LD Vx, K)
            //
            // Wait for a key press, store the value of the key in Vx.
            Op::Load_Vx_Key { vx } => {
                if let Some(key) = self.keyboard.any_pressed() {
                    self.registers[vx] = key.as_u8();
                } else {
                    // rewind the program counter to stall the machine
                    self.registers.pc = self.instr_pc;
                    control_flow = Flow::KeyWait;
                }
            }
            // FX15 (LD DT, Vx)
            Op::Load_Delay_Vx { vx } => {
                let x = self.registers[vx];
                self.lock_timers().delay = x;
            }
            // FX18 (LD ST, Vx)
            Op::Load_Sound_Vx { vx } => {
                let x = self.registers[vx];
                self.lock_timers().sound = x;
                control_flow = Flow::Sound;
            }
            // FX1E (ADD I, Vx)
            Op::Add_Address_Vx { vx } => {
                let x = self.registers[vx] as Address;
                self.registers.i = self.registers.i.wrapping_add(x);
            }
            // FX29 (LD F, Vx)
            //
            // Set I = location of sprite for digit Vx.
            Op::Load_Font { vx } => {
                let x = self.registers[vx] as Address;
                self.registers.i = FONTSET_START + x * FONTSET_HEIGHT as Address;
            }
            // FX33 (LD B, Vx)
            //
            // Store the binary-coded decimal representation of Vx
            // in the memory locations I, I+1, and I+2.
            #[rustfmt::skip]
            Op::Load_Bcd { vx } => {
                let addr = self.registers.i as usize;
                let x = self.registers[vx];
                self.memory.write(addr,     x / 100)?;
                self.memory.write(addr + 1, x / 10 % 10)?;
                self.memory.write(addr + 2, x      % 10)?;
            }
            // FX55 (LD [I], Vx)
            //
            // Store registers V0 through Vx in memory starting at location I.
            // I is left pointing past the last stored register.
            Op::Store_Registers { vx } => {
                for v in 0..=vx {
                    let addr = self.registers.i as usize;
                    self.memory.write(addr, self.registers[v])?;
                    self.registers.i = self.registers.i.wrapping_add(1);
                }
            }
            // FX65 (LD Vx, [I])
            //
            // Read registers V0 through Vx from memory starting at location I.
            // I is left pointing past the last loaded register.
            Op::Load_Registers { vx } => {
                for v in 0..=vx {
                    let addr = self.registers.i as usize;
                    self.registers[v] = self.memory.read(addr)?;
                    self.registers.i = self.registers.i.wrapping_add(1);
                }
            }
            _ => unreachable!("not a miscellaneous instruction: {op}"),
        }

        Ok(control_flow)
    }
}
