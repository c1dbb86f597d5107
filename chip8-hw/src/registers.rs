//! Register file.
use std::ops::{Index, IndexMut};

use crate::constants::*;

/// CPU registers.
///
/// The stack pointer lives with the [`CallStack`](crate::stack::CallStack), and the
/// two timer registers live in [`Timers`] so they can be shared with the timer thread.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registers {
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub v: [u8; REGISTER_COUNT],
    /// (I) Pointer register used for temporarily storing an address.
    pub i: Address,
    /// Program counter pointing to the next instruction to fetch.
    pub pc: Address,
}

impl Registers {
    /// Value of register VF.
    #[inline(always)]
    pub fn flag(&self) -> u8 {
        self.v[FLAG_REGISTER as usize]
    }

    #[inline(always)]
    pub fn set_flag(&mut self, value: bool) {
        self.v[FLAG_REGISTER as usize] = value as u8;
    }
}

/// Index by register nibble, `registers[vx]`.
impl Index<u8> for Registers {
    type Output = u8;

    #[inline(always)]
    fn index(&self, vx: u8) -> &Self::Output {
        &self.v[vx as usize]
    }
}

impl IndexMut<u8> for Registers {
    #[inline(always)]
    fn index_mut(&mut self, vx: u8) -> &mut Self::Output {
        &mut self.v[vx as usize]
    }
}

/// Delay and sound timer registers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timers {
    /// (DT) Delay timer that counts down to 0.
    pub delay: u8,
    /// (ST) Sound timer that counts down to 0. When it has a non-zero value, a beep is played.
    pub sound: u8,
}

impl Timers {
    /// Count down both timers, stopping at zero.
    #[inline]
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// Whether the buzzer should be on.
    #[inline]
    pub fn is_buzzing(&self) -> bool {
        self.sound > 0
    }
}
