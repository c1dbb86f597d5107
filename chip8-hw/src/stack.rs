//! Subroutine call stack.
use crate::{
    constants::*,
    error::{Chip8Error, Chip8Result},
};

/// Stack of return pointers used for jumping when a routine call finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack {
    entries: [Address; STACK_SIZE],
    /// Stack pointer, the number of addresses on the stack.
    sp: usize,
}

impl Default for CallStack {
    fn default() -> Self {
        Self {
            entries: [0; STACK_SIZE],
            sp: 0,
        }
    }
}

impl CallStack {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, addr: Address) -> Chip8Result<()> {
        let slot = self.entries.get_mut(self.sp).ok_or(Chip8Error::StackOverflow)?;
        *slot = addr;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Chip8Result<Address> {
        self.sp = self.sp.checked_sub(1).ok_or(Chip8Error::StackUnderflow)?;
        Ok(self.entries[self.sp])
    }

    /// Current nesting level.
    #[inline]
    pub fn depth(&self) -> usize {
        self.sp
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_push_pop_order() {
        let mut stack = CallStack::new();
        stack.push(0x202).unwrap();
        stack.push(0x304).unwrap();
        assert_eq!(stack.depth(), 2);

        assert_eq!(stack.pop(), Ok(0x304));
        assert_eq!(stack.pop(), Ok(0x202));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_overflow() {
        let mut stack = CallStack::new();
        for i in 0..STACK_SIZE {
            stack.push(i as Address).unwrap();
        }
        assert_eq!(stack.push(0xFFF), Err(Chip8Error::StackOverflow));
        assert_eq!(stack.depth(), STACK_SIZE);
        assert_eq!(stack.pop(), Ok(STACK_SIZE as Address - 1));
    }

    #[test]
    fn test_underflow() {
        let mut stack = CallStack::new();
        assert_eq!(stack.pop(), Err(Chip8Error::StackUnderflow));
        assert_eq!(stack.depth(), 0);
    }
}
