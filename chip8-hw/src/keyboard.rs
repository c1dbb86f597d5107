//! Keyboard input state.
//!
//! The keypad of the COSMAC VIP has 16 keys, laid out as:
//!
//! ```text
//! 1 2 3 C
//! 4 5 6 D
//! 7 8 9 E
//! A 0 B F
//! ```
use std::sync::atomic::{AtomicU16, Ordering};

use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(try_from = "u8"))]
#[repr(u8)]
pub enum KeyCode {
    Key0 = 0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF = 0xF,
}

impl KeyCode {
    pub const ALL: [KeyCode; KEY_COUNT as usize] = [
        Self::Key0,
        Self::Key1,
        Self::Key2,
        Self::Key3,
        Self::Key4,
        Self::Key5,
        Self::Key6,
        Self::Key7,
        Self::Key8,
        Self::Key9,
        Self::KeyA,
        Self::KeyB,
        Self::KeyC,
        Self::KeyD,
        Self::KeyE,
        Self::KeyF,
    ];

    #[inline(always)]
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    #[inline(always)]
    fn mask(&self) -> u16 {
        1 << self.as_u8()
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let key_id = self.as_u8();
        write!(f, "k{key_id:x}")
    }
}

impl From<KeyCode> for u8 {
    fn from(keycode: KeyCode) -> Self {
        keycode.as_u8()
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = InvalidKeyCode;

    fn try_from(key_id: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(key_id as usize)
            .copied()
            .ok_or(InvalidKeyCode(key_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidKeyCode(pub u8);

impl std::error::Error for InvalidKeyCode {}

impl std::fmt::Display for InvalidKeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "keycode must be in range 0 <= keycode < 16, got {}",
            self.0
        )
    }
}

/// Keyboard input state. Pressed is a 1 bit, released is a 0 bit.
///
/// Written by the host's input handling and read by the CPU, possibly
/// from different threads, so all access goes through `&self`.
#[derive(Debug, Default)]
pub struct Keyboard {
    key_state: AtomicU16,
}

impl Keyboard {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn key_down(&self, key: KeyCode) {
        self.key_state.fetch_or(key.mask(), Ordering::AcqRel);
    }

    #[inline]
    pub fn key_up(&self, key: KeyCode) {
        self.key_state.fetch_and(!key.mask(), Ordering::AcqRel);
    }

    pub fn set_key(&self, key: KeyCode, pressed: bool) {
        if pressed {
            self.key_down(key)
        } else {
            self.key_up(key)
        }
    }

    #[inline]
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.state() & key.mask() != 0
    }

    /// Retrieve the lowest key that is pressed down, if any.
    pub fn any_pressed(&self) -> Option<KeyCode> {
        let state = self.state();
        if state == 0 {
            None
        } else {
            // Lowest set bit is the lowest key index.
            KeyCode::try_from(state.trailing_zeros() as u8).ok()
        }
    }

    /// Clear the keyboard input state, setting all keys to up.
    #[inline]
    pub fn clear(&self) {
        self.set_state(0);
    }

    /// Bitmask of all keys, bit `n` is key `n`.
    #[inline]
    pub fn state(&self) -> u16 {
        self.key_state.load(Ordering::Acquire)
    }

    /// Replace the whole keyboard state with a snapshot.
    #[inline]
    pub fn set_state(&self, state: u16) {
        self.key_state.store(state, Ordering::Release);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_state() {
        let keyboard = Keyboard::default();

        keyboard.key_down(KeyCode::Key0);
        assert_eq!(keyboard.state(), 0b00000000_00000001);
        assert!(keyboard.is_pressed(KeyCode::Key0));
        assert!(!keyboard.is_pressed(KeyCode::Key1));
        assert!(!keyboard.is_pressed(KeyCode::Key7));

        keyboard.key_down(KeyCode::Key7);
        assert_eq!(keyboard.state(), 0b00000000_10000001);
        assert!(keyboard.is_pressed(KeyCode::Key0));
        assert!(keyboard.is_pressed(KeyCode::Key7));

        keyboard.key_up(KeyCode::Key0);
        assert_eq!(keyboard.state(), 0b00000000_10000000);
        assert!(!keyboard.is_pressed(KeyCode::Key0));
        assert!(keyboard.is_pressed(KeyCode::Key7));

        keyboard.set_key(KeyCode::KeyF, true);
        assert_eq!(keyboard.state(), 0b10000000_10000000);
        assert!(keyboard.is_pressed(KeyCode::KeyF));

        keyboard.clear();
        assert_eq!(keyboard.state(), 0);
    }

    #[test]
    fn test_any_pressed_lowest() {
        let keyboard = Keyboard::default();
        assert_eq!(keyboard.any_pressed(), None);

        keyboard.key_down(KeyCode::KeyC);
        keyboard.key_down(KeyCode::Key5);
        keyboard.key_down(KeyCode::KeyF);
        assert_eq!(keyboard.any_pressed(), Some(KeyCode::Key5));

        keyboard.key_up(KeyCode::Key5);
        assert_eq!(keyboard.any_pressed(), Some(KeyCode::KeyC));
    }

    #[test]
    fn test_keycode_conversion() {
        assert_eq!(KeyCode::try_from(0xA), Ok(KeyCode::KeyA));
        assert_eq!(KeyCode::try_from(16), Err(InvalidKeyCode(16)));
        assert_eq!(u8::from(KeyCode::KeyE), 0xE);
        assert_eq!(KeyCode::KeyB.to_string(), "kb");

        for (i, key) in KeyCode::ALL.iter().enumerate() {
            assert_eq!(key.as_u8() as usize, i);
        }
    }
}
