use std::{collections::VecDeque, iter::Iterator};

use chip8_hw::KeyCode;
use serde::Deserialize;
use smol_str::SmolStr;

/// Stop the frame loop.
pub const QUIT: &str = "quit";
/// Log the current display contents.
pub const DUMP: &str = "dump";

/// Input mapper
///
/// Maps host key events to either Chip8 keycodes (suitable to be used in the VM),
/// or application specific named actions.
///
/// - *Chip8 Keycode*: These are the 16 keys of the old COSMAC VIP computer.
///   Stored in 8-bit integers and suitable to be passed to the virtual machine.
/// - *Named Action*: These are application specific input events that are
///   identified by a readable string.
///
/// Host keys are identified by the character printed on them.
#[derive(Debug)]
pub struct InputMap {
    actions: Box<[InputInfo]>,
    /// Mapping of host keyboard keys to application actions, by index.
    keys: Box<[(char, usize)]>,
    /// Buffer of collected events, as they happen.
    events: VecDeque<InputEvent>,
    /// Current state of the key. Whether it is pressed down.
    state: Vec<InputState>,
}

#[derive(Debug)]
struct InputInfo {
    chip8: Option<KeyCode>,
    action: Option<SmolStr>,
}

/// Mapping to make optional fields infallible.
impl From<InputDef> for InputInfo {
    fn from(def: InputDef) -> Self {
        Self {
            chip8: def.chip8,
            action: def.action,
        }
    }
}

/// A single entry of the key map, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputDef {
    pub chip8: Option<KeyCode>,
    pub action: Option<SmolStr>,
    pub keyboard_keys: Option<Vec<char>>,
}

impl InputDef {
    fn chip8(key: KeyCode, host: char) -> Self {
        Self {
            chip8: Some(key),
            action: None,
            keyboard_keys: Some(vec![host]),
        }
    }

    fn action(name: &str, host: char) -> Self {
        Self {
            chip8: None,
            action: Some(SmolStr::new(name)),
            keyboard_keys: Some(vec![host]),
        }
    }

    /// The COSMAC VIP keypad laid over the left side of a QWERTY keyboard.
    ///
    /// ```text
    /// 1 2 3 C      1 2 3 4
    /// 4 5 6 D  ->  q w e r
    /// 7 8 9 E      a s d f
    /// A 0 B F      z x c v
    /// ```
    pub fn default_keymap() -> Vec<InputDef> {
        use KeyCode::*;

        #[rustfmt::skip]
        let layout = [
            (Key1, '1'), (Key2, '2'), (Key3, '3'), (KeyC, '4'),
            (Key4, 'q'), (Key5, 'w'), (Key6, 'e'), (KeyD, 'r'),
            (Key7, 'a'), (Key8, 's'), (Key9, 'd'), (KeyE, 'f'),
            (KeyA, 'z'), (Key0, 'x'), (KeyB, 'c'), (KeyF, 'v'),
        ];

        layout
            .into_iter()
            .map(|(key, host)| Self::chip8(key, host))
            .chain([Self::action(QUIT, '\u{1b}'), Self::action(DUMP, '`')])
            .collect()
    }
}

/// Whether a host key went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub state: KeyState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    Action(SmolStr),
    Chip8(u8),
}

impl InputKind {
    pub fn as_chip8(&self) -> Option<KeyCode> {
        match self {
            Self::Chip8(key_id) => KeyCode::try_from(*key_id).ok(),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct InputState {
    event: InputKind,
    pressed: bool,
}

impl Default for InputMap {
    fn default() -> Self {
        Self::new(InputDef::default_keymap())
    }
}

impl InputMap {
    pub fn new(defs: Vec<InputDef>) -> Self {
        log::debug!("loaded input definitions: {:?}", defs);

        let keys = Self::build_keys(&defs);
        let actions = defs.into_iter().map(InputInfo::from).collect();

        InputMap {
            actions,
            keys,
            events: VecDeque::new(),
            state: Vec::new(),
        }
    }

    /// Build a mapping of host keys to indices into the given action definition mapping.
    fn build_keys(defs: &[InputDef]) -> Box<[(char, usize)]> {
        defs.iter()
            // definitions will be mapped by their index
            .enumerate()
            // lift keycodes out of the definitions
            .filter_map(|(index, def)| def.keyboard_keys.as_ref().map(|keys| (index, keys)))
            // flatten borrowed keycodes into one iterator of copied keycodes
            .flat_map(|(index, keys)| keys.iter().copied().map(move |keycode| (keycode, index)))
            .collect::<Vec<(char, usize)>>()
            .into_boxed_slice()
    }

    /// Given a host key, map it to either a Chip8 key, or a named action.
    pub fn map_key(&self, key: char) -> Option<InputKind> {
        self.keys
            .iter()
            .find(|(keycode, _)| *keycode == key)
            .map(|(_, index)| *index)
            .and_then(|index| self.actions.get(index))
            .and_then(|input_def| {
                if let Some(key_code) = input_def.chip8 {
                    Some(InputKind::Chip8(key_code.as_u8()))
                } else {
                    input_def
                        .action
                        .as_ref()
                        .map(|action_name| InputKind::Action(action_name.clone()))
                }
            })
    }

    /// Push key event into the input state.
    pub fn push_key(&mut self, keycode: char, state: KeyState) {
        match self.map_key(keycode) {
            Some(kind) => {
                // Stream of events in order
                self.events.push_back(InputEvent {
                    kind: kind.clone(),
                    state,
                });

                let pressed = state == KeyState::Pressed;

                // Map of state flags that can be checked by code
                match self.state.iter_mut().find(|el| el.event == kind) {
                    Some(existing) => existing.pressed = pressed,
                    None => self.state.push(InputState {
                        event: kind,
                        pressed,
                    }),
                }
            }
            None => {
                log::trace!("no input mapping for {keycode:?}");
            }
        }
    }

    pub fn is_action_pressed(&self, action: impl AsRef<str>) -> bool {
        let query = action.as_ref().trim();
        self.state
            .iter()
            .find(|state| match state.event {
                InputKind::Action(ref name) => name == query,
                _ => false,
            })
            .map(|state| state.pressed)
            .unwrap_or(false)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }

    /// Drop keys that were released, so only held keys carry over to the next frame.
    pub fn clear_state(&mut self) {
        self.state.retain(|state| state.pressed);
    }

    /// Bitmask of the Chip8 keys currently held down, as the VM keyboard expects.
    pub fn chip8_state(&self) -> u16 {
        self.state
            .iter()
            .filter(|state| state.pressed)
            .filter_map(|state| state.event.as_chip8())
            .fold(0, |mask, key| mask | (1 << key.as_u8()))
    }
}
