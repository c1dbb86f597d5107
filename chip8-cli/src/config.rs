//! Application configuration, read from YAML.
use std::{fs::File, path::Path};

use chip8_hw::prelude::*;
use serde::Deserialize;

use crate::{
    error::AppError,
    inputmap::{InputDef, KeyState},
};

/// Frames per second of the host loop.
pub const FRAME_RATE: Hz = Hz(60);

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConf {
    pub vm: Chip8Conf,
    /// Number of host frames to run before stopping the machine.
    pub frames: u64,
    pub log_level: LogLevel,
    /// Host key bindings. Replaces the default COSMAC layout when given.
    pub keymap: Vec<InputDef>,
    /// Key events to play back, in place of a real keyboard.
    pub script: Vec<ScriptEvent>,
}

impl Default for CliConf {
    fn default() -> Self {
        Self {
            vm: Chip8Conf::default(),
            frames: 10 * FRAME_RATE.0,
            log_level: LogLevel::Info,
            keymap: InputDef::default_keymap(),
            script: Vec::new(),
        }
    }
}

impl CliConf {
    pub fn from_file(filepath: impl AsRef<Path>) -> Result<Self, AppError> {
        let mut file = File::open(filepath)?;
        let conf: CliConf = serde_yaml::from_reader(&mut file)?;
        Ok(conf)
    }

    pub fn from_yaml(source: &str) -> Result<Self, AppError> {
        Ok(serde_yaml::from_str(source)?)
    }
}

/// A host key going down or up at the start of a frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptEvent {
    pub frame: u64,
    pub key: char,
    #[serde(default = "ScriptEvent::default_state")]
    pub state: KeyState,
}

impl ScriptEvent {
    fn default_state() -> KeyState {
        KeyState::Pressed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

impl From<LogLevel> for slog::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => slog::Level::Error,
            LogLevel::Warn => slog::Level::Warning,
            LogLevel::Info => slog::Level::Info,
            LogLevel::Debug => slog::Level::Debug,
            LogLevel::Trace => slog::Level::Trace,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let conf = CliConf::from_yaml("{}").unwrap();
        assert_eq!(conf.vm.clock_frequency, Hz(500));
        assert_eq!(conf.vm.seed, None);
        assert_eq!(conf.frames, 600);
        assert_eq!(conf.log_level, LogLevel::Info);
        assert_eq!(conf.keymap, InputDef::default_keymap());
        assert!(conf.script.is_empty());
    }

    #[test]
    fn test_parse() {
        let conf = CliConf::from_yaml(
            r#"
            vm:
              clock_frequency: 1000
              seed: 42
            frames: 30
            log_level: debug
            script:
              - { frame: 2, key: w }
              - { frame: 5, key: w, state: released }
              - { frame: 9, key: "\e" }
            "#,
        )
        .unwrap();

        assert_eq!(conf.vm.clock_frequency, Hz(1000));
        assert_eq!(conf.vm.seed, Some(42));
        assert_eq!(conf.frames, 30);
        assert_eq!(log::Level::from(conf.log_level), log::Level::Debug);
        assert_eq!(
            conf.script,
            [
                ScriptEvent { frame: 2, key: 'w', state: KeyState::Pressed },
                ScriptEvent { frame: 5, key: 'w', state: KeyState::Released },
                ScriptEvent { frame: 9, key: '\u{1b}', state: KeyState::Pressed },
            ]
        );
    }

    #[test]
    fn test_invalid() {
        let err = CliConf::from_yaml("log_level: loud").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));

        // Keys above 0xF are rejected while parsing.
        let err = CliConf::from_yaml("keymap: [{ chip8: 16, keyboard_keys: [j] }]").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }
}
