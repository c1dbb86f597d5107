mod app;
mod config;
mod error;
mod inputmap;

pub use self::{
    app::Chip8App,
    config::{CliConf, LogLevel, ScriptEvent, FRAME_RATE},
    error::{AppError, ErrorKind},
    inputmap::{InputDef, InputEvent, InputKind, InputMap, KeyState, DUMP, QUIT},
};
