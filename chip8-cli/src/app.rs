use std::{
    fs,
    path::Path,
    thread,
    time::{Duration, Instant},
};

use chip8_hw::prelude::*;
use log::{debug, info, warn};

use crate::{
    config::{CliConf, ScriptEvent, FRAME_RATE},
    error::AppError,
    inputmap::{InputMap, DUMP, QUIT},
};

/// Chip8 Application
///
/// Headless host for the machine. Each frame applies the scripted key
/// events through the input map, hands the held keys to the VM, and
/// checks on the machine.
pub struct Chip8App {
    vm: Chip8Vm,
    input_map: InputMap,
    script: Vec<ScriptEvent>,
    frames: u64,
}

impl Chip8App {
    pub fn new(conf: CliConf, log: &slog::Logger) -> Self {
        let CliConf {
            vm,
            frames,
            keymap,
            mut script,
            ..
        } = conf;

        // Stable sort keeps same frame events in the order they were written.
        script.sort_by_key(|event| event.frame);

        Self {
            vm: Chip8Vm::new(vm, log),
            input_map: InputMap::new(keymap),
            script,
            frames,
        }
    }

    /// Load ROM file into VM
    pub fn load_rom(&mut self, filepath: impl AsRef<Path>) -> Result<(), AppError> {
        info!("load rom: {}", filepath.as_ref().display());
        let bytecode = fs::read(filepath)?;
        self.load_bytecode(&bytecode)
    }

    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Result<(), AppError> {
        self.vm.load_program(bytecode)?;
        Ok(())
    }

    pub fn vm(&self) -> &Chip8Vm {
        &self.vm
    }
}

/// Frame Loop.
impl Chip8App {
    /// Run the machine until the frame budget is spent, the quit action
    /// fires, or the machine halts on its own.
    ///
    /// Returns the state the machine was left in.
    pub fn run(&mut self) -> Result<MachineState, AppError> {
        let frame_time: Duration = FRAME_RATE.into();
        let mut script = self.script.iter().peekable();
        let mut next_frame = Instant::now();

        self.vm.start()?;

        for frame in 0..self.frames {
            // Frame start
            self.input_map.clear_state();

            while let Some(event) = script.next_if(|event| event.frame <= frame) {
                self.input_map.push_key(event.key, event.state);
            }
            for event in self.input_map.drain_events() {
                debug!("frame {frame}: {event:?}");
            }

            // Frame update
            if self.input_map.is_action_pressed(QUIT) {
                info!("quit on frame {frame}");
                break;
            }

            if self.input_map.is_action_pressed(DUMP) {
                info!("display on frame {frame}\n{}", self.vm.dump_display()?);
            }

            // Merge input state into VM
            self.vm.keyboard().set_state(self.input_map.chip8_state());

            if !self.vm.is_running() {
                warn!("machine halted on frame {frame}");
                break;
            }

            next_frame += frame_time;
            if let Some(remaining) = next_frame.checked_duration_since(Instant::now()) {
                thread::sleep(remaining);
            }
        }

        self.vm.stop();

        Ok(self.vm.state())
    }
}
