//! Virtual machine.
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard},
};

use slog::{info, o, Logger};

use crate::{
    clock::Hz,
    constants::*,
    cpu::Chip8Cpu,
    display::Display,
    engine::Engine,
    error::{Chip8Error, Chip8Result},
    keyboard::Keyboard,
    registers::{Registers, Timers},
};

/// Machine facade.
///
/// Owns the execution engine and hands out the shared display and
/// keyboard to the host. The machine is driven either by the engine's
/// threads ([`Chip8Vm::start`]) or synchronously ([`Chip8Vm::step`]).
pub struct Chip8Vm {
    engine: Engine,
    display: Arc<RwLock<Display>>,
    keyboard: Arc<Keyboard>,
    timers: Arc<Mutex<Timers>>,
    loaded: bool,
    conf: Chip8Conf,
    log: Logger,
}

impl Chip8Vm {
    pub fn new(conf: Chip8Conf, log: &Logger) -> Self {
        let log = log.new(o!("component" => "vm"));
        let display = Arc::new(RwLock::new(Display::new()));
        let keyboard = Arc::new(Keyboard::new());
        let timers = Arc::new(Mutex::new(Timers::default()));

        let cpu = Chip8Cpu::new(
            display.clone(),
            keyboard.clone(),
            timers.clone(),
            conf.seed,
            &log,
        );
        let engine = Engine::new(cpu, timers.clone(), conf.clock_frequency, &log);

        Chip8Vm {
            engine,
            display,
            keyboard,
            timers,
            loaded: false,
            conf,
            log,
        }
    }

    /// Configuration that was used to instantiate the VM.
    pub fn config(&self) -> &Chip8Conf {
        &self.conf
    }

    /// Copy a program into memory and reset the program counter.
    ///
    /// The display and timers are cleared and a previous crash is
    /// forgotten. A failed load leaves the machine unable to start until
    /// a program is loaded successfully.
    pub fn load_program(&mut self, program: &[u8]) -> Chip8Result<()> {
        self.ensure_stopped()?;
        self.loaded = false;
        self.engine.lock_cpu().load(program)?;
        self.loaded = true;

        self.display
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self.timers.lock().unwrap_or_else(PoisonError::into_inner) = Timers::default();
        self.engine.reset();

        info!(self.log, "program loaded"; "size" => program.len());

        Ok(())
    }

    /// Write a single byte of memory.
    pub fn set_memory(&mut self, addr: Address, value: u8) -> Chip8Result<()> {
        self.ensure_stopped()?;
        self.engine.lock_cpu().memory_mut().write(addr as usize, value)
    }

    pub fn read_memory(&self, addr: Address) -> Chip8Result<u8> {
        self.engine.lock_cpu().memory().read(addr as usize)
    }

    /// Start executing the loaded program on the engine's threads.
    ///
    /// A crashed machine refuses to start until a program is loaded again.
    pub fn start(&mut self) -> Chip8Result<()> {
        self.ensure_runnable()?;
        self.engine.start()
    }

    pub fn stop(&mut self) {
        self.engine.stop()
    }

    /// Block until the instruction loop halts on an execution fault.
    pub fn wait(&mut self) {
        self.engine.wait()
    }

    pub fn state(&self) -> MachineState {
        self.engine.state()
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    /// Read access to the display buffer.
    ///
    /// Holding on to the guard stalls drawing instructions.
    pub fn display(&self) -> RwLockReadGuard<'_, Display> {
        self.display.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn display_handle(&self) -> Arc<RwLock<Display>> {
        self.display.clone()
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn keyboard_handle(&self) -> Arc<Keyboard> {
        self.keyboard.clone()
    }

    /// Snapshot of the delay and sound timers.
    pub fn timers(&self) -> Timers {
        *self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the timers down by one tick, as the timer thread does at 60Hz.
    pub fn tick_timers(&mut self) -> Chip8Result<()> {
        self.ensure_stopped()?;
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tick();
        Ok(())
    }

    /// Snapshot of the register file.
    pub fn registers(&self) -> Registers {
        self.engine.lock_cpu().registers().clone()
    }

    /// Depth of the call stack.
    pub fn stack_depth(&self) -> usize {
        self.engine.lock_cpu().stack().depth()
    }

    /// Execute a single instruction on the calling thread.
    pub fn step(&mut self) -> Chip8Result<Flow> {
        self.run_steps(1)
    }

    /// Execute up to `step_count` instructions on the calling thread.
    ///
    /// Stops early when the program waits for a key, since it can't
    /// make progress until the host presses one. A fault crashes the
    /// machine just as it does on the engine's threads.
    pub fn run_steps(&mut self, step_count: usize) -> Chip8Result<Flow> {
        self.ensure_stopped()?;
        self.ensure_runnable()?;
        self.engine.run_steps(step_count)
    }

    /// Returns the first `count` bytes of program memory as a human readable string.
    pub fn dump_ram(&self, count: usize) -> Result<String, fmt::Error> {
        self.engine.lock_cpu().memory().dump(count)
    }

    /// Returns the display as rows of `#` and `.` characters.
    pub fn dump_display(&self) -> Result<String, fmt::Error> {
        self.display().dump()
    }

    fn ensure_stopped(&self) -> Chip8Result<()> {
        if self.engine.is_running() {
            Err(Chip8Error::Running)
        } else {
            Ok(())
        }
    }

    fn ensure_runnable(&self) -> Chip8Result<()> {
        if !self.loaded {
            return Err(Chip8Error::NotLoaded);
        }
        match self.engine.state() {
            MachineState::Crashed { .. } => Err(Chip8Error::Crashed),
            _ => Ok(()),
        }
    }
}

/// Lifecycle of the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineState {
    /// Never started.
    Idle,
    Running,
    Stopped,
    /// Instruction loop halted on an execution fault.
    Crashed {
        /// Address of the faulting instruction.
        pc: Address,
        error: Chip8Error,
    },
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Crashed { pc, error } => write!(f, "crashed at 0x{pc:04X}: {error}"),
        }
    }
}

/// Control flow signal returned by every executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Ok,
    /// Program counter has jumped to a new address.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 0nnn (`SYS addr`)
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    Draw,
    Sound,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    KeyWait,
}

/// VM Configuration Parameters.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct Chip8Conf {
    /// Instructions executed per second. Zero runs unthrottled.
    pub clock_frequency: Hz,
    /// Seed for the random number instruction. Random when `None`.
    pub seed: Option<u64>,
}
