//! Threaded execution engine.
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
};

use slog::{debug, error, info, o, Logger};

use crate::{
    clock::{Clock, Hz},
    constants::*,
    cpu::Chip8Cpu,
    error::{Chip8Error, Chip8Result},
    registers::Timers,
    vm::{Flow, MachineState},
};

/// State shared between the engine handle and its threads.
struct Shared {
    running: AtomicBool,
    state: Mutex<MachineState>,
}

impl Shared {
    fn set_state(&self, state: MachineState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn state(&self) -> MachineState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Drives a [`Chip8Cpu`] on its own thread, with a second thread
/// counting down the delay and sound timers.
pub struct Engine {
    cpu: Arc<Mutex<Chip8Cpu>>,
    timers: Arc<Mutex<Timers>>,
    shared: Arc<Shared>,
    clock_frequency: Hz,
    cpu_thread: Option<JoinHandle<()>>,
    timer_thread: Option<JoinHandle<()>>,
    log: Logger,
}

impl Engine {
    pub fn new(cpu: Chip8Cpu, timers: Arc<Mutex<Timers>>, clock_frequency: Hz, log: &Logger) -> Self {
        Self {
            cpu: Arc::new(Mutex::new(cpu)),
            timers,
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                state: Mutex::new(MachineState::Idle),
            }),
            clock_frequency,
            cpu_thread: None,
            timer_thread: None,
            log: log.new(o!("component" => "engine")),
        }
    }

    /// Exclusive access to the CPU.
    ///
    /// Blocks for at most one instruction while the engine is running.
    pub fn lock_cpu(&self) -> MutexGuard<'_, Chip8Cpu> {
        self.cpu.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> MachineState {
        self.shared.state()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Return a stopped engine to [`MachineState::Idle`], clearing any crash.
    pub fn reset(&mut self) {
        self.stop();
        self.shared.set_state(MachineState::Idle);
        debug!(self.log, "engine reset");
    }

    /// Spawn the instruction and timer threads.
    ///
    /// Starting an engine that is already running does nothing.
    pub fn start(&mut self) -> Chip8Result<()> {
        if self.is_running() {
            return Ok(());
        }

        // Threads from a previous run may have exited on their own after a fault.
        self.join();

        self.shared.running.store(true, Ordering::Release);
        self.shared.set_state(MachineState::Running);

        if let Err(err) = self.spawn() {
            self.shared.running.store(false, Ordering::Release);
            self.join();
            self.shared.set_state(MachineState::Stopped);
            return Err(err);
        }

        info!(self.log, "engine started"; "clock_hz" => self.clock_frequency.0);

        Ok(())
    }

    fn spawn(&mut self) -> Chip8Result<()> {
        let cpu = self.cpu.clone();
        let shared = self.shared.clone();
        let period = self.clock_frequency;
        let log = self.log.clone();
        let handle = thread::Builder::new()
            .name("chip8-cpu".to_string())
            .spawn(move || run_cpu(cpu, shared, period, log))
            .map_err(|err| Chip8Error::Spawn(err.to_string()))?;
        self.cpu_thread = Some(handle);

        let timers = self.timers.clone();
        let shared = self.shared.clone();
        let handle = thread::Builder::new()
            .name("chip8-timer".to_string())
            .spawn(move || run_timers(timers, shared))
            .map_err(|err| Chip8Error::Spawn(err.to_string()))?;
        self.timer_thread = Some(handle);

        Ok(())
    }

    /// Execute up to `step_count` instructions on the calling thread,
    /// stopping early when the program waits for a key.
    ///
    /// A fault is recorded as a crash, as on the instruction thread.
    pub fn run_steps(&self, step_count: usize) -> Chip8Result<Flow> {
        let mut cpu = self.lock_cpu();
        let mut flow = Flow::Ok;
        for _ in 0..step_count {
            flow = match cpu.step() {
                Ok(flow) => flow,
                Err(err) => {
                    record_fault(&self.shared, cpu.instr_pc(), err.clone(), &self.log);
                    return Err(err);
                }
            };
            if flow == Flow::KeyWait {
                break;
            }
        }

        Ok(flow)
    }

    /// Signal both threads to exit, and wait for them.
    ///
    /// A crashed machine keeps its crash state.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        self.join();

        if self.state() == MachineState::Running {
            self.shared.set_state(MachineState::Stopped);
            debug!(self.log, "engine stopped");
        }
    }

    /// Block until the instruction loop halts on an execution fault.
    ///
    /// A program that never faults keeps this blocked forever.
    pub fn wait(&mut self) {
        if let Some(handle) = self.cpu_thread.take() {
            if handle.join().is_err() {
                error!(self.log, "instruction thread panicked");
            }
        }
        self.stop();
    }

    fn join(&mut self) {
        for handle in [self.cpu_thread.take(), self.timer_thread.take()]
            .into_iter()
            .flatten()
        {
            if handle.join().is_err() {
                error!(self.log, "engine thread panicked");
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_cpu(cpu: Arc<Mutex<Chip8Cpu>>, shared: Arc<Shared>, frequency: Hz, log: Logger) {
    let mut clock = Clock::new(frequency);

    while shared.running.load(Ordering::Acquire) {
        clock.wait();

        let mut cpu = cpu.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = cpu.step() {
            record_fault(&shared, cpu.instr_pc(), err, &log);
        }
    }
}

fn record_fault(shared: &Shared, pc: Address, err: Chip8Error, log: &Logger) {
    error!(log, "execution fault"; "pc" => format!("{pc:04X}"), "error" => %err);
    shared.set_state(MachineState::Crashed { pc, error: err });
    shared.running.store(false, Ordering::Release);
}

fn run_timers(timers: Arc<Mutex<Timers>>, shared: Arc<Shared>) {
    let mut clock = Clock::new(Hz(DELAY_FREQUENCY));

    while shared.running.load(Ordering::Acquire) {
        clock.wait();
        timers.lock().unwrap_or_else(PoisonError::into_inner).tick();
    }
}
