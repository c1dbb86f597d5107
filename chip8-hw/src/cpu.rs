//! CPU and memory state.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockWriteGuard};

use rand::{rngs::StdRng, SeedableRng};
use slog::{o, Logger};

use crate::{
    constants::*,
    display::Display,
    error::Chip8Result,
    instr::Op,
    keyboard::Keyboard,
    memory::Memory,
    registers::{Registers, Timers},
    stack::CallStack,
    vm::Flow,
};

/// Core state for a chip8 interpreter.
///
/// Owns the registers, call stack and memory. The display, keyboard and
/// timers are shared with the host and the timer thread.
pub struct Chip8Cpu {
    pub(crate) registers: Registers,
    pub(crate) stack: CallStack,
    pub(crate) memory: Memory,
    pub(crate) display: Arc<RwLock<Display>>,
    pub(crate) keyboard: Arc<Keyboard>,
    pub(crate) timers: Arc<Mutex<Timers>>,
    pub(crate) rng: StdRng,
    /// Address of the instruction currently being executed.
    pub(crate) instr_pc: Address,
    pub(crate) log: Logger,
}

impl Chip8Cpu {
    pub fn new(
        display: Arc<RwLock<Display>>,
        keyboard: Arc<Keyboard>,
        timers: Arc<Mutex<Timers>>,
        seed: Option<u64>,
        log: &Logger,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            registers: Registers {
                pc: MEM_START as Address,
                ..Default::default()
            },
            stack: CallStack::new(),
            memory: Memory::new(),
            display,
            keyboard,
            timers,
            rng,
            instr_pc: MEM_START as Address,
            log: log.new(o!("component" => "cpu")),
        }
    }

    /// Load a program into memory and point the program counter at it.
    ///
    /// Registers and the call stack are cleared for a fresh start. Memory
    /// outside of the program is kept, so bytes poked in beforehand survive.
    pub fn load(&mut self, program: &[u8]) -> Chip8Result<()> {
        self.memory.load(program)?;
        self.registers = Registers {
            pc: MEM_START as Address,
            ..Default::default()
        };
        self.stack = CallStack::new();
        self.instr_pc = self.registers.pc;
        Ok(())
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Address of the last fetched instruction.
    pub fn instr_pc(&self) -> Address {
        self.instr_pc
    }

    /// Run a single fetch, decode and execute cycle.
    pub fn step(&mut self) -> Chip8Result<Flow> {
        let instr = self.fetch()?;
        let op = Op::decode(instr);

        op_trace(self, instr, op);

        self.exec(op)
    }

    /// Read the instruction at the program counter and advance past it.
    #[inline]
    fn fetch(&mut self) -> Chip8Result<u16> {
        let pc = self.registers.pc;
        self.instr_pc = pc;
        let instr = self.memory.read_word(pc as usize)?;
        self.registers.pc = pc.wrapping_add(INSTR_SIZE);
        Ok(instr)
    }

    #[inline]
    pub(crate) fn lock_timers(&self) -> MutexGuard<'_, Timers> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub(crate) fn write_display(&self) -> RwLockWriteGuard<'_, Display> {
        self.display.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(feature = "op_trace")]
#[inline]
fn op_trace(cpu: &Chip8Cpu, instr: u16, op: Op) {
    slog::trace!(cpu.log, "{:04X}: {:04X} {}", cpu.instr_pc, instr, op);
}

#[cfg(not(feature = "op_trace"))]
#[inline]
fn op_trace(_: &Chip8Cpu, _: u16, _: Op) {}
