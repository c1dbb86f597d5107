mod bytecode;
mod clock;
pub mod constants;
mod cpu;
mod disasm;
mod display;
mod engine;
mod error;
mod exec;
mod instr;
mod keyboard;
mod memory;
mod registers;
mod stack;
mod vm;

pub use self::{
    clock::Hz,
    display::Display,
    instr::Op,
    keyboard::{InvalidKeyCode, KeyCode, Keyboard},
    memory::Memory,
    registers::{Registers, Timers},
    stack::CallStack,
};

pub mod prelude {
    pub use super::{
        cpu::Chip8Cpu,
        disasm::Disassembler,
        engine::Engine,
        error::{Chip8Error, Chip8Result},
        vm::{Chip8Conf, Chip8Vm, Flow, MachineState},
        Hz, KeyCode,
    };
}
