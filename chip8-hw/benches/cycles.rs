use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chip8_hw::prelude::*;
use slog::{o, Logger};

fn criterion_benchmark(c: &mut Criterion) {
    let log = Logger::root(slog::Discard, o!());

    {
        let mut vm = Chip8Vm::new(Chip8Conf::default(), &log);

        c.bench_function("maze bytecode", |b| {
            b.iter(|| {
                vm.load_program(include_bytes!("../programs/maze")).unwrap();
                let step_count = black_box(1000_usize);
                black_box(vm.run_steps(step_count)).unwrap();
            })
        });
    }

    {
        let mut vm = Chip8Vm::new(Chip8Conf::default(), &log);

        #[rustfmt::skip]
        let program = [
            0x60, 0x00, // 200: LD V0, 0
            0x61, 0x07, // 202: LD V1, 7
            0x80, 0x14, // 204: ADD V0, V1
            0x80, 0x16, // 206: SHR V0, V1
            0x81, 0x05, // 208: SUB V1, V0
            0x12, 0x04, // 20A: JP 0x204
        ];

        c.bench_function("arithmetic loop", |b| {
            b.iter(|| {
                vm.load_program(&program).unwrap();
                black_box(vm.run_steps(black_box(1000))).unwrap();
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
