mod common;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pseudocod::backend::Backend;
use pseudocod::backend::debugger::DebuggerBackend;
use pseudocod::backend::interpreter::Interpreter;

fn bench_interpreter(c: &mut Criterion) {
    for case in common::workloads() {
        let label = &case.name;
        let program = common::load_program(&case);

        c.bench_function(&format!("backend_interpreter_total_{label}"), |b| {
            let interpreter = Interpreter::new().with_input(case.spec.input.clone());
            b.iter(|| {
                let output = interpreter
                    .prepare(black_box(&program))
                    .expect("prepare")
                    .run()
                    .expect("run");
                black_box(output);
            })
        });

        c.bench_function(&format!("backend_debugger_total_{label}"), |b| {
            let debugger = DebuggerBackend::new().with_input(case.spec.input.clone());
            let prepared = debugger.prepare(&program).expect("prepare");
            b.iter(|| {
                let output = black_box(&prepared).run().expect("run");
                black_box(output);
            })
        });
    }
}

criterion_group!(benches, bench_interpreter);
criterion_main!(benches);
