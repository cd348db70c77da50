mod common;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pseudocod::transpiler::{Transpiler, transpile_source};

fn bench_transpiler(c: &mut Criterion) {
    for case in common::workloads() {
        let label = &case.name;
        let source = common::load_source(&case);
        let program = common::load_program(&case);

        c.bench_function(&format!("transpiler_codegen_only_{label}"), |b| {
            let transpiler = Transpiler::new();
            b.iter(|| {
                let cpp = transpiler.transpile(black_box(&program));
                black_box(cpp);
            })
        });

        c.bench_function(&format!("transpiler_total_{label}"), |b| {
            b.iter(|| {
                let cpp = transpile_source(black_box(&source)).expect("transpile");
                black_box(cpp);
            })
        });
    }
}

criterion_group!(benches, bench_transpiler);
criterion_main!(benches);
