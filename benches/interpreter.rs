mod common;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rill::interpreter::Interpreter;
use rill::{lexer, parser};

fn bench_pipeline(c: &mut Criterion) {
    for (label, path) in common::WORKLOADS {
        let source = common::load_source(path);
        let program = common::load_program(path);

        c.bench_function(&format!("tokenize_{label}"), |b| {
            b.iter(|| {
                let tokens = lexer::tokenize(black_box(&source)).expect("tokenize");
                black_box(tokens);
            })
        });

        c.bench_function(&format!("parse_{label}"), |b| {
            let tokens = lexer::tokenize(&source).expect("tokenize");
            b.iter(|| {
                let program = parser::parse_tokens(black_box(tokens.clone())).expect("parse");
                black_box(program);
            })
        });

        c.bench_function(&format!("run_parsed_{label}"), |b| {
            b.iter(|| {
                let mut output = Vec::new();
                Interpreter::new(&mut output)
                    .run(black_box(&program))
                    .expect("run");
                black_box(output);
            })
        });

        c.bench_function(&format!("full_pipeline_{label}"), |b| {
            b.iter(|| {
                let mut output = Vec::new();
                let ok = rill::interpret(black_box(source.as_bytes()), &mut output);
                assert!(ok, "interpret failed");
                black_box(output);
            })
        });
    }
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
