//! vm_hotpath.rs : micro-benchs « hot path » du pipeline Brume
//!
//! Lancer :
//!   cargo bench -p brume-benches --bench vm_hotpath
//!   cargo bench -p brume-benches --bench vm_hotpath -- --save-baseline hot
//!   cargo bench -p brume-benches --bench vm_hotpath -- --baseline hot
//!
//! Trois mesures séparées : compilation seule, exécution d'un chunk déjà
//! compilé, puis `interpret` de bout en bout. Les sorties vont dans `io::sink()`.

use std::{hint::black_box, io};

use brume_benches::{nested_not, sum_chain, MICRO};
use brume_core::Chunk;
use brume_vm::{InterpretResult, Vm};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn compiled(src: &str) -> Chunk {
    let mut chunk = Chunk::new();
    if let Err(e) = brume_compiler::compile(src, &mut chunk) {
        panic!("source de bench invalide: {e}");
    }
    chunk
}

fn cases() -> Vec<(String, String)> {
    let mut out: Vec<_> = MICRO.iter().map(|(n, s)| ((*n).to_owned(), (*s).to_owned())).collect();
    out.push(("sum_chain/256".into(), sum_chain(256)));
    out.push(("nested_not/200".into(), nested_not(200)));
    out
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for (name, src) in cases() {
        group.bench_with_input(BenchmarkId::from_parameter(&name), &src, |b, src| {
            b.iter(|| compiled(black_box(src)));
        });
    }
    group.finish();
}

fn bench_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("run");
    let mut vm = Vm::with_output(io::sink(), io::sink());
    for (name, src) in cases() {
        let chunk = compiled(&src);
        group.bench_with_input(BenchmarkId::from_parameter(&name), &chunk, |b, chunk| {
            b.iter(|| vm.run(black_box(chunk)));
        });
    }
    group.finish();
}

fn bench_interpret(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpret");
    let mut vm = Vm::with_output(io::sink(), io::sink());
    for (name, src) in cases() {
        group.bench_with_input(BenchmarkId::from_parameter(&name), &src, |b, src| {
            b.iter(|| {
                let result = vm.interpret(black_box(src));
                debug_assert_eq!(result, InterpretResult::Ok);
                result
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_run, bench_interpret);
criterion_main!(benches);
