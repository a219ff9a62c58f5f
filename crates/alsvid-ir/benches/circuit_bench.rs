//! Benchmarks for circuit construction and slicing.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use alsvid_ir::Circuit;

fn build_layered(n_qubits: u32, layers: u32) -> Circuit {
    let mut circ = Circuit::with_size(n_qubits, 0);
    for l in 0..layers {
        for q in 0..n_qubits {
            circ.h(q).unwrap();
        }
        for q in 0..n_qubits - 1 {
            if (q + l) % 2 == 0 {
                circ.cx(q, q + 1).unwrap();
            }
        }
    }
    circ
}

fn bench_construction(c: &mut Criterion) {
    c.bench_function("build_20q_50l", |b| {
        b.iter(|| black_box(build_layered(20, 50)));
    });
}

fn bench_slicing(c: &mut Criterion) {
    let circ = build_layered(20, 50);
    c.bench_function("depth_20q_50l", |b| {
        b.iter(|| black_box(circ.depth().unwrap()));
    });
    c.bench_function("commands_20q_50l", |b| {
        b.iter(|| black_box(circ.commands().unwrap().len()));
    });
}

criterion_group!(benches, bench_construction, bench_slicing);
criterion_main!(benches);
