#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};

use bion::prelude::*;

const N_FLAT: usize = 2000;

fn flat_graph() -> (Graph, NodeId) {
    let mut g = Graph::new();
    let items: Vec<NodeId> = (0..N_FLAT).map(|i| g.put(i as i64)).collect();
    let root = g.seq(items);
    (g, root)
}

const N_SEQ: usize = 10;
const N_REC: usize = 10;

fn nested_graph() -> (Graph, NodeId) {
    let mut g = Graph::new();

    let leaves: Vec<NodeId> = (0..N_SEQ).map(|i| g.put(i as i64)).collect();
    let inner = g.seq(leaves);

    // every record shares the same inner sequence, so the encoder emits
    // one copy and N_REC * N_SEQ - 1 references
    let recs: Vec<NodeId> = (0..N_REC)
        .map(|_| {
            let props = (0..N_SEQ)
                .map(|i| Prop::new(format!("k{}", i), inner))
                .collect();
            g.rec(props)
        })
        .collect();
    let root = g.seq(recs);
    (g, root)
}

fn bench_construction(c: &mut Criterion) {
    let (g, root) = nested_graph();
    c.bench_function(
        &format!(
            "Building a graph encoding to {} bytes",
            encode_full(&g, root).unwrap().len()
        ),
        |b| b.iter(|| black_box(nested_graph())),
    );
}

fn bench_enc(c: &mut Criterion) {
    let (g, root) = nested_graph();
    let enc_len = encode_full(&g, root).unwrap().len();
    c.bench_function(
        &format!("Encoding a nested graph, output size of {} bytes", enc_len),
        move |b| b.iter(|| encode_full(black_box(&g), root).unwrap()),
    );
}

fn bench_enc_single_alloc(c: &mut Criterion) {
    let (g, root) = nested_graph();
    let enc_len = encode_full(&g, root).unwrap().len();
    c.bench_function(
        &format!(
            "Encoding a nested graph, output size of {} bytes, buffer preallocated",
            enc_len
        ),
        move |b| {
            b.iter(|| {
                let mut out = Vec::with_capacity(enc_len * 2);
                encode(black_box(&g), root, &mut out).unwrap();
                out
            })
        },
    );
}

fn bench_dec(c: &mut Criterion) {
    let (g, root) = nested_graph();
    let enc = encode_full(&g, root).unwrap();
    c.bench_function(
        &format!("Decoding a nested graph, input size of {} bytes", enc.len()),
        move |b| b.iter(|| decode_full(black_box(&enc)).unwrap()),
    );
}

fn bench_enc_flat(c: &mut Criterion) {
    let (g, root) = flat_graph();
    let enc_len = encode_full(&g, root).unwrap().len();
    c.bench_function(
        &format!("Encoding a flat sequence, output size of {} bytes", enc_len),
        move |b| b.iter(|| encode_full(black_box(&g), root).unwrap()),
    );
}

fn bench_dec_flat(c: &mut Criterion) {
    let (g, root) = flat_graph();
    let enc = encode_full(&g, root).unwrap();
    c.bench_function(
        &format!("Decoding a flat sequence of {} bytes", enc.len()),
        move |b| b.iter(|| decode_full(black_box(&enc)).unwrap()),
    );
}

criterion_group!(
    benches,
    bench_construction,
    bench_enc,
    bench_enc_single_alloc,
    bench_dec,
    bench_enc_flat,
    bench_dec_flat
);
criterion_main!(benches);
