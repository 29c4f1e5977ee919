//! Benchmarks for session export and parsing.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use codedeck::editor::{CreateTabOptions, TabManager};
use codedeck::session::parse_session;

fn session_with(buffers: usize, lines: usize) -> TabManager {
    let mut manager = TabManager::new();
    let body: String = (0..lines)
        .map(|i| format!("p{i} >> pluck([{i}, {}], dur=1/4)\n", i + 2))
        .collect();
    for i in 0..buffers {
        manager.create_tab(CreateTabOptions::titled(format!("part_{i}.py")).with_content(body.clone()));
    }
    manager
}

fn bench_export(c: &mut Criterion) {
    let manager = session_with(20, 200);
    c.bench_function("export_session", |b| {
        b.iter(|| black_box(&manager).export_session_content());
    });
}

fn bench_parse(c: &mut Criterion) {
    let text = session_with(20, 200).export_session_content();
    c.bench_function("parse_session", |b| {
        b.iter(|| parse_session(black_box(&text)));
    });
}

fn bench_load(c: &mut Criterion) {
    let text = session_with(20, 200).export_session_content();
    c.bench_function("load_session", |b| {
        b.iter(|| {
            let mut manager = TabManager::new();
            manager.load_session_from_content(black_box(&text))
        });
    });
}

criterion_group!(benches, bench_export, bench_parse, bench_load);
criterion_main!(benches);
