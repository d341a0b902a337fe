//! # Selection Benchmarks
//!
//! Performance benchmarks for closest-match selection.
//!
//! Run with: `cargo bench -p riposte-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use riposte_core::{
    BestMatch, ComparatorKind, CorpusStore, LogicAdapter, MemoryCorpus, Statement,
};
use std::hint::black_box;

/// Create a corpus of N prompts, each answered by one reply.
fn create_dialog_corpus(size: usize) -> MemoryCorpus {
    let mut corpus = MemoryCorpus::with_seed(42);
    for i in 0..size {
        let prompt = format!("prompt number {} about topic {}", i, i % 17);
        corpus
            .record(&Statement::new(prompt.clone()), None)
            .expect("record");
        corpus
            .record(&Statement::new(format!("reply {}", i)), Some(&prompt))
            .expect("record");
    }
    corpus
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");

    for size in [100, 1000, 5000].iter() {
        let corpus = create_dialog_corpus(*size);
        let input = Statement::new("prompt number 42 about topic 8");

        for kind in [ComparatorKind::Levenshtein, ComparatorKind::Jaccard] {
            let adapter = BestMatch::new(kind.build());
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", kind), size),
                size,
                |b, _| b.iter(|| black_box(adapter.select(&corpus, &input))),
            );
        }
    }

    group.finish();
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");

    for size in [100, 1000].iter() {
        let corpus = create_dialog_corpus(*size);
        let input = Statement::new("prompt number 7 about topic 7");
        let adapter = BestMatch::new(ComparatorKind::Levenshtein.build());
        let mut rng = StdRng::seed_from_u64(7);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(adapter.process(&corpus, &input, &mut rng)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_select, bench_process);
criterion_main!(benches);
