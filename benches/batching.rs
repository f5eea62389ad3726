use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use datafile::batch::BatchReader;
use datafile::source::RowSource;
use datafile::source::memory::MemorySupplier;

const ROWS: usize = 20_000;

fn supplier() -> MemorySupplier {
    MemorySupplier::new((0..ROWS).map(|i| {
        let blank = i % 50 == 0;
        (!blank).then(|| vec![i.to_string(), format!("name {i}"), " padded ".to_string()])
    }))
}

fn bench_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_reader");
    for batch_size in [100usize, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &batch_size, |b, &size| {
            b.iter_batched(
                || {
                    let mut source = RowSource::with_headings("bench", supplier(), ["id", "name", "note"])
                        .expect("unique headings");
                    source.set_trim_fields(true);
                    source.open().expect("open");
                    source
                },
                |mut source| {
                    let reader = BatchReader::with_batch_size(&mut source, size).expect("batch size");
                    let rows: usize = reader.map(|batch| batch.expect("batch").len()).sum();
                    black_box(rows)
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_batches);
criterion_main!(benches);
