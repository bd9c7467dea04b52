use criterion::{Criterion, criterion_group, criterion_main};

use carto_core::{CartoConfig, CartoPipeline, IngestOptions, SourceTree};

fn synthetic_tree(files: usize) -> SourceTree {
    let entries = (0..files).map(|i| {
        let path = format!("pkg/mod_{i}.py");
        let prev = if i == 0 { 0 } else { i - 1 };
        let content = format!(
            "from pkg.mod_{prev} import fn_{prev}\n\n\
             def fn_{i}(x):\n    return fn_{prev}(x) + {i}\n\n\
             class Type{i}:\n    def method(self):\n        return fn_{i}(0)\n"
        );
        (path, content)
    });
    SourceTree::new(entries)
}

fn bench_ingest(c: &mut Criterion) {
    let tree = synthetic_tree(50);
    let options = IngestOptions::default();

    c.bench_function("ingest_50_python_files", |b| {
        b.iter(|| {
            let pipeline = CartoPipeline::new(CartoConfig::default());
            pipeline
                .run(std::hint::black_box(&tree), &options)
                .expect("ingest")
        });
    });

    c.bench_function("ingest_50_files_warm_cache", |b| {
        let pipeline = CartoPipeline::new(CartoConfig::default());
        pipeline.run(&tree, &options).expect("warm-up");
        b.iter(|| {
            pipeline
                .run(std::hint::black_box(&tree), &options)
                .expect("ingest")
        });
    });
}

criterion_group!(benches, bench_ingest);
criterion_main!(benches);
