use criterion::{black_box, criterion_group, criterion_main, Criterion};
use luapre::scan::{scan, Syntax};
use luapre::tree::build;

fn plain_source(repeats: usize) -> String {
    let chunk = "def f(x):\n    \"\"\"Return x doubled.\"\"\"\n    return x * 2\n\n";
    chunk.repeat(repeats)
}

fn directive_source(repeats: usize) -> String {
    let chunk = "\"\"\"%n = (n or 0) + 1%\"\"\"\n\
                 \"\"\"%if n % 2 == 0 then%\"\"\"\neven()\n\
                 \"\"\"%%if n > 10 then%%\"\"\"big()\"\"\"%%end%%\"\"\"\n\
                 \"\"\"%else%\"\"\"\nodd()\n\"\"\"%end%\"\"\"\n";
    chunk.repeat(repeats)
}

fn bench_scan(c: &mut Criterion) {
    let syntax = Syntax::default();
    let plain_small = plain_source(100); // ~6k
    let plain_large = plain_source(10000); // ~600k
    let dir_small = directive_source(100);
    let dir_large = directive_source(10000);

    let mut g = c.benchmark_group("scan");

    g.bench_function("plain_small", |b| {
        b.iter(|| scan(black_box(&plain_small), &syntax))
    });
    g.bench_function("plain_large", |b| {
        b.iter(|| scan(black_box(&plain_large), &syntax))
    });
    g.bench_function("directives_small", |b| {
        b.iter(|| scan(black_box(&dir_small), &syntax))
    });
    g.bench_function("directives_large", |b| {
        b.iter(|| scan(black_box(&dir_large), &syntax))
    });

    g.finish();

    let mut g = c.benchmark_group("scan_and_build");
    g.bench_function("directives_large", |b| {
        b.iter(|| scan(black_box(&dir_large), &syntax).map(build))
    });
    g.finish();
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
