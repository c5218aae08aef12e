use antlers_syntax::{ParseOptions, StandardKeywords, lexer, parse, parse_with};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
mod common;

fn bench_lexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexing");
    group.sample_size(10);

    let content = common::generate_template(100);
    group.bench_function("lex", |b| {
        b.iter(|| {
            let tokens = lexer::lex(std::hint::black_box(&content));
            std::hint::black_box(tokens);
        });
    });

    let unclosed = common::generate_unclosed_openers(5_000);
    group.bench_function("unclosed_openers", |b| {
        b.iter(|| {
            let lexed = lexer::tokenize(std::hint::black_box(&unclosed));
            std::hint::black_box(lexed);
        });
    });

    group.finish();
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");
    group.sample_size(10);

    for size in [10, 100, 1000] {
        let content = common::generate_template(size);
        group.bench_with_input(BenchmarkId::new("template", size), &content, |b, content| {
            b.iter(|| parse(std::hint::black_box(content)));
        });
    }

    let nested = common::generate_nested_loops(10, 8);
    group.bench_function("nested_loops", |b| {
        b.iter(|| parse(std::hint::black_box(&nested)));
    });

    let expressions = common::generate_expression_heavy(200);
    group.bench_function("expressions", |b| {
        b.iter(|| parse(std::hint::black_box(&expressions)));
    });

    let broken = common::generate_broken_template(200);
    group.bench_function("error_recovery", |b| {
        b.iter(|| parse(std::hint::black_box(&broken)));
    });

    group.finish();
}

fn bench_classifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier");
    group.sample_size(10);

    let content = common::generate_nested_loops(10, 8);
    let keywords = StandardKeywords::new();
    let options = ParseOptions {
        keywords: &keywords,
        ..ParseOptions::default()
    };
    group.bench_function("standard_keywords", |b| {
        b.iter(|| parse_with(std::hint::black_box(&content), &options));
    });

    group.finish();
}

criterion_group!(benches, bench_lexing, bench_parsing, bench_classifier);
criterion_main!(benches);
