use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use spacey_frontend::{parse_number, parse_script};

const SCRIPT: &str = r#"
"use strict";
var counter = 0, cache = {};

function fibonacci(n) {
    if (n < 2) return n;
    if (cache[n] !== undefined) return cache[n];
    var value = fibonacci(n - 1) + fibonacci(n - 2);
    cache[n] = value;
    return value;
}

var shapes = [
    { kind: "circle", r: 2 },
    { kind: "square", side: 3 },
    { kind: "rect", w: 2, h: 5 },
];

function area(shape) {
    switch (shape.kind) {
        case "circle": return Math.PI * shape.r * shape.r;
        case "square": return shape.side * shape.side;
        default: return shape.w * shape.h;
    }
}

for (var i = 0; i < shapes.length; i++) {
    counter += area(shapes[i]) | 0;
}

for (var key in cache) {
    if (cache.hasOwnProperty(key)) counter ^= cache[key] << 1;
}

var point = {
    x: 1,
    y: 2,
    get length() { return Math.sqrt(this.x * this.x + this.y * this.y); },
    set scale(f) { this.x *= f; this.y *= f; }
};

try {
    point.scale = 3;
    counter = counter > 10 ? counter - point.length : -counter;
} catch (e) {
    counter = 0;
} finally {
    counter++;
}

var matcher = /^[a-z]+\d*$/gi;
var ok = !!(matcher.test("abc123") && typeof counter === "number");
"#;

// ---------------------------------------------------------------------------
// Whole scripts
// ---------------------------------------------------------------------------

fn bench_parse_script(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_script");
    group.throughput(Throughput::Bytes(SCRIPT.len() as u64));
    group.bench_function("representative", |b| {
        b.iter(|| parse_script(black_box(SCRIPT)));
    });

    let large = SCRIPT.repeat(20);
    group.throughput(Throughput::Bytes(large.len() as u64));
    group.bench_function("representative_x20", |b| {
        b.iter(|| parse_script(black_box(&large)));
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// String to number conversion
// ---------------------------------------------------------------------------

fn bench_parse_number(c: &mut Criterion) {
    c.bench_function("parse_number", |b| {
        b.iter(|| {
            parse_number(black_box("  12345  "));
            parse_number(black_box("0x7FFFFFFF"));
            parse_number(black_box("-1.5e10"));
            parse_number(black_box("12px"))
        });
    });
}

criterion_group!(benches, bench_parse_script, bench_parse_number);
criterion_main!(benches);
