// Copyright 2016 The Fancy Regex Authors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

//! Benchmarks for parsing, compiling and matching.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

use chainrex::{Expr, Flags, Regex, RegexBuilder};

const CONDITIONAL: &str =
    r"(?:(?P<refunix>\$)|(?P<refwin>%))([a-zA-Z_][a-zA-Z0-9_]+)(?(refwin)(?P=refwin))";

fn parse_patterns(c: &mut Criterion) {
    c.bench_function("parse word boundary", |b| {
        b.iter(|| Expr::parse_tree(black_box(r"\b\w+\b")).unwrap())
    });
    c.bench_function("parse conditional", |b| {
        b.iter(|| Expr::parse_tree(black_box(CONDITIONAL)).unwrap())
    });
    c.bench_function("compile lookbehind", |b| {
        b.iter(|| Regex::new(black_box(r"(?<=\d{3}[a-z0-9_-]o)taro")).unwrap())
    });
}

fn search_literal(c: &mut Criterion) {
    let text = "a".repeat(10_000) + "hello";
    let re = Regex::new("hello").unwrap();
    c.bench_function("search literal", |b| {
        b.iter(|| re.search(black_box(&text), Flags::empty()).unwrap())
    });
    c.bench_function("search literal reverse", |b| {
        let text = "hello".to_string() + &"a".repeat(10_000);
        b.iter(|| re.search(black_box(&text), Flags::REVERSE).unwrap())
    });
}

fn backtracking(c: &mut Criterion) {
    let re = Regex::new(r"^\s*([a-z]+_\d{3})*?\1$").unwrap();
    let text = "  mypicture_000tata_007tata_007";
    c.bench_function("lazy repeat with backref", |b| {
        b.iter(|| re.captures(black_box(text)).unwrap())
    });

    let re = Regex::new("^(.*?,){11}P").unwrap();
    let text = "1,2,3,4,5,6,7,8,9,10,11,P";
    c.bench_function("repeated lazy group", |b| {
        b.iter(|| re.captures(black_box(text)).unwrap())
    });

    let re = Regex::new(CONDITIONAL).unwrap();
    c.bench_function("conditional", |b| {
        b.iter(|| re.captures(black_box("/usr/autodesk/maya%MAYA_VER%/bin")).unwrap())
    });
}

fn deep_input(c: &mut Criterion) {
    let re = RegexBuilder::new().max_depth(64).build("(?:a|b)*$").unwrap();
    let text = "ab".repeat(50_000);
    c.bench_function("long repeat", |b| {
        b.iter(|| re.is_match(black_box(&text)).unwrap())
    });
}

fn substitution(c: &mut Criterion) {
    let re = Regex::new(r"(?P<name>[a-zA-Z][a-zA-Z_-]*)\d+").unwrap();
    let text = "shape123 anotherShape aThirdShape3 ".repeat(100);
    c.bench_function("substitute named", |b| {
        b.iter(|| re.substitute(black_box(&text), r"\g<name>", -1).unwrap())
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().warm_up_time(Duration::from_secs(3));
    targets = parse_patterns, search_literal, backtracking, deep_input
);
criterion_group!(
    name = slow_benches;
    config = Criterion::default().sample_size(30);
    targets = substitution
);
criterion_main!(benches, slow_benches);
