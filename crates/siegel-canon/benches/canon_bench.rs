// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Benchmarks for the canonicalization pipeline: digesting, volatile path
// scrubbing, and marked-element extraction.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use siegel_canon::markup::extract_marked_element;
use siegel_canon::{MARKER_CLASS, digest_bytes, scrub_volatile_paths};

fn bench_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint_digest");
    for (label, size) in [
        ("1 KiB", 1024),
        ("16 KiB", 16 * 1024),
        ("256 KiB", 256 * 1024),
        ("1 MiB", 1024 * 1024),
    ] {
        let data = vec![0xabu8; size];
        group.bench_function(label, |b| b.iter(|| digest_bytes(black_box(&data))));
    }
    group.finish();
}

fn bench_scrub(c: &mut Criterion) {
    let mut fragment = String::from("<div class=\"tuf-authenticate\">");
    for i in 0..200 {
        fragment.push_str(&format!(
            "<a href=\"/_publication/2024-{:02}/doc-{i}.html\">doc {i}</a>",
            (i % 12) + 1
        ));
    }
    fragment.push_str("</div>");

    let mut group = c.benchmark_group("volatile_path_scrub");
    group.bench_function("200 links", |b| {
        b.iter(|| scrub_volatile_paths(black_box(&fragment)))
    });
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let mut page = String::from("<html><body><header>chrome</header>");
    page.push_str("<div class=\"tuf-authenticate\">");
    for i in 0..500 {
        page.push_str(&format!("<p id=\"para-{i}\">paragraph {i} &amp; more</p>"));
    }
    page.push_str("</div><footer>chrome</footer></body></html>");

    let mut group = c.benchmark_group("marked_element_extraction");
    group.bench_function("500 paragraphs", |b| {
        b.iter(|| extract_marked_element(black_box(&page), MARKER_CLASS))
    });
    group.finish();
}

criterion_group!(benches, bench_digest, bench_scrub, bench_extract);
criterion_main!(benches);
