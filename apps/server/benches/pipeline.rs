// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Benchmark of the synchronous pipeline stages on synthetic STL input.
//!
//! Compares:
//! 1. Binary STL decode
//! 2. ASCII STL decode
//! 3. Geometry sanitization (normals, bounds, centring, scaling)
//! 4. Analysis
//!
//! Run with: cargo bench -p meshport-server --bench pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use meshport_core::decode_stl;
use meshport_geometry::{analyze, GeometrySanitizer};

/// Triangle strip across a `side` x `side` grid, two facets per cell.
fn grid_facets(side: usize) -> Vec<[[f32; 3]; 3]> {
    let mut facets = Vec::with_capacity(side * side * 2);
    for i in 0..side {
        for j in 0..side {
            let (x, y) = (i as f32 * 40.0, j as f32 * 40.0);
            let z = ((i + j) % 7) as f32;
            let a = [x, y, z];
            let b = [x + 40.0, y, z];
            let c = [x, y + 40.0, z];
            let d = [x + 40.0, y + 40.0, z];
            facets.push([a, b, c]);
            facets.push([c, b, d]);
        }
    }
    facets
}

fn binary_stl(facets: &[[[f32; 3]; 3]]) -> Vec<u8> {
    let mut bytes = vec![0u8; 80];
    bytes.extend_from_slice(&(facets.len() as u32).to_le_bytes());
    for facet in facets {
        bytes.extend_from_slice(&[0u8; 12]);
        for vertex in facet {
            for v in vertex {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
        }
        bytes.extend_from_slice(&[0, 0]);
    }
    bytes
}

fn ascii_stl(facets: &[[[f32; 3]; 3]]) -> Vec<u8> {
    let mut text = String::from("solid grid\n");
    for facet in facets {
        text.push_str("  facet normal 0 0 1\n    outer loop\n");
        for [x, y, z] in facet {
            text.push_str(&format!("      vertex {} {} {}\n", x, y, z));
        }
        text.push_str("    endloop\n  endfacet\n");
    }
    text.push_str("endsolid grid\n");
    text.into_bytes()
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let sanitizer = GeometrySanitizer::default();

    for side in [32usize, 128, 256] {
        let facets = grid_facets(side);
        let name = format!("{}_facets", facets.len());
        let binary = binary_stl(&facets);
        let ascii = ascii_stl(&facets);

        group.throughput(Throughput::Elements(facets.len() as u64));

        group.bench_with_input(BenchmarkId::new("decode_binary", &name), &binary, |b, bytes| {
            b.iter(|| decode_stl(black_box(bytes)))
        });

        group.bench_with_input(BenchmarkId::new("decode_ascii", &name), &ascii, |b, bytes| {
            b.iter(|| decode_stl(black_box(bytes)))
        });

        let Ok(decoded) = decode_stl(&binary) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("sanitize", &name), &decoded.geometry, |b, geometry| {
            b.iter(|| sanitizer.sanitize(black_box(geometry.clone())))
        });

        let sanitized = sanitizer.sanitize(decoded.geometry);
        group.bench_with_input(BenchmarkId::new("analyze", &name), &sanitized, |b, geometry| {
            b.iter(|| analyze(black_box(geometry)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
