//! Benchmarks for MIPI raw packing.
//!
//! Run with: `cargo bench -p pixio-io`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pixio_io::formats::mipi::Packing;

fn bench_packing(c: &mut Criterion) {
    let mut group = c.benchmark_group("mipi");

    for width in [640usize, 1920, 4096] {
        group.throughput(Throughput::Elements(width as u64));

        for packing in [Packing::Raw10, Packing::Raw12] {
            let max = (1u32 << packing.bits()) as usize;
            let samples: Vec<u16> = (0..width).map(|i| (i * 7 % max) as u16).collect();
            let mut packed = vec![0u8; packing.row_bytes(width)];
            packing.pack_row(&samples, &mut packed);
            let mut unpacked = vec![0u16; width];
            let name = packing.file_format().name();

            group.bench_with_input(BenchmarkId::new(format!("pack_{name}"), width), &samples, |b, s| {
                let mut out = vec![0u8; packing.row_bytes(width)];
                b.iter(|| packing.pack_row(black_box(s), &mut out))
            });

            group.bench_with_input(BenchmarkId::new(format!("unpack_{name}"), width), &packed, |b, p| {
                b.iter(|| packing.unpack_row(black_box(p), &mut unpacked))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_packing);
criterion_main!(benches);
