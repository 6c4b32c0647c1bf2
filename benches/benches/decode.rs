//! Benchmarks for RAW plane decoding and output scaling
//!
//! Run with: cargo bench --bench decode

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use x3f_bitstream::{encode_residual, BitWriter, HuffmanCode, HuffmanTree};
use x3f_core::{SampleType, TypeFormat};
use x3f_decoder::legacy::HuffmanImage;
use x3f_decoder::true_raw::decode_plane;
use x3f_dump::{rescale, ScaleOptions};
use x3f_headers::ImageHeader;

fn residual_codes() -> Vec<HuffmanCode> {
    (0..16).map(|n| HuffmanCode::new(4, n)).collect()
}

/// A plane of small alternating residuals, like a smooth gradient
fn true_plane(columns: u32, rows: u32) -> Vec<u8> {
    let codes = residual_codes();
    let mut writer = BitWriter::new();
    for row in 0..rows {
        for col in 0..columns {
            let residual = if (row + col) % 2 == 0 { 3 } else { -3 };
            let residual = if col < 2 { 0 } else { residual };
            let (category, raw) = encode_residual(residual);
            writer.write_code(codes[category as usize]).unwrap();
            writer.write_bits(raw, category as usize).unwrap();
        }
    }
    writer.into_bytes()
}

fn legacy_body(columns: u32, rows: u32) -> Vec<u8> {
    let entries = 1usize << 10;
    let mut body = Vec::new();
    for value in 0..entries as u16 {
        body.extend_from_slice(&value.to_le_bytes());
    }
    for symbol in 0..entries as u32 {
        let element = if symbol < 4 {
            HuffmanCode::new(2, symbol).to_packed()
        } else {
            0
        };
        body.extend_from_slice(&element.to_le_bytes());
    }

    let mut offsets = Vec::new();
    let mut pixels = Vec::new();
    for row in 0..rows {
        offsets.push(pixels.len() as u32);
        let mut writer = BitWriter::new();
        for i in 0..columns * 3 {
            writer.write_code(HuffmanCode::new(2, (row + i) % 4)).unwrap();
        }
        pixels.extend(writer.into_bytes());
    }
    body.extend(pixels);
    for offset in offsets {
        body.extend_from_slice(&offset.to_le_bytes());
    }
    body
}

fn bench_true_plane(c: &mut Criterion) {
    let mut group = c.benchmark_group("TRUE plane");
    let tree = HuffmanTree::build(&residual_codes()).unwrap();

    for size in [64u32, 256, 1024] {
        let data = true_plane(size, size);
        group.throughput(Throughput::Elements(size as u64 * size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| decode_plane(&tree, black_box(data), 512, size, size).unwrap());
        });
    }

    group.finish();
}

fn bench_legacy(c: &mut Criterion) {
    let mut group = c.benchmark_group("Legacy Huffman");
    let (columns, rows) = (512, 512);
    let header = ImageHeader {
        type_format: TypeFormat::RAW_HUFFMAN_10BIT,
        columns,
        rows,
        row_stride: 0,
    };
    let body = legacy_body(columns, rows);
    let image = HuffmanImage::load(&header, &body, 10, true, SampleType::U16).unwrap();

    group.throughput(Throughput::Elements(columns as u64 * rows as u64));
    group.bench_function("serial_512", |b| {
        b.iter(|| image.decode(black_box(&body), false).unwrap());
    });
    group.bench_function("parallel_512", |b| {
        b.iter(|| image.decode(black_box(&body), true).unwrap());
    });

    group.finish();
}

fn bench_rescale(c: &mut Criterion) {
    let samples: Vec<u16> = (0..3 * 512 * 512).map(|i| (i % 4096) as u16).collect();
    let options = ScaleOptions::new().gamma(2.2);

    c.bench_function("rescale_gamma_2.2", |b| {
        b.iter(|| rescale(black_box(&samples), &options).unwrap());
    });
}

criterion_group!(benches, bench_true_plane, bench_legacy, bench_rescale);
criterion_main!(benches);
