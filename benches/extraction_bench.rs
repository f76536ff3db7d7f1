//! Performance benchmarks for archive extraction
//!
//! Run with: cargo bench

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::io::{Cursor, Write};
use tempfile::TempDir;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use unspool::{Entry, ExtractOptions, ProgressMonitor, Unzip, ZipEngine, total_work};

/// Create a test ZIP archive with the specified number of files and size per file
fn create_test_archive(num_files: usize, bytes_per_file: usize) -> Vec<u8> {
    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let file_data = vec![0u8; bytes_per_file];

    for i in 0..num_files {
        let filename = format!("dir_{:02}/file_{:04}.dat", i % 16, i);
        zip.start_file(filename, options).unwrap();
        zip.write_all(&file_data).unwrap();
    }

    zip.finish().unwrap();
    buffer
}

fn bench_archive(c: &mut Criterion, group_name: &str, id: &str, num_files: usize, bytes: usize) {
    let mut group = c.benchmark_group(group_name);
    group.sample_size(20);
    group.throughput(Throughput::Bytes((num_files * bytes) as u64));

    let zip_data = create_test_archive(num_files, bytes);
    let unzip = Unzip::with_engine(ZipEngine::from_bytes(zip_data).unwrap()).unwrap();

    group.bench_function(id, |b| {
        b.iter(|| {
            let temp_dir = TempDir::new().unwrap();
            let progress = ProgressMonitor::new();
            unzip
                .extract_all(
                    black_box(&ExtractOptions::default()),
                    temp_dir.path(),
                    &progress,
                    false,
                )
                .unwrap();
        });
    });

    group.finish();
}

/// 10MB archive: 100 files @ 100KB each
fn bench_extract_small(c: &mut Criterion) {
    bench_archive(c, "extract_small", "10MB_100_files", 100, 100 * 1024);
}

/// 100MB archive: 100 files @ 1MB each
fn bench_extract_medium(c: &mut Criterion) {
    bench_archive(c, "extract_medium", "100MB_100_files", 100, 1024 * 1024);
}

/// 10MB archive: 1000 files @ 10KB each
fn bench_extract_many_small(c: &mut Criterion) {
    bench_archive(c, "extract_many_small", "10MB_1000_files", 1000, 10 * 1024);
}

/// Work estimation only (no extraction)
fn bench_total_work(c: &mut Criterion) {
    let entries: Vec<Entry> = (0..100_000)
        .map(|i| {
            let entry = Entry::file(format!("file_{i}"), 4096);
            if i % 10 == 0 {
                entry.with_large_size(8_000_000_000, 9_000_000_000)
            } else {
                entry
            }
        })
        .collect();

    c.bench_function("total_work_100k_entries", |b| {
        b.iter(|| total_work(black_box(Some(entries.as_slice()))).unwrap());
    });
}

criterion_group!(
    benches,
    bench_extract_small,
    bench_extract_medium,
    bench_extract_many_small,
    bench_total_work
);
criterion_main!(benches);
