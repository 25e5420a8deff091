use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::path::Path;

const FLAT_FILES: usize = 512;
const FANOUT: usize = 8;
const DEPTH: usize = 3;

// A directory with FLAT_FILES empty files directly inside it.
fn flat_fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..FLAT_FILES {
        std::fs::write(dir.path().join(format!("file_{i:04}")), b"").unwrap();
    }
    dir
}

// FANOUT subdirectories per level, DEPTH levels deep, FANOUT files in each.
fn nested_fixture() -> (tempfile::TempDir, u64) {
    let dir = tempfile::tempdir().unwrap();
    let mut count = 0u64;
    let mut level = vec![dir.path().to_path_buf()];
    for _ in 0..DEPTH {
        let mut next = Vec::new();
        for parent in &level {
            for i in 0..FANOUT {
                let sub = parent.join(format!("d{i}"));
                std::fs::create_dir(&sub).unwrap();
                count += 1;
                for j in 0..FANOUT {
                    std::fs::write(sub.join(format!("f{j}")), b"").unwrap();
                    count += 1;
                }
                next.push(sub);
            }
        }
        level = next;
    }
    (dir, count)
}

fn std_walk_count(path: &Path) -> u64 {
    let mut total = 0;
    for entry in std::fs::read_dir(path).unwrap() {
        let entry = entry.unwrap();
        total += 1;
        if entry.file_type().unwrap().is_dir() {
            total += std_walk_count(&entry.path());
        }
    }
    total
}

fn bench_flat(c: &mut Criterion) {
    let dir = flat_fixture();

    let mut group = c.benchmark_group("flat_read_dir");
    group.throughput(Throughput::Elements(FLAT_FILES as u64));

    group.bench_function("hostfs", |b| {
        b.iter(|| {
            let n = hostfs::read_dir(black_box(dir.path())).unwrap().count();
            assert_eq!(n, FLAT_FILES);
            black_box(n)
        })
    });

    group.bench_function("std", |b| {
        b.iter(|| {
            let n = std::fs::read_dir(black_box(dir.path())).unwrap().count();
            assert_eq!(n, FLAT_FILES);
            black_box(n)
        })
    });

    group.finish();
}

fn bench_walk(c: &mut Criterion) {
    let (dir, expected) = nested_fixture();

    let mut group = c.benchmark_group("recursive_walk");
    group.throughput(Throughput::Elements(expected));

    group.bench_function("hostfs", |b| {
        b.iter(|| {
            let n = hostfs::walk(black_box(dir.path())).unwrap().count() as u64;
            assert_eq!(n, expected);
            black_box(n)
        })
    });

    group.bench_function("std_recursion", |b| {
        b.iter(|| {
            let n = std_walk_count(black_box(dir.path()));
            assert_eq!(n, expected);
            black_box(n)
        })
    });

    group.finish();
}

fn bench_stat(c: &mut Criterion) {
    let dir = flat_fixture();
    let target = dir.path().join("file_0000");
    let missing = dir.path().join("no_such_file");

    let mut group = c.benchmark_group("file_info");

    group.bench_function("present", |b| {
        b.iter(|| black_box(hostfs::file_info(black_box(&target))))
    });

    // the not-found path is a value, not an error, so it is worth timing too
    group.bench_function("missing", |b| {
        b.iter(|| black_box(hostfs::file_info(black_box(&missing))))
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(100)
        .warm_up_time(std::time::Duration::from_millis(500))
        .measurement_time(std::time::Duration::from_secs(3));
    targets = bench_flat, bench_walk, bench_stat
}
criterion_main!(benches);
