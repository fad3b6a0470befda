use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pseq::PSequence;

fn filled(length: usize) -> PSequence<usize> {
    (0..length).collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let sizes = [10, 100, 1_000, 10_000, 100_000, 1_000_000];

    for &size in &sizes {
        let samples: Vec<usize> = (0..size).collect();
        c.bench_function(&format!("PSequence push_back {}", size), |b| {
            b.iter(|| {
                let mut seq = PSequence::new();
                for &value in black_box(&samples) {
                    seq = seq.push_back(value);
                }
                seq
            })
        });
    }

    for &size in &sizes {
        let samples: Vec<usize> = (0..size).collect();
        c.bench_function(&format!("PSequence push_front {}", size), |b| {
            b.iter(|| {
                let mut seq = PSequence::new();
                for &value in black_box(&samples) {
                    seq = seq.push_front(value);
                }
                seq
            })
        });
    }

    for &size in &sizes {
        let seq = filled(size);
        c.bench_function(&format!("PSequence get (middle of {})", size), |b| {
            b.iter(|| black_box(&seq).get(size / 2))
        });
    }

    for &size in &sizes {
        let seq = filled(size);
        c.bench_function(&format!("PSequence split_at (middle of {})", size), |b| {
            b.iter(|| black_box(&seq).split_at(size / 2))
        });
    }

    for &size in &sizes {
        let left = filled(size);
        let right = filled(size);
        c.bench_function(&format!("PSequence append ({} + {})", size, size), |b| {
            b.iter(|| black_box(&left).append(black_box(&right)))
        });
    }

    for &size in &sizes {
        let seq = filled(size);
        c.bench_function(&format!("PSequence insert (middle of {})", size), |b| {
            b.iter(|| black_box(&seq).insert(size / 2, 0))
        });
    }

    for &size in &sizes {
        let seq = filled(size);
        c.bench_function(&format!("PSequence iterate {}", size), |b| {
            b.iter(|| black_box(&seq).iter().count())
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
