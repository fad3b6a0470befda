use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pseq::PVector;

fn filled(length: usize) -> PVector<usize> {
    (0..length).collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let sizes = [10, 100, 1_000, 10_000, 100_000, 1_000_000];

    for &size in &sizes {
        let samples: Vec<usize> = (0..size).collect();
        c.bench_function(&format!("PVector push_back {}", size), |b| {
            b.iter(|| {
                let mut vector = PVector::new();
                for &value in black_box(&samples) {
                    vector = vector.push_back(value);
                }
                vector
            })
        });
    }

    for &size in &sizes {
        let vector = filled(size);
        c.bench_function(&format!("PVector get (middle of {})", size), |b| {
            b.iter(|| black_box(&vector).get(size / 2))
        });
    }

    for &size in &sizes {
        let vector = filled(size);
        c.bench_function(&format!("PVector set (middle of {})", size), |b| {
            b.iter(|| black_box(&vector).set(size / 2, 0))
        });
    }

    for &size in &sizes {
        let vector = filled(size);
        c.bench_function(&format!("PVector iterate {}", size), |b| {
            b.iter(|| black_box(&vector).iter().count())
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
