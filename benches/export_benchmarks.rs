use chrono::Utc;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use idcdetect::export::predictions_to_csv;
use idcdetect::inference::preprocess::{softmax, top1};
use idcdetect::store::{CaseRecord, Prediction, PredictionStatus};

fn cases(n: usize) -> Vec<CaseRecord> {
    (0..n)
        .map(|i| CaseRecord {
            prediction: Prediction {
                id: i as i64,
                user_id: (i % 17) as i64,
                image_path: format!("static/uploads/1700000000.{:06}_slide.png", i),
                result_class: (i % 2) as i64,
                confidence: 0.7 + (i % 29) as f64 / 100.0,
                notes: (i % 3 == 0).then(|| "Reviewed, no further action".to_string()),
                status: PredictionStatus::Pending,
                timestamp: Utc::now(),
            },
            owner_username: format!("patient{}", i % 17),
        })
        .collect()
}

fn bench_csv_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("predictions_to_csv");
    for size in [10usize, 1_000, 10_000] {
        let data = cases(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| predictions_to_csv(black_box(data)))
        });
    }
    group.finish();
}

fn bench_postprocess(c: &mut Criterion) {
    let logits = [0.25f32, 2.75];
    c.bench_function("softmax_top1", |b| {
        b.iter(|| top1(&softmax(black_box(&logits))))
    });
}

criterion_group!(benches, bench_csv_export, bench_postprocess);
criterion_main!(benches);
