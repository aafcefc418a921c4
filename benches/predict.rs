use std::hint::black_box;

use aarogya::config::TrainingSettings;
use aarogya::dataset::load_dataset;
use aarogya::features::SymptomRecord;
use aarogya::predictor::Predictor;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tempfile::tempdir;

#[path = "../tests/support/dataset.rs"]
mod dataset;

const ROWS_PER_CLASS: usize = 50;

fn setup_predictor() -> Predictor {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("dataset.csv");
    dataset::write_dataset(&path, ROWS_PER_CLASS, &[]);
    let table = load_dataset(&path, "prognosis", 5).expect("load dataset");
    let settings = TrainingSettings {
        n_estimators: 100,
        ..TrainingSettings::default()
    };
    Predictor::train(table, &settings).expect("train predictor")
}

fn bench_predict(c: &mut Criterion) {
    let predictor = setup_predictor();
    let record = SymptomRecord::new(30, "Male", "3-7 days")
        .with_symptom("fever", true)
        .with_symptom("cough", true)
        .with_symptom("sore_throat", true);
    c.bench_with_input(
        BenchmarkId::new("predict_record", ROWS_PER_CLASS),
        &record,
        |b, record| {
            b.iter(|| predictor.predict(black_box(record)).expect("predict"));
        },
    );
    let features = predictor.encode(&record).expect("encode");
    c.bench_function("predict_encoded", |b| {
        b.iter(|| {
            predictor
                .predict_encoded(black_box(&features))
                .expect("predict_encoded")
        });
    });
}

criterion_group!(benches, bench_predict);
criterion_main!(benches);
