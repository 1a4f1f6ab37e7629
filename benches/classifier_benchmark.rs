use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgb, RgbImage};
use ndarray::{Array2, Array4};
use snapclass::{Classifier, ImageNetwork, LabelTable, NetworkError, PreprocessConfig, Preprocessor};

#[derive(Debug)]
struct StaticScores(Vec<f32>);

impl ImageNetwork for StaticScores {
    fn forward(&self, _input: Array4<f32>) -> Result<Array2<f32>, NetworkError> {
        Array2::from_shape_vec((1, self.0.len()), self.0.clone())
            .map_err(|e| NetworkError::Backend(e.to_string()))
    }
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

fn bench_preprocessing(c: &mut Criterion) {
    let preprocessor = Preprocessor::new(PreprocessConfig::default()).unwrap();
    let mut group = c.benchmark_group("Preprocessing");
    group.sample_size(30);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for (width, height) in [(320, 240), (1280, 720), (4000, 3000)] {
        let image = gradient(width, height);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &image,
            |b, image| b.iter(|| preprocessor.transform(black_box(image))),
        );
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.png");
    gradient(640, 480).save(&path).unwrap();

    let scores: Vec<f32> = (0..1000).map(|i| ((i * 7919) % 1000) as f32 / 100.0).collect();
    let classifier = Classifier::builder()
        .with_network(Box::new(StaticScores(scores)))
        .unwrap()
        .with_labels(LabelTable::imagenet_sample())
        .build()
        .unwrap();

    let mut group = c.benchmark_group("Prediction");
    group.sample_size(30);

    group.bench_function("predict_top5", |b| {
        b.iter(|| classifier.predict(black_box(&path), 5).unwrap())
    });

    let distribution = classifier.classify(&path).unwrap();
    for k in [1, 5, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("top_k", k), &k, |b, &k| {
            b.iter(|| distribution.top_k(black_box(k)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_preprocessing, bench_prediction);
criterion_main!(benches);
