//! Benchmarks for the model-free pre/post-processing math.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use visage_models::BoundingBox;
use visage_vision::LetterboxMap;

fn bench_letterbox_mapping(c: &mut Criterion) {
    c.bench_function("letterbox_inverse_map", |b| {
        let map = LetterboxMap::anchored(1920, 1080, 640, 640);
        let bbox = BoundingBox::new(120.0, 80.0, 360.0, 320.0);
        b.iter(|| black_box(map.box_to_image(black_box(&bbox))));
    });
}

fn bench_iou_matrix(c: &mut Criterion) {
    c.bench_function("iou_matrix_64", |b| {
        let boxes: Vec<BoundingBox> = (0..64)
            .map(|i| {
                let offset = i as f32 * 3.0;
                BoundingBox::new(offset, offset, offset + 48.0, offset + 48.0)
            })
            .collect();
        b.iter(|| {
            let mut acc = 0.0f32;
            for a in &boxes {
                for other in &boxes {
                    acc += a.iou(other);
                }
            }
            black_box(acc)
        });
    });
}

criterion_group!(benches, bench_letterbox_mapping, bench_iou_matrix);
criterion_main!(benches);
