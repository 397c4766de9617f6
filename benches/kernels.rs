use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use rowkernels::{BoxAverager, BoxAveragerParams, FastExactDivider, SlopeEmphasizer};

fn make_plane(height: usize, width: usize) -> Array2<u8> {
    // soft edges every 37 pixels plus a mild texture
    Array2::from_shape_fn((height, width), |(r, c)| {
        let edge = if (c / 37) % 2 == 0 { 40 } else { 200 };
        let ramp = (c % 37).min(6) as u32 * 20;
        (edge as u32 + ramp + ((r * 7 + c * 13) % 5) as u32).min(255) as u8
    })
}

fn bench_emphasize_slopes(c: &mut Criterion) {
    let plane = make_plane(1024, 1024);
    let emphasizer = SlopeEmphasizer::builder()
        .with_slope_width(8)
        .with_minimal_change(30.0)
        .with_process_ascending(true)
        .with_process_descending(true)
        .with_allow_long_slopes(true)
        .build()
        .unwrap();

    let mut group = c.benchmark_group("emphasize_slopes");
    group.bench_function("rows_1024x1024", |b| {
        b.iter_batched_ref(
            || plane.clone(),
            |image| {
                for row in image.rows_mut() {
                    emphasizer.emphasize_view(black_box(row));
                }
            },
            criterion::BatchSize::LargeInput,
        )
    });
    group.bench_function("columns_1024x1024", |b| {
        b.iter_batched_ref(
            || plane.clone(),
            |image| {
                for column in image.columns_mut() {
                    emphasizer.emphasize_view(black_box(column));
                }
            },
            criterion::BatchSize::LargeInput,
        )
    });
    group.finish();
}

fn bench_exact_division(c: &mut Criterion) {
    let sums: Vec<u64> = (0..4096u64).map(|k| k * 3).collect();
    let single = FastExactDivider::for_samples::<u8>(64).unwrap();
    let two_stage = FastExactDivider::for_samples::<u8>(49).unwrap();

    let mut group = c.benchmark_group("exact_division");
    group.bench_function("single_stage_64", |b| {
        b.iter(|| sums.iter().map(|&s| single.divide(black_box(s))).sum::<u64>())
    });
    group.bench_function("two_stage_49", |b| {
        b.iter(|| sums.iter().map(|&s| two_stage.divide(black_box(s))).sum::<u64>())
    });
    group.bench_function("integer_division_49", |b| {
        b.iter(|| sums.iter().map(|&s| black_box(s) / black_box(49u64)).sum::<u64>())
    });
    group.finish();
}

fn bench_box_mean(c: &mut Criterion) {
    let plane = make_plane(1, 1 << 16);
    let row = plane.as_slice().unwrap().to_vec();
    let fast = BoxAverager::<u8>::new(BoxAveragerParams {
        window_size: 49,
        rounding: true,
        strict_division: false,
    })
    .unwrap();
    let strict = BoxAverager::<u8>::new(BoxAveragerParams {
        strict_division: true,
        ..*fast.params()
    })
    .unwrap();

    let mut group = c.benchmark_group("box_mean");
    group.bench_function("reciprocal_49", |b| b.iter(|| fast.averaged(black_box(&row))));
    group.bench_function("strict_49", |b| b.iter(|| strict.averaged(black_box(&row))));
    group.finish();
}

criterion_group!(benches, bench_emphasize_slopes, bench_exact_division, bench_box_mean);
criterion_main!(benches);
