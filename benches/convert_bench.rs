//! Benchmark for model conversion
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tflite2onnx::io::{convert_bytes, ConvertOptions};
use tflite2onnx::layout::LayoutApproach;
use tflite2onnx::tflite::schema::{builtin_op, tensor_type};
use tflite2onnx::tflite::{OptionsDef, TfliteBuilder};

/// `depth` convolutions separated by Abs
fn conv_chain(depth: usize) -> Vec<u8> {
    let mut b = TfliteBuilder::new();
    let mut x = b.add_tensor("x", &[1, 32, 32, 8], tensor_type::FLOAT32);
    b.set_inputs(&[x]);
    for i in 0..depth {
        let w = b.add_f32_constant(&format!("w{}", i), &[8, 3, 3, 8], 0.01);
        let bias = b.add_f32_constant(&format!("b{}", i), &[8], 0.0);
        let y = b.add_tensor(&format!("conv{}", i), &[1, 32, 32, 8], tensor_type::FLOAT32);
        b.add_operator(builtin_op::CONV_2D, &[x, w, bias], &[y], OptionsDef::conv_same());
        let z = b.add_tensor(&format!("abs{}", i), &[1, 32, 32, 8], tensor_type::FLOAT32);
        b.add_operator(builtin_op::ABS, &[y], &[z], OptionsDef::None);
        x = z;
    }
    b.set_outputs(&[x]);
    b.finish()
}

fn convert_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    for depth in [4, 32] {
        let bytes = conv_chain(depth);
        for approach in [LayoutApproach::Propagation, LayoutApproach::Transpose] {
            let options = ConvertOptions {
                approach,
                ..Default::default()
            };
            group.bench_with_input(
                BenchmarkId::new(approach.to_string(), depth),
                &bytes,
                |b, bytes| b.iter(|| convert_bytes(black_box(bytes), &options)),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, convert_benchmark);
criterion_main!(benches);
