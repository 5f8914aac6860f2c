/// Container throughput benchmarks
/// Compares codecs and the sequential vs parallel engines on the same input
use bcf_codecs::{DeflateCodec, Lz4Codec, StoredCodec, ZstdCodec};
use bcf_core::{decode, decode_parallel, encode, encode_into, encode_parallel, BlockCodec};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const INPUT_SIZE: usize = 8 * 1024 * 1024;
const BLOCK_SIZE: u32 = 256 * 1024;

/// Half repeating text, half LCG noise, so codecs have something to work on.
fn mixed_bytes(len: usize) -> Vec<u8> {
    let pattern = b"timestamp=1700000000 level=info msg=\"block written\" ";
    let mut rng = 0x2545_f491_4f6c_dd1du64;
    (0..len)
        .map(|i| {
            if (i / 4096) % 2 == 0 {
                pattern[i % pattern.len()]
            } else {
                rng = rng
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (rng >> 56) as u8
            }
        })
        .collect()
}

fn bench_codec<C: BlockCodec>(c: &mut Criterion, data: &[u8], mut codec: C) {
    let name = codec.name();
    let container = encode(data, &mut codec, BLOCK_SIZE).unwrap();

    let mut group = c.benchmark_group(format!("codec_{}", name));
    group.throughput(Throughput::Bytes(data.len() as u64));

    let mut out = Vec::new();
    group.bench_function("encode_into", |b| {
        b.iter(|| encode_into(black_box(data), &mut codec, BLOCK_SIZE, &mut out).unwrap())
    });
    group.bench_function("decode", |b| {
        b.iter(|| decode(black_box(&container), &mut codec).unwrap())
    });
    group.finish();
}

fn codec_benchmarks(c: &mut Criterion) {
    let data = mixed_bytes(INPUT_SIZE);
    bench_codec(c, &data, StoredCodec);
    bench_codec(c, &data, Lz4Codec);
    bench_codec(c, &data, ZstdCodec::default());
    bench_codec(c, &data, DeflateCodec::default());
}

fn parallel_benchmarks(c: &mut Criterion) {
    let data = mixed_bytes(INPUT_SIZE);
    let mut group = c.benchmark_group("engine_zstd");
    group.throughput(Throughput::Bytes(data.len() as u64));

    for block_size in [64 * 1024u32, BLOCK_SIZE, 1024 * 1024] {
        group.bench_with_input(
            BenchmarkId::new("encode_sequential", block_size),
            &block_size,
            |b, &bs| b.iter(|| encode(&data, &mut ZstdCodec::default(), bs).unwrap()),
        );
        group.bench_with_input(
            BenchmarkId::new("encode_parallel", block_size),
            &block_size,
            |b, &bs| b.iter(|| encode_parallel(&data, ZstdCodec::default, bs).unwrap()),
        );

        let container = encode(&data, &mut ZstdCodec::default(), block_size).unwrap();
        group.bench_with_input(
            BenchmarkId::new("decode_parallel", block_size),
            &container,
            |b, container| b.iter(|| decode_parallel(container, ZstdCodec::default).unwrap()),
        );
    }
    group.finish();
}

criterion_group!(benches, codec_benchmarks, parallel_benchmarks);
criterion_main!(benches);
