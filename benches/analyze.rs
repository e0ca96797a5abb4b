use capstat::{analyze_capture, read_frames, AnalysisConfig, Filter};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use etherparse::PacketBuilder;

fn build_capture(frames: usize) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0xa1b2c3d4u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    for v in [0u32, 0, 65535, 1] {
        out.extend_from_slice(&v.to_le_bytes());
    }

    let request = b"GET /index.html HTTP/1.1\r\nHost: bench.test\r\n\r\n";
    for i in 0..frames {
        let builder = PacketBuilder::ethernet2([1; 6], [2; 6])
            .ipv4([10, 0, (i % 256) as u8, 1], [10, 0, 0, 80], 64);
        let mut data = Vec::new();
        if i % 2 == 0 {
            builder.tcp(40000, 80, i as u32, 65535).write(&mut data, request).unwrap();
        } else {
            builder.udp(40000, 9999).write(&mut data, &[0u8; 32]).unwrap();
        }
        for v in [i as u32, 0, data.len() as u32, data.len() as u32] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(&data);
    }
    out
}

fn bench_analyze(c: &mut Criterion) {
    let capture = build_capture(10_000);
    let config = AnalysisConfig::default();

    c.bench_function("read 10k frames", |b| {
        b.iter(|| read_frames(black_box(capture.as_slice())).unwrap())
    });

    c.bench_function("analyze 10k frames", |b| {
        b.iter(|| analyze_capture(black_box(capture.as_slice()), None, &config).unwrap())
    });

    let filter = Filter::new().with_protocol("HTTPRequest");
    c.bench_function("analyze 10k frames filtered", |b| {
        b.iter(|| analyze_capture(black_box(capture.as_slice()), Some(&filter), &config).unwrap())
    });
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);
