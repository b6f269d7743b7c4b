//! Codec benchmarks: command encoding and status frame decoding.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use aptlink::protocol::{DeviceFamily, MessageHeader, MotorStatus, move_relative, status_request};

fn bench_encode(c: &mut Criterion) {
    c.bench_function("encode_move_relative", |b| {
        b.iter(|| move_relative(black_box(1), black_box(100_000)));
    });

    c.bench_function("encode_status_request", |b| {
        b.iter(|| status_request(black_box(DeviceFamily::DcServo)));
    });
}

fn bench_decode(c: &mut Criterion) {
    let mut frame = vec![0x91, 0x04, 0x0e, 0x00, 0x81, 0x50];
    frame.extend_from_slice(&1u16.to_le_bytes());
    frame.extend_from_slice(&(-2048i32).to_le_bytes());
    frame.extend_from_slice(&[0u8; 4]);
    frame.extend_from_slice(&0x0200u32.to_le_bytes());

    c.bench_function("decode_header", |b| {
        b.iter(|| MessageHeader::from_bytes(black_box(&frame[..6])).unwrap());
    });

    c.bench_function("decode_motor_status", |b| {
        b.iter(|| MotorStatus::decode(black_box(&frame), DeviceFamily::DcServo).unwrap());
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
