//! Criterion benchmarks for the Padstream binary codec.
//!
//! The receive pipeline decodes one packet per datagram at up to 120 Hz per
//! client with a sub-10ms end-to-end latency budget, so codec cost must stay
//! deep in the noise floor.
//!
//! Run with:
//! ```bash
//! cargo bench --package padstream-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use padstream_core::{buttons, decode_packet, encode_packet, GamepadState, Packet};

fn make_active_packet() -> Packet {
    Packet::new(
        0xC0FF_EE00,
        31337,
        GamepadState {
            buttons: buttons::A | buttons::RIGHT_SHOULDER | buttons::DPAD_UP,
            left_trigger: 200,
            right_trigger: 14,
            left_x: -12000,
            left_y: 8000,
            right_x: 311,
            right_y: -29000,
        },
        987_654_321_000,
    )
}

fn make_neutral_packet() -> Packet {
    Packet::new(1, 0, GamepadState::neutral(), 0)
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_packet");
    let active = make_active_packet();
    group.bench_function("active", |b| b.iter(|| encode_packet(black_box(&active))));
    let neutral = make_neutral_packet();
    group.bench_function("neutral_heartbeat", |b| {
        b.iter(|| encode_packet(black_box(&neutral)))
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_packet");
    let bytes = encode_packet(&make_active_packet());
    group.bench_function("exact_27_bytes", |b| {
        b.iter(|| decode_packet(black_box(&bytes)).expect("decode must succeed"))
    });

    // Trailing-byte tolerance path: same record inside a larger datagram.
    let mut padded = bytes.to_vec();
    padded.resize(256, 0);
    group.bench_function("padded_256_bytes", |b| {
        b.iter(|| decode_packet(black_box(&padded)).expect("decode must succeed"))
    });
    group.finish();
}

fn bench_roundtrip(c: &mut Criterion) {
    let packet = make_active_packet();
    c.bench_function("encode_decode_roundtrip", |b| {
        b.iter(|| {
            let bytes = encode_packet(black_box(&packet));
            decode_packet(black_box(&bytes)).unwrap()
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_roundtrip);
criterion_main!(benches);
