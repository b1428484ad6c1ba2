use criterion::{black_box, criterion_group, criterion_main, Criterion};
use homemeter_rs::gpio::EdgeTimingDecoder;
use homemeter_rs::p1::{render_telegram, TelegramFrameAssembler, TelegramPacket};

fn dht_intervals(code: u64) -> Vec<u32> {
    let mut intervals = vec![20_000, 80, 80];
    intervals.extend((0..40).rev().map(|i| if (code >> i) & 1 == 1 { 120 } else { 80 }));
    intervals
}

fn benchmark_telegram(c: &mut Criterion) {
    let packet = TelegramPacket {
        eid: "4530303034303031353934373534343134".into(),
        tariff: 1,
        low_consumed_wh: 123_456,
        high_consumed_wh: 654_321,
        current_consumed_wh: 1_193,
        gas_consumed_l: 42,
        ..TelegramPacket::new("ISK5\\2M550T-1012")
    };
    let telegram = render_telegram(&packet);

    c.bench_function("decode_telegram", |b| {
        b.iter(|| {
            let mut assembler = TelegramFrameAssembler::new();
            let outcomes = assembler.push_bytes(black_box(telegram.as_bytes()));
            black_box(outcomes);
        })
    });
}

fn benchmark_dht_frame(c: &mut Criterion) {
    let intervals = dht_intervals(0x02_8A_81_48_55);

    c.bench_function("decode_dht_frame", |b| {
        b.iter(|| {
            let mut decoder = EdgeTimingDecoder::new();
            let mut reading = None;
            for &interval in black_box(&intervals) {
                reading = decoder.push_interval(interval).or(reading);
            }
            black_box(reading);
        })
    });
}

criterion_group!(benches, benchmark_telegram, benchmark_dht_frame);
criterion_main!(benches);
