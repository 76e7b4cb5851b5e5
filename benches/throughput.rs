//! Record round-trip throughput

#![allow(clippy::expect_used)] // benchmark setup may fail loudly

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use txring::{TransactionalRing, Ts};

fn bench_record_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_roundtrip");

    for payload in &[16_usize, 64, 256, 1024] {
        group.throughput(Throughput::Bytes(*payload as u64));
        group.bench_function(format!("payload_{payload}"), |b| {
            let mut ring = TransactionalRing::<Ts>::new();
            ring.reserve(1 << 20).expect("reserve");
            let (mut producer, mut consumer) = ring.split().expect("split");
            let data = vec![0x5A_u8; *payload];

            b.iter(|| {
                let mut tx = producer.try_write(Ts::from_nanos(1)).expect("room");
                assert!(tx.push_bytes(&data));
                tx.commit();

                let mut rx = consumer.try_read().expect("data");
                let mut drained = 0_usize;
                assert!(rx.pop_bytes(*payload as u32, |bytes| drained += bytes.len()));
                black_box(drained);
            });
        });
    }

    group.finish();
}

fn bench_header_only_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("header_only");
    group.throughput(Throughput::Elements(1));

    group.bench_function("commit_drain", |b| {
        let mut ring = TransactionalRing::<Ts>::new();
        ring.reserve(1 << 16).expect("reserve");
        let (mut producer, mut consumer) = ring.split().expect("split");

        b.iter(|| {
            producer.try_write(Ts::from_nanos(1)).expect("room").commit();
            let tx = consumer.try_read().expect("data");
            black_box(tx.timestamp());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_record_roundtrip, bench_header_only_records);
criterion_main!(benches);
