use buzzer_shm::{shm, FrequencyReader, Publisher, DEFAULT_CHANNEL_SIZE};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_publish(c: &mut Criterion) {
    let name = format!("/buzzer_bench_{}", std::process::id());
    let mut publisher = Publisher::open(&name, DEFAULT_CHANNEL_SIZE).unwrap();
    let reader = FrequencyReader::open(&name).unwrap();

    c.bench_function("publish_short", |b| {
        b.iter(|| publisher.publish(black_box("  1000  ")).unwrap())
    });

    c.bench_function("read_value", |b| b.iter(|| black_box(reader.read_value())));

    drop(reader);
    drop(publisher);
    let _ = shm::unlink(&name);
}

criterion_group!(benches, bench_publish);
criterion_main!(benches);
