use criterion::{criterion_group, criterion_main};

mod mqtt;

criterion_group!(
    benches,
    mqtt::client::bench_encode_remaining_length,
    mqtt::client::bench_publish_qos0,
    mqtt::client::bench_publish_qos1,
    mqtt::client::bench_inbound_dispatch
);
criterion_main!(benches);
