use std::collections::VecDeque;

use criterion::{Criterion, Throughput};
use homemq::mqtt::{Client, Options, QoS, codec};
use homemq::network::error::Error;
use homemq::network::{Close, Connection, Read, Write};

/// In-memory transport: reads come from a primed queue, writes are
/// discarded. Keeps the benchmarks about the engine, not a socket.
struct LoopConnection {
    reads: VecDeque<u8>,
}

impl Read for LoopConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let len = buf.len().min(self.reads.len());
        for slot in buf[..len].iter_mut() {
            *slot = self.reads.pop_front().unwrap();
        }
        Ok(len)
    }
}

impl Write for LoopConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for LoopConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for LoopConnection {}

fn drop_message(_topic: &[u8], _payload: &[u8]) {}

fn connected_client(inbound: Vec<u8>) -> Client<'static, LoopConnection> {
    let mut reads = VecDeque::from([0x20, 0x02, 0x00, 0x00]);
    reads.extend(inbound);
    let conn = LoopConnection { reads };
    let opts = Options {
        client_id: "homemq-bench",
        keep_alive_seconds: 10,
        username: None,
        password: None,
        last_will: None,
    };
    let mut client = Client::new(conn, opts);
    client.set_callback(drop_message);
    client.connect(true).expect("Failed to connect");
    client
}

/// PUBACK frames for packet identifiers 1..=count, the sequence a fresh
/// client allocates.
fn puback_run(count: u16) -> Vec<u8> {
    let mut acks = Vec::new();
    for pid in 1..=count {
        acks.extend_from_slice(&[0x40, 2, (pid >> 8) as u8, pid as u8]);
    }
    acks
}

fn publish_run(count: usize, topic: &str, payload: &[u8]) -> Vec<u8> {
    let mut frames = Vec::new();
    for _ in 0..count {
        frames.push(0x30);
        frames.push((2 + topic.len() + payload.len()) as u8);
        frames.extend_from_slice(&(topic.len() as u16).to_be_bytes());
        frames.extend_from_slice(topic.as_bytes());
        frames.extend_from_slice(payload);
    }
    frames
}

pub fn bench_encode_remaining_length(c: &mut Criterion) {
    let values = [0usize, 127, 128, 16_384, 2_097_152, 268_435_455];
    c.bench_function("encode_remaining_length", |b| {
        b.iter(|| {
            for value in values {
                let mut buf: heapless::Vec<u8, 5> = heapless::Vec::new();
                codec::encode_remaining_length(&mut buf, std::hint::black_box(value)).unwrap();
                std::hint::black_box(&buf);
            }
        })
    });
}

pub fn bench_publish_qos0(c: &mut Criterion) {
    let payload = b"hello world from bench";
    let mut group = c.benchmark_group("publish_qos0");
    group.throughput(Throughput::Bytes(payload.len() as u64 * 50));
    group.bench_function("publish_qos0", |b| {
        b.iter_batched_ref(
            || connected_client(Vec::new()),
            |client| {
                for _ in 0..50 {
                    client
                        .publish("homemq/bench-topic", payload, QoS::AtMostOnce, false, None)
                        .expect("Failed to publish");
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_publish_qos1(c: &mut Criterion) {
    let payload = b"hello world from bench";
    let mut group = c.benchmark_group("publish_qos1");
    group.throughput(Throughput::Bytes(payload.len() as u64 * 50));
    group.bench_function("publish_qos1", |b| {
        b.iter_batched_ref(
            || connected_client(puback_run(50)),
            |client| {
                for _ in 0..50 {
                    client
                        .publish("homemq/bench-topic", payload, QoS::AtLeastOnce, false, None)
                        .expect("Failed to publish");
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_inbound_dispatch(c: &mut Criterion) {
    let payload = b"hello world from bench";
    let mut group = c.benchmark_group("inbound_dispatch");
    group.throughput(Throughput::Bytes(payload.len() as u64 * 50));
    group.bench_function("inbound_dispatch", |b| {
        b.iter_batched_ref(
            || connected_client(publish_run(50, "homemq/bench-topic", payload)),
            |client| {
                for _ in 0..50 {
                    client.wait_msg().expect("Failed to dispatch");
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });
    group.finish();
}
