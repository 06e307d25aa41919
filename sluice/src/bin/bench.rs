//! Single-producer/single-consumer throughput of the blocking queues.
//!
//! Usage:
//!     cargo run --release --bin sluice-bench
//!
//! Environment variables:
//!     PRODUCER_CPU=0  Pin producer to CPU 0 (default: 0)
//!     CONSUMER_CPU=2  Pin consumer to CPU 2 (default: 2)

use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use minstant::Instant;
use sluice::{Backend, ByteQueue, Flags, QueueConfig, RecordQueue};

const MAX_CAPACITY: usize = 1 << 16;
const ITERATIONS: u64 = 1 << 20;

fn get_cpu_affinity() -> (Option<usize>, Option<usize>) {
    let producer_cpu = env::var("PRODUCER_CPU")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(Some(0));
    let consumer_cpu = env::var("CONSUMER_CPU")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(Some(2));
    (producer_cpu, consumer_cpu)
}

fn pin_to_cpu(cpu: Option<usize>) {
    if let Some(id) = cpu {
        core_affinity::set_for_current(core_affinity::CoreId { id });
    }
}

fn config(backend: Backend) -> QueueConfig {
    QueueConfig::new(MAX_CAPACITY)
        .with_flags(Flags::SHRINK)
        .with_backend(backend)
}

/// Spins until the consumer thread reports it is pinned and ready.
fn wait_ready(ready: &AtomicBool) {
    while !ready.load(Ordering::Acquire) {
        std::hint::spin_loop();
    }
}

fn report(label: &str, backend: Backend, start: Instant) {
    let elapsed = start.elapsed();
    let ops_per_ms = u128::from(ITERATIONS) * 1_000_000 / elapsed.as_nanos().max(1);
    let backend = format!("{backend:?}");
    println!("  {label:<8} {backend:<5} {ops_per_ms:>8} ops/ms  ({elapsed:?})");
}

fn bench_bytes(backend: Backend, producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    let queue = Arc::new(ByteQueue::with_config(config(backend)).unwrap());
    let ready = Arc::new(AtomicBool::new(false));

    let consumer = {
        let queue = Arc::clone(&queue);
        let ready = Arc::clone(&ready);
        thread::spawn(move || {
            pin_to_cpu(consumer_cpu);
            ready.store(true, Ordering::Release);

            let mut buf = [0u8; 8];
            for expected in 0..ITERATIONS {
                let mut filled = 0;
                while filled < buf.len() {
                    filled += queue.pop(&mut buf[filled..], Flags::WAIT);
                }
                let value = u64::from_le_bytes(buf);
                assert_eq!(value, expected, "data corruption");
            }
        })
    };

    wait_ready(&ready);
    pin_to_cpu(producer_cpu);

    let start = Instant::now();
    for i in 0..ITERATIONS {
        queue.push(&i.to_le_bytes(), Flags::WAIT).unwrap();
    }
    consumer.join().unwrap();
    report("bytes", backend, start);
}

fn bench_records(backend: Backend, producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    let queue = Arc::new(RecordQueue::with_config(config(backend)).unwrap());
    let ready = Arc::new(AtomicBool::new(false));

    let consumer = {
        let queue = Arc::clone(&queue);
        let ready = Arc::clone(&ready);
        thread::spawn(move || {
            pin_to_cpu(consumer_cpu);
            ready.store(true, Ordering::Release);

            let mut buf = [0u8; 32];
            for expected in 0..ITERATIONS {
                let n = queue.pop(&mut buf, Flags::WAIT);
                let text = std::str::from_utf8(&buf[..n - 1]).unwrap();
                assert_eq!(text.parse::<u64>().unwrap(), expected, "data corruption");
            }
        })
    };

    wait_ready(&ready);
    pin_to_cpu(producer_cpu);

    let start = Instant::now();
    for i in 0..ITERATIONS {
        queue.push_str(&i.to_string(), Flags::WAIT).unwrap();
    }
    consumer.join().unwrap();
    report("records", backend, start);
}

fn main() {
    let (producer_cpu, consumer_cpu) = get_cpu_affinity();

    println!("sluice SPSC (max_capacity={MAX_CAPACITY}, iters={ITERATIONS}):");
    for backend in [Backend::Ring, Backend::List] {
        bench_bytes(backend, producer_cpu, consumer_cpu);
        bench_records(backend, producer_cpu, consumer_cpu);
    }
}
