//! Metric names and recording helpers for bridge invocations

use std::sync::OnceLock;
use std::time::Instant;

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};

pub const INVOCATION_COUNT: &str = "bridge.invocation.count";
pub const INVOCATION_DURATION: &str = "bridge.invocation.duration";
pub const STREAM_FRAMES: &str = "bridge.stream.frames";

struct Instruments {
    invocations: Counter<u64>,
    duration: Histogram<f64>,
    frames: Counter<u64>,
}

fn instruments() -> &'static Instruments {
    static INSTRUMENTS: OnceLock<Instruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("loom");
        Instruments {
            invocations: meter.u64_counter(INVOCATION_COUNT).build(),
            duration: meter.f64_histogram(INVOCATION_DURATION).with_unit("s").build(),
            frames: meter.u64_counter(STREAM_FRAMES).build(),
        }
    })
}

/// Record one finished invocation
pub fn record_invocation(kind: &str, mode: &'static str, outcome: &'static str, start: Instant) {
    let attributes = [
        KeyValue::new("kind", kind.to_owned()),
        KeyValue::new("mode", mode),
        KeyValue::new("outcome", outcome),
    ];
    let instruments = instruments();
    instruments.invocations.add(1, &attributes);
    instruments.duration.record(start.elapsed().as_secs_f64(), &attributes);
}

/// Record frames written to a streaming response
pub fn record_stream_frames(kind: &str, frames: u64) {
    instruments()
        .frames
        .add(frames, &[KeyValue::new("kind", kind.to_owned())]);
}
