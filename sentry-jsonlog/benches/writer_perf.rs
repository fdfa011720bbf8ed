use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use sentry_jsonlog::{LogLevel, Record, SentryWriter, WriterOptions};

const LOG_EVENT_JSON: &[u8] = br#"{"level":"error","requestId":"bee07485-2485-4f64-99e1-d10165884ca7","error":"dial timeout","time":"2020-06-25T17:19:00+03:00","test":"test","message":"test message"}"#;

struct NoopTransport;

impl sentry::Transport for NoopTransport {
    fn send_envelope(&self, _envelope: sentry::Envelope) {}
}

fn active_writer(options: WriterOptions) -> SentryWriter {
    options
        .transport(Arc::new(NoopTransport))
        .attach_stacktrace(false)
        .build("https://public@sentry.invalid/1")
        .unwrap()
}

fn writer_perf(c: &mut Criterion) {
    c.bench_function("decode_record", |b| {
        b.iter(|| Record::decode(black_box(LOG_EVENT_JSON)))
    });

    {
        let mut group = c.benchmark_group("write_payload");
        group.bench_function("event", |b| {
            let writer = active_writer(WriterOptions::new());
            b.iter(|| writer.write_payload(black_box(LOG_EVENT_JSON)));
        });
        group.bench_function("ignored", |b| {
            let writer = active_writer(WriterOptions::new().levels([LogLevel::Fatal]));
            b.iter(|| writer.write_payload(black_box(LOG_EVENT_JSON)));
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("write_level");
        group.bench_function("event", |b| {
            let writer = active_writer(WriterOptions::new());
            b.iter(|| writer.write_level(LogLevel::Error, black_box(LOG_EVENT_JSON)));
        });
        group.bench_function("ignored", |b| {
            let writer = active_writer(WriterOptions::new());
            b.iter(|| writer.write_level(LogLevel::Info, black_box(LOG_EVENT_JSON)));
        });
        group.finish();
    }
}

criterion_group!(benches, writer_perf);
criterion_main!(benches);
