#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use sentry::protocol::Event;
use sentry::test::TestTransport;
use sentry::{ClientOptions, Hub, Scope};
use sentry_jsonlog::{SentryWriter, WriterOptions};

pub const TEST_DSN: &str = "https://test@sentry-jsonlog.com/test";

pub const LOG_EVENT_JSON: &[u8] = br#"{"level":"error","requestId":"bee07485-2485-4f64-99e1-d10165884ca7","error":"dial timeout","time":"2020-06-25T17:19:00+03:00","test":"test","message":"test message"}"#;

pub fn test_hub() -> (Arc<Hub>, Arc<TestTransport>) {
    let transport = TestTransport::new();
    let options = ClientOptions {
        dsn: Some(TEST_DSN.parse().unwrap()),
        transport: Some(Arc::new(transport.clone())),
        ..ClientOptions::default()
    };
    let hub = Hub::new(Some(Arc::new(options.into())), Arc::new(Scope::default()));
    (Arc::new(hub), transport)
}

pub fn init_writer(options: WriterOptions) -> (SentryWriter, Arc<TestTransport>) {
    let (hub, transport) = test_hub();
    let writer = options.build_with_hub(Some(hub)).unwrap();
    (writer, transport)
}

pub fn captured_events(transport: &TestTransport) -> Vec<Event<'static>> {
    transport
        .fetch_and_clear_envelopes()
        .into_iter()
        .filter_map(|envelope| envelope.event().cloned())
        .collect()
}

/// An `io::Write` collecting everything written into a shared buffer.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
