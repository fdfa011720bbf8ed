use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use sentry_core::protocol::Event;
use sentry_core::{Hub, IntoDsn};

use crate::converters::{breadcrumb_from_event, convert_log_level, EventConverter};
use crate::error::Error;
use crate::filters::{Filters, RecordFilter};
use crate::level::LogLevel;
use crate::options::{BeforeSend, Clock, DebugSink, ErrorHandler, WriterOptions};
use crate::record::{self, Record};

pub(crate) struct WriterInner {
    pub(crate) filters: Filters,
    pub(crate) converter: EventConverter,
    pub(crate) before_send: Option<BeforeSend>,
    pub(crate) clock: Option<Clock>,
    pub(crate) error_handler: Option<ErrorHandler>,
    pub(crate) flush_timeout: Duration,
    pub(crate) debug: bool,
    pub(crate) debug_sink: DebugSink,
}

impl WriterInner {
    #[allow(dead_code)]
    pub(crate) fn debug_line(&self, args: fmt::Arguments<'_>) {
        if let Ok(mut sink) = self.debug_sink.lock() {
            writeln!(sink, "[sentry-jsonlog] {args}").ok();
        }
    }

    fn now(&self) -> SystemTime {
        match self.clock {
            Some(ref clock) => clock(),
            None => SystemTime::now(),
        }
    }
}

/// Forwards JSON log lines to Sentry.
///
/// Every line written is decoded as one JSON object. Records at one of the
/// configured levels are captured as events, other records can be recorded
/// as breadcrumbs. Writing never fails: the full length of the payload is
/// always reported as written, even when records are dropped.
///
/// The writer is cheap to clone, clones share the same [`Hub`].
///
/// # Examples
///
/// ```
/// use std::io::Write;
///
/// let mut writer = sentry_jsonlog::SentryWriter::new("").unwrap();
/// writeln!(writer, r#"{{"level":"error","message":"connection lost"}}"#).unwrap();
/// writer.close().unwrap();
/// ```
#[derive(Clone)]
pub struct SentryWriter {
    hub: Arc<Hub>,
    inner: Arc<WriterInner>,
}

impl SentryWriter {
    /// Creates a writer with the default options that sends events to the
    /// given DSN.
    ///
    /// See [`WriterOptions::build`].
    pub fn new<D: IntoDsn>(dsn: D) -> Result<Self, Error> {
        WriterOptions::new().build(dsn)
    }

    /// Creates a writer with the default options that sends events to an
    /// existing hub.
    ///
    /// See [`WriterOptions::build_with_hub`].
    pub fn with_hub(hub: Option<Arc<Hub>>) -> Result<Self, Error> {
        WriterOptions::new().build_with_hub(hub)
    }

    /// Returns the options for configuring a writer.
    pub fn options() -> WriterOptions {
        WriterOptions::new()
    }

    pub(crate) fn from_parts(hub: Arc<Hub>, inner: WriterInner) -> Self {
        Self {
            hub,
            inner: Arc::new(inner),
        }
    }

    /// The hub events and breadcrumbs are sent to.
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// The levels captured as events.
    pub fn levels(&self) -> &BTreeSet<LogLevel> {
        &self.inner.filters.levels
    }

    /// Whether records below the event levels are recorded as breadcrumbs.
    pub fn breadcrumbs_enabled(&self) -> bool {
        self.inner.filters.emit_breadcrumbs
    }

    /// The sample rate for events.
    pub fn sample_rate(&self) -> f32 {
        self.inner.filters.sample_rate
    }

    /// Processes every record of a payload, reading the level of each record
    /// from its level field.
    ///
    /// Returns the length of the payload.
    pub fn write_payload(&self, payload: &[u8]) -> usize {
        for line in record::lines(payload) {
            self.process(line, None);
        }
        payload.len()
    }

    /// Processes every record of a payload at the given level, ignoring the
    /// level fields of the records.
    ///
    /// Returns the length of the payload.
    pub fn write_level(&self, level: LogLevel, payload: &[u8]) -> usize {
        for line in record::lines(payload) {
            self.process(line, Some(level));
        }
        payload.len()
    }

    /// Records an event as a breadcrumb on the hub instead of sending it.
    ///
    /// The breadcrumb is attached to events captured later on.
    pub fn add_breadcrumb(&self, event: &Event<'_>) {
        self.hub.add_breadcrumb(breadcrumb_from_event(event));
    }

    /// Waits for pending events to be sent, using the configured flush
    /// timeout.
    ///
    /// The writer stays usable afterwards.
    pub fn close(&self) -> Result<(), Error> {
        self.close_timeout(self.inner.flush_timeout)
    }

    /// Waits up to `timeout` for pending events to be sent.
    pub fn close_timeout(&self, timeout: Duration) -> Result<(), Error> {
        match self.hub.client() {
            Some(client) if !client.flush(Some(timeout)) => {
                writer_debug!(self.inner, "events were not flushed within {:?}", timeout);
                Err(Error::FlushTimeout(timeout))
            }
            _ => Ok(()),
        }
    }

    fn process(&self, line: &[u8], level: Option<LogLevel>) {
        let record = match Record::decode(line) {
            Ok(record) => record,
            Err(err) => return self.report(Error::Decode(err)),
        };
        let level = level.or_else(|| record.level(self.inner.converter.fields()));

        let filter = self.inner.filters.classify(level);
        let sentry_level = match level.and_then(convert_log_level) {
            Some(sentry_level) if filter != RecordFilter::Ignore => sentry_level,
            _ => return,
        };

        let now = self.inner.now();
        match filter {
            RecordFilter::Breadcrumb => {
                let breadcrumb = self
                    .inner
                    .converter
                    .breadcrumb_from_record(record, sentry_level, now);
                self.hub.add_breadcrumb(breadcrumb);
            }
            RecordFilter::Event => {
                let event = self
                    .inner
                    .converter
                    .event_from_record(record, sentry_level, now);
                self.capture(event);
            }
            RecordFilter::Ignore => {}
        }
    }

    fn capture(&self, event: Event<'static>) {
        if !self.inner.filters.should_send(&event) {
            writer_debug!(self.inner, "event {} dropped by filters", event.event_id);
            return;
        }
        let event = match self.inner.before_send {
            Some(ref before_send) => match before_send(event) {
                Some(event) => event,
                None => {
                    writer_debug!(self.inner, "event dropped by before_send");
                    return;
                }
            },
            None => event,
        };
        let event_id = self.hub.capture_event(event);
        writer_debug!(self.inner, "captured event {}", event_id);
    }

    fn report(&self, error: Error) {
        writer_debug!(self.inner, "{}", error);
        if let Some(ref error_handler) = self.inner.error_handler {
            error_handler(&error);
        }
    }
}

impl fmt::Debug for SentryWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentryWriter")
            .field("filters", &self.inner.filters)
            .field("converter", &self.inner.converter)
            .field("flush_timeout", &self.inner.flush_timeout)
            .field("debug", &self.inner.debug)
            .finish_non_exhaustive()
    }
}

impl io::Write for SentryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_payload(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Write for &SentryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_payload(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<SentryWriter>();
    }

    #[test]
    fn uses_injected_clock() {
        let epoch = SystemTime::UNIX_EPOCH;
        let writer = WriterOptions::new().clock(move || epoch).build("").unwrap();
        assert_eq!(writer.inner.now(), epoch);
    }

    #[test]
    fn reports_decode_errors() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let errors = Arc::new(AtomicUsize::new(0));
        let seen = errors.clone();
        let writer = WriterOptions::new()
            .error_handler(move |err| {
                assert!(matches!(err, Error::Decode(_)));
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .build("")
            .unwrap();

        let payload = b"{\"level\":\"error\"\nnot json\n{\"level\":\"info\"}\n";
        assert_eq!(writer.write_payload(payload), payload.len());
        assert_eq!(errors.load(Ordering::SeqCst), 2);
    }
}
