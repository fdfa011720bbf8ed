use std::io;

use tracing_core::Metadata;
use tracing_subscriber::fmt::MakeWriter;

use crate::level::LogLevel;
use crate::writer::SentryWriter;

/// The [`io::Write`] handed out to `tracing-subscriber` for a single event.
///
/// It carries the level of the event, so records are classified even when
/// the formatter omits the level field.
#[derive(Debug)]
pub struct LevelWriter<'a> {
    writer: &'a SentryWriter,
    level: Option<LogLevel>,
}

impl io::Write for LevelWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(match self.level {
            Some(level) => self.writer.write_level(level, buf),
            None => self.writer.write_payload(buf),
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Lets a [`SentryWriter`] be used with `tracing_subscriber::fmt().json()`.
///
/// # Examples
///
/// ```
/// use sentry_jsonlog::{FieldNames, WriterOptions};
///
/// let writer = WriterOptions::new()
///     .field_names(FieldNames::tracing_json())
///     .build("")
///     .unwrap();
///
/// let subscriber = tracing_subscriber::fmt()
///     .json()
///     .flatten_event(true)
///     .with_writer(writer)
///     .finish();
/// # drop(subscriber);
/// ```
impl<'a> MakeWriter<'a> for SentryWriter {
    type Writer = LevelWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LevelWriter {
            writer: self,
            level: None,
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        LevelWriter {
            writer: self,
            level: Some((*meta.level()).into()),
        }
    }
}
