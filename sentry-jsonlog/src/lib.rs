//! A Sentry sink for structured loggers that write JSON lines.
//!
//! The [`SentryWriter`] implements [`std::io::Write`]. Every line written to
//! it is decoded as one JSON object, the level field decides whether the
//! record is captured as an event, recorded as a breadcrumb, or ignored. All
//! fields that are not turned into event attributes end up in the `extra`
//! data of the event.
//!
//! By default records at the `error`, `fatal` and `panic` levels are captured
//! as events and everything else is ignored.
//!
//! # Examples
//!
//! ```
//! use std::io::Write;
//!
//! use sentry_jsonlog::{LogLevel, SentryWriter};
//!
//! let mut writer = SentryWriter::options()
//!     .levels([LogLevel::Error, LogLevel::Fatal])
//!     .breadcrumbs(true)
//!     .release("my-app@1.0.0")
//!     // an empty DSN disables sending
//!     .build("")
//!     .unwrap();
//!
//! // recorded as a breadcrumb
//! writeln!(writer, r#"{{"level":"info","message":"connecting","host":"db-1"}}"#).unwrap();
//! // captured as an event, with `host` as extra data
//! writeln!(
//!     writer,
//!     r#"{{"level":"error","message":"query failed","error":"connection reset","host":"db-1"}}"#
//! )
//! .unwrap();
//!
//! writer.close().unwrap();
//! ```
//!
//! # Record layout
//!
//! The well-known fields are named by [`FieldNames`]:
//!
//! | field     | default   | becomes                                |
//! |-----------|-----------|----------------------------------------|
//! | level     | `level`   | the event level                        |
//! | timestamp | `time`    | the event timestamp (RFC 3339 or unix) |
//! | message   | `message` | the event message                      |
//! | logger    | `logger`  | the event logger                       |
//! | error     | `error`   | the exception of the event             |
//!
//! The error field always becomes a single exception. Values that are not
//! strings are reported as their JSON text.
//!
//! # Usage with `tracing`
//!
//! With the `tracing` feature the writer can be passed to the JSON formatter
//! of `tracing-subscriber`. The level of each event is then taken from the
//! `tracing` metadata.
//!
//! # Features
//!
//! * `transport` (default): sends events over HTTP using `reqwest` and
//!   `native-tls`.
//! * `rustls`: uses `rustls` instead of `native-tls`.
//! * `tracing`: implements `tracing_subscriber::fmt::MakeWriter`.
//! * `debug-logs`: writes diagnostics through the `log` crate instead of
//!   stderr.

#![doc(html_favicon_url = "https://sentry-brand.storage.googleapis.com/favicon.ico")]
#![doc(html_logo_url = "https://sentry-brand.storage.googleapis.com/sentry-glyph-black.png")]
#![warn(missing_docs)]
#![deny(unsafe_code)]

#[macro_use]
mod macros;

mod client;
mod converters;
mod error;
mod filters;
mod level;
#[cfg(feature = "tracing")]
mod make_writer;
mod options;
mod record;
mod writer;

pub use converters::{breadcrumb_from_event, convert_log_level, EventConverter, DEFAULT_LOGGER};
pub use error::Error;
pub use filters::{Filters, RecordFilter, DEFAULT_LEVELS};
pub use level::{LogLevel, ParseLogLevelError};
#[cfg(feature = "tracing")]
pub use make_writer::LevelWriter;
pub use options::{BeforeSend, Clock, ErrorHandler, WriterOptions};
pub use record::{FieldNames, Record};
pub use writer::SentryWriter;
