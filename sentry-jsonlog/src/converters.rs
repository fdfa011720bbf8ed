use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sentry_core::protocol::{Event, Exception, Stacktrace, Value};
use sentry_core::{Breadcrumb, Level};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::level::LogLevel;
use crate::record::{FieldNames, Record};

/// The logger reported on events whose record does not name one.
pub const DEFAULT_LOGGER: &str = "jsonlog";

/// The extra field used as breadcrumb category when present.
const CATEGORY_FIELD: &str = "category";

/// Function prefixes of frames that belong to the logging machinery rather
/// than to the code that emitted the record.
const INTERNAL_FRAME_PREFIXES: &[&str] = &[
    "backtrace::",
    "sentry_backtrace::",
    "sentry_jsonlog::",
    "<sentry_jsonlog::",
    "<&sentry_jsonlog::",
    "tracing_subscriber::",
    "<tracing_subscriber::",
    "tracing_core::",
    "<tracing_core::",
    "tracing::",
    "std::io::",
    "<std::io::",
];

/// Converts a [`LogLevel`] to a Sentry [`Level`].
///
/// Returns `None` for levels that have no Sentry counterpart.
pub fn convert_log_level(level: LogLevel) -> Option<Level> {
    match level {
        LogLevel::Trace | LogLevel::Debug => Some(Level::Debug),
        LogLevel::Info => Some(Level::Info),
        LogLevel::Warn => Some(Level::Warning),
        LogLevel::Error => Some(Level::Error),
        LogLevel::Fatal | LogLevel::Panic => Some(Level::Fatal),
        LogLevel::NoLevel | LogLevel::Disabled => None,
    }
}

/// Builds Sentry events out of decoded [`Record`]s.
#[derive(Debug, Clone)]
pub struct EventConverter {
    fields: FieldNames,
    attach_stacktrace: bool,
}

impl Default for EventConverter {
    fn default() -> Self {
        Self::new(FieldNames::default())
    }
}

impl EventConverter {
    /// Creates a converter for records with the given field names.
    pub fn new(fields: FieldNames) -> Self {
        Self {
            fields,
            attach_stacktrace: false,
        }
    }

    /// Attaches the stacktrace of the logging call site to exceptions.
    #[must_use]
    pub fn attach_stacktrace(mut self, attach_stacktrace: bool) -> Self {
        self.attach_stacktrace = attach_stacktrace;
        self
    }

    /// The field names this converter reads.
    pub fn fields(&self) -> &FieldNames {
        &self.fields
    }

    /// Creates an [`Event`] from a [`Record`].
    ///
    /// `now` is used as the event timestamp when the record does not carry a
    /// usable one. Fields that are not turned into event attributes are kept
    /// in `extra`.
    pub fn event_from_record(
        &self,
        record: Record,
        level: Level,
        now: SystemTime,
    ) -> Event<'static> {
        self.build_event(record, level, now, self.attach_stacktrace)
    }

    /// Creates a [`Breadcrumb`] from a [`Record`].
    ///
    /// This never resolves a stacktrace. Breadcrumbs have no exceptions, so
    /// the error is kept in the breadcrumb data.
    pub fn breadcrumb_from_record(
        &self,
        record: Record,
        level: Level,
        now: SystemTime,
    ) -> Breadcrumb {
        let event = self.build_event(record, level, now, false);
        let mut breadcrumb = breadcrumb_from_event(&event);
        if let Some(error) = event.exception.first().and_then(|e| e.value.clone()) {
            breadcrumb
                .data
                .insert(self.fields.error.to_string(), Value::String(error));
        }
        breadcrumb
    }

    fn build_event(
        &self,
        mut record: Record,
        level: Level,
        now: SystemTime,
        attach_stacktrace: bool,
    ) -> Event<'static> {
        let fields = &self.fields;
        record.remove(&fields.level);

        let timestamp = match record.get(&fields.timestamp).and_then(parse_timestamp) {
            Some(timestamp) => {
                record.remove(&fields.timestamp);
                timestamp
            }
            None => now,
        };

        let logger = match record.remove(&fields.logger) {
            Some(Value::String(logger)) => logger,
            Some(other) => {
                record.insert(fields.logger.to_string(), other);
                DEFAULT_LOGGER.to_owned()
            }
            None => DEFAULT_LOGGER.to_owned(),
        };

        let message = record
            .remove(&fields.message)
            .map(value_to_string)
            .unwrap_or_default();

        let exception = match record.remove(&fields.error) {
            Some(error) => vec![exception_from_value(error, &logger, attach_stacktrace)],
            None => Vec::new(),
        };

        Event {
            timestamp,
            logger: Some(logger),
            level,
            message: Some(message),
            exception: exception.into(),
            extra: record.into_fields(),
            ..Default::default()
        }
    }
}

/// Creates a [`Breadcrumb`] from an [`Event`] built by the [`EventConverter`].
///
/// The breadcrumb carries the same message, level and extra data as the
/// event would have.
pub fn breadcrumb_from_event(event: &Event<'_>) -> Breadcrumb {
    let category = match event.extra.get(CATEGORY_FIELD) {
        Some(Value::String(category)) => Some(category.clone()),
        _ => event.logger.clone(),
    };

    Breadcrumb {
        timestamp: event.timestamp,
        ty: event.level.to_string(),
        category,
        level: event.level,
        message: event.message.clone(),
        data: event.extra.clone(),
        ..Default::default()
    }
}

fn exception_from_value(error: Value, ty: &str, attach_stacktrace: bool) -> Exception {
    Exception {
        ty: ty.to_owned(),
        value: Some(value_to_string(error)),
        stacktrace: if attach_stacktrace {
            current_stacktrace()
        } else {
            None
        },
        ..Default::default()
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Times before the unix epoch are rejected, sentry cannot serialize them.
fn parse_timestamp(value: &Value) -> Option<SystemTime> {
    let timestamp = match value {
        Value::String(s) => OffsetDateTime::parse(s, &Rfc3339).ok().map(SystemTime::from)?,
        Value::Number(n) => {
            let secs = Duration::try_from_secs_f64(n.as_f64()?).ok()?;
            UNIX_EPOCH.checked_add(secs)?
        }
        _ => return None,
    };
    if timestamp < UNIX_EPOCH {
        return None;
    }
    Some(timestamp)
}

fn current_stacktrace() -> Option<Stacktrace> {
    let mut stacktrace = sentry_backtrace::current_stacktrace()?;
    // frames are ordered oldest first, the logging machinery sits at the end
    while let Some(frame) = stacktrace.frames.last() {
        let internal = frame.function.as_deref().map_or(true, |function| {
            INTERNAL_FRAME_PREFIXES
                .iter()
                .any(|prefix| function.starts_with(prefix))
        });
        if !internal {
            break;
        }
        stacktrace.frames.pop();
    }
    if stacktrace.frames.is_empty() {
        None
    } else {
        Some(stacktrace)
    }
}
