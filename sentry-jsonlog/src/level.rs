use std::fmt;
use std::str::FromStr;

/// The severity of a log record as written by the structured logger.
///
/// This is the *source* taxonomy. It is translated into a Sentry
/// [`Level`](sentry_core::Level) by [`convert_log_level`](crate::convert_log_level).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Very verbose diagnostics.
    Trace,
    /// Debug information.
    Debug,
    /// Informational messages.
    Info,
    /// A warning.
    Warn,
    /// An error.
    Error,
    /// An error after which the application is going to exit.
    Fatal,
    /// An error after which the application is going to panic.
    Panic,
    /// The record carried no level at all.
    NoLevel,
    /// Logging was explicitly disabled for the record.
    Disabled,
}

/// Error returned when a level string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized log level `{0}`")]
pub struct ParseLogLevelError(String);

impl LogLevel {
    /// The canonical lowercase name of the level.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
            LogLevel::Panic => "panic",
            LogLevel::NoLevel => "",
            LogLevel::Disabled => "disabled",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<LogLevel, Self::Err> {
        let level = match s.trim() {
            "" => LogLevel::NoLevel,
            s if s.eq_ignore_ascii_case("trace") => LogLevel::Trace,
            s if s.eq_ignore_ascii_case("debug") => LogLevel::Debug,
            s if s.eq_ignore_ascii_case("info") => LogLevel::Info,
            s if s.eq_ignore_ascii_case("warn") || s.eq_ignore_ascii_case("warning") => {
                LogLevel::Warn
            }
            s if s.eq_ignore_ascii_case("error") => LogLevel::Error,
            s if s.eq_ignore_ascii_case("fatal") => LogLevel::Fatal,
            s if s.eq_ignore_ascii_case("panic") => LogLevel::Panic,
            s if s.eq_ignore_ascii_case("disabled") => LogLevel::Disabled,
            other => return Err(ParseLogLevelError(other.to_owned())),
        };
        Ok(level)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "tracing")]
impl From<tracing_core::Level> for LogLevel {
    fn from(level: tracing_core::Level) -> LogLevel {
        match level {
            tracing_core::Level::TRACE => LogLevel::Trace,
            tracing_core::Level::DEBUG => LogLevel::Debug,
            tracing_core::Level::INFO => LogLevel::Info,
            tracing_core::Level::WARN => LogLevel::Warn,
            tracing_core::Level::ERROR => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("trace", LogLevel::Trace)]
    #[case("debug", LogLevel::Debug)]
    #[case("info", LogLevel::Info)]
    #[case("warn", LogLevel::Warn)]
    #[case("warning", LogLevel::Warn)]
    #[case("ERROR", LogLevel::Error)]
    #[case("Fatal", LogLevel::Fatal)]
    #[case("panic", LogLevel::Panic)]
    #[case("", LogLevel::NoLevel)]
    #[case("disabled", LogLevel::Disabled)]
    fn parses_known_levels(#[case] input: &str, #[case] expected: LogLevel) {
        assert_eq!(input.parse::<LogLevel>(), Ok(expected));
    }

    #[rstest]
    #[case("unknown")]
    #[case("err")]
    #[case("99")]
    fn rejects_unknown_levels(#[case] input: &str) {
        assert!(input.parse::<LogLevel>().is_err());
    }

    #[test]
    fn display_roundtrips_through_from_str() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Fatal,
            LogLevel::Panic,
            LogLevel::NoLevel,
            LogLevel::Disabled,
        ] {
            assert_eq!(level.to_string().parse::<LogLevel>(), Ok(level));
        }
    }
}
