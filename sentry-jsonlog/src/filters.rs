use std::collections::BTreeSet;

use rand::random;
use regex::RegexSet;
use sentry_core::protocol::Event;

use crate::converters::convert_log_level;
use crate::level::LogLevel;

/// The action the writer performs for a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFilter {
    /// Ignore the record.
    Ignore,
    /// Add a [`Breadcrumb`](sentry_core::Breadcrumb) for the record to the
    /// current scope.
    Breadcrumb,
    /// Capture an [`Event`] for the record.
    Event,
}

/// The levels for which events are captured by default.
pub const DEFAULT_LEVELS: [LogLevel; 3] = [LogLevel::Error, LogLevel::Fatal, LogLevel::Panic];

/// Decides what happens to each record.
#[derive(Debug, Clone)]
pub struct Filters {
    pub(crate) levels: BTreeSet<LogLevel>,
    pub(crate) emit_breadcrumbs: bool,
    pub(crate) sample_rate: f32,
    pub(crate) ignore_errors: Option<RegexSet>,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS.into_iter().collect(),
            emit_breadcrumbs: false,
            sample_rate: 1.0,
            ignore_errors: None,
        }
    }
}

impl Filters {
    /// Classifies a record by its level.
    ///
    /// `None` stands for a level that could not be recognized. Records whose
    /// level has no Sentry counterpart are always ignored, even when their
    /// level is part of the configured set.
    pub fn classify(&self, level: Option<LogLevel>) -> RecordFilter {
        let level = match level {
            Some(level) if convert_log_level(level).is_some() => level,
            _ => return RecordFilter::Ignore,
        };
        if self.levels.contains(&level) {
            RecordFilter::Event
        } else if self.emit_breadcrumbs {
            RecordFilter::Breadcrumb
        } else {
            RecordFilter::Ignore
        }
    }

    /// Checks whether a built event should be captured.
    ///
    /// Events matching one of the ignore patterns are dropped, the remaining
    /// ones are sampled.
    pub fn should_send(&self, event: &Event<'_>) -> bool {
        !self.is_ignored(event) && sample_should_send(self.sample_rate)
    }

    fn is_ignored(&self, event: &Event<'_>) -> bool {
        let Some(ref patterns) = self.ignore_errors else {
            return false;
        };
        event
            .message
            .iter()
            .chain(event.exception.iter().filter_map(|e| e.value.as_ref()))
            .any(|text| patterns.is_match(text))
    }
}

fn sample_should_send(rate: f32) -> bool {
    if rate >= 1.0 {
        true
    } else if rate <= 0.0 {
        false
    } else {
        random::<f32>() < rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentry_core::protocol::Exception;

    fn filters(levels: &[LogLevel], emit_breadcrumbs: bool) -> Filters {
        Filters {
            levels: levels.iter().copied().collect(),
            emit_breadcrumbs,
            ..Default::default()
        }
    }

    #[test]
    fn test_filters() {
        let default = Filters::default();
        assert_eq!(default.classify(Some(LogLevel::Error)), RecordFilter::Event);
        assert_eq!(default.classify(Some(LogLevel::Fatal)), RecordFilter::Event);
        assert_eq!(default.classify(Some(LogLevel::Panic)), RecordFilter::Event);
        assert_eq!(default.classify(Some(LogLevel::Warn)), RecordFilter::Ignore);
        assert_eq!(default.classify(Some(LogLevel::Trace)), RecordFilter::Ignore);

        let breadcrumbs = filters(&DEFAULT_LEVELS, true);
        assert_eq!(breadcrumbs.classify(Some(LogLevel::Info)), RecordFilter::Breadcrumb);
        assert_eq!(breadcrumbs.classify(Some(LogLevel::Trace)), RecordFilter::Breadcrumb);
        assert_eq!(breadcrumbs.classify(Some(LogLevel::Error)), RecordFilter::Event);

        let fatal_only = filters(&[LogLevel::Fatal], true);
        assert_eq!(fatal_only.classify(Some(LogLevel::Error)), RecordFilter::Breadcrumb);
        assert_eq!(fatal_only.classify(Some(LogLevel::Fatal)), RecordFilter::Event);
    }

    #[test]
    fn unmapped_levels_are_ignored() {
        let filters = filters(&[LogLevel::NoLevel, LogLevel::Disabled, LogLevel::Error], true);
        assert_eq!(filters.classify(None), RecordFilter::Ignore);
        assert_eq!(filters.classify(Some(LogLevel::NoLevel)), RecordFilter::Ignore);
        assert_eq!(filters.classify(Some(LogLevel::Disabled)), RecordFilter::Ignore);
    }

    #[test]
    fn sampling_bounds() {
        let event = Event::default();
        let never = Filters {
            sample_rate: 0.0,
            ..Default::default()
        };
        let always = Filters {
            sample_rate: 1.0,
            ..Default::default()
        };
        for _ in 0..100 {
            assert!(!never.should_send(&event));
            assert!(always.should_send(&event));
        }
    }

    #[test]
    fn ignores_matching_errors() {
        let filters = Filters {
            ignore_errors: Some(RegexSet::new(["timeout", "connection refused"]).unwrap()),
            ..Default::default()
        };

        let by_message = Event {
            message: Some("upstream timeout".into()),
            ..Default::default()
        };
        assert!(!filters.should_send(&by_message));

        let by_exception = Event {
            message: Some("request failed".into()),
            exception: vec![Exception {
                value: Some("dial tcp: connection refused".into()),
                ..Default::default()
            }]
            .into(),
            ..Default::default()
        };
        assert!(!filters.should_send(&by_exception));

        let unrelated = Event {
            message: Some("disk full".into()),
            ..Default::default()
        };
        assert!(filters.should_send(&unrelated));
    }
}
