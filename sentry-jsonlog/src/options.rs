use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use regex::RegexSet;
use sentry_core::protocol::Event;
use sentry_core::{Client, Hub, IntoDsn, Scope, TransportFactory};

use crate::client::client_options;
use crate::converters::EventConverter;
use crate::error::Error;
use crate::filters::{Filters, DEFAULT_LEVELS};
use crate::level::LogLevel;
use crate::record::FieldNames;
use crate::writer::{SentryWriter, WriterInner};

/// Callback invoked with every event right before it is captured.
///
/// Returning `None` drops the event.
pub type BeforeSend = Arc<dyn Fn(Event<'static>) -> Option<Event<'static>> + Send + Sync>;

/// Callback invoked with errors that happen while writing, such as log
/// records that are not valid JSON.
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Source of the timestamp for records that do not carry one.
pub type Clock = Arc<dyn Fn() -> SystemTime + Send + Sync>;

pub(crate) type DebugSink = Arc<Mutex<dyn io::Write + Send>>;

/// Configures and builds a [`SentryWriter`].
///
/// # Examples
///
/// ```
/// use sentry_jsonlog::{LogLevel, WriterOptions};
///
/// let writer = WriterOptions::new()
///     .levels([LogLevel::Warn, LogLevel::Error, LogLevel::Fatal])
///     .breadcrumbs(true)
///     .environment("staging")
///     .build("")
///     .unwrap();
///
/// assert!(writer.breadcrumbs_enabled());
/// ```
#[must_use]
pub struct WriterOptions {
    pub(crate) levels: BTreeSet<LogLevel>,
    pub(crate) breadcrumbs: bool,
    pub(crate) sample_rate: f32,
    pub(crate) release: Option<Cow<'static, str>>,
    pub(crate) environment: Option<Cow<'static, str>>,
    pub(crate) server_name: Option<Cow<'static, str>>,
    pub(crate) ignore_errors: Vec<String>,
    pub(crate) before_send: Option<BeforeSend>,
    pub(crate) debug: bool,
    pub(crate) tracing: bool,
    pub(crate) traces_sample_rate: Option<f32>,
    #[cfg(feature = "transport")]
    pub(crate) http_client: Option<reqwest::Client>,
    #[cfg(feature = "transport")]
    pub(crate) ca_certs: Vec<reqwest::Certificate>,
    pub(crate) http_proxy: Option<Cow<'static, str>>,
    pub(crate) https_proxy: Option<Cow<'static, str>>,
    pub(crate) transport: Option<Arc<dyn TransportFactory>>,
    pub(crate) debug_writer: Option<DebugSink>,
    pub(crate) flush_timeout: Duration,
    pub(crate) field_names: FieldNames,
    pub(crate) clock: Option<Clock>,
    pub(crate) error_handler: Option<ErrorHandler>,
    pub(crate) attach_stacktrace: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS.into_iter().collect(),
            breadcrumbs: false,
            sample_rate: 1.0,
            release: None,
            environment: None,
            server_name: None,
            ignore_errors: Vec::new(),
            before_send: None,
            debug: false,
            tracing: false,
            traces_sample_rate: None,
            #[cfg(feature = "transport")]
            http_client: None,
            #[cfg(feature = "transport")]
            ca_certs: Vec::new(),
            http_proxy: None,
            https_proxy: None,
            transport: None,
            debug_writer: None,
            flush_timeout: Duration::from_secs(3),
            field_names: FieldNames::default(),
            clock: None,
            error_handler: None,
            attach_stacktrace: true,
        }
    }
}

impl WriterOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the levels that are captured as events.
    /// (defaults to `error`, `fatal` and `panic`)
    ///
    /// Records of other levels are recorded as breadcrumbs if
    /// [`breadcrumbs`](Self::breadcrumbs) is enabled, and dropped otherwise.
    pub fn levels<I>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = LogLevel>,
    {
        self.levels = levels.into_iter().collect();
        self
    }

    /// Records non-event records as breadcrumbs. (defaults to `false`)
    pub fn breadcrumbs(mut self, breadcrumbs: bool) -> Self {
        self.breadcrumbs = breadcrumbs;
        self
    }

    /// Sets the sample rate for events. (0.0 - 1.0, defaults to 1.0)
    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Sets the release to be sent with events.
    pub fn release(mut self, release: impl Into<Cow<'static, str>>) -> Self {
        self.release = Some(release.into());
        self
    }

    /// Sets the environment to be sent with events.
    pub fn environment(mut self, environment: impl Into<Cow<'static, str>>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Sets the server name to be sent with events.
    pub fn server_name(mut self, server_name: impl Into<Cow<'static, str>>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }

    /// Drops events whose message or error matches one of these regular
    /// expressions.
    pub fn ignore_errors<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_errors = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets a callback that can modify or drop events right before they are
    /// captured.
    pub fn before_send<F>(mut self, before_send: F) -> Self
    where
        F: Fn(Event<'static>) -> Option<Event<'static>> + Send + Sync + 'static,
    {
        self.before_send = Some(Arc::new(before_send));
        self
    }

    /// Prints diagnostics of the writer and the client. (defaults to `false`)
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Enables performance tracing on the client. (defaults to `false`)
    pub fn tracing(mut self, tracing: bool) -> Self {
        self.tracing = tracing;
        self
    }

    /// Sets the sample rate for traces. (0.0 - 1.0, defaults to 1.0 once
    /// [`tracing`](Self::tracing) is enabled)
    pub fn traces_sample_rate(mut self, traces_sample_rate: f32) -> Self {
        self.traces_sample_rate = Some(traces_sample_rate);
        self
    }

    /// Sends events through the given HTTP client.
    ///
    /// The proxies and root certificates configured on these options are
    /// not applied to a client given here.
    #[cfg(feature = "transport")]
    pub fn http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Trusts these root certificates in addition to the system ones.
    #[cfg(feature = "transport")]
    pub fn ca_certs<I>(mut self, ca_certs: I) -> Self
    where
        I: IntoIterator<Item = reqwest::Certificate>,
    {
        self.ca_certs = ca_certs.into_iter().collect();
        self
    }

    /// Sends plain HTTP requests through this proxy.
    pub fn http_proxy(mut self, http_proxy: impl Into<Cow<'static, str>>) -> Self {
        self.http_proxy = Some(http_proxy.into());
        self
    }

    /// Sends HTTPS requests through this proxy.
    pub fn https_proxy(mut self, https_proxy: impl Into<Cow<'static, str>>) -> Self {
        self.https_proxy = Some(https_proxy.into());
        self
    }

    /// Sets the transport of the client, replacing the HTTP transport.
    pub fn transport<F>(mut self, transport: F) -> Self
    where
        F: TransportFactory + 'static,
    {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets where the diagnostics of the writer are written to.
    /// (defaults to stderr)
    ///
    /// This only covers the messages of the writer itself. The debug output
    /// of the sentry client enabled by [`debug`](Self::debug) always goes to
    /// stderr.
    pub fn debug_writer<W>(mut self, debug_writer: W) -> Self
    where
        W: io::Write + Send + 'static,
    {
        self.debug_writer = Some(Arc::new(Mutex::new(debug_writer)));
        self
    }

    /// Sets how long [`SentryWriter::close`] waits for pending events.
    /// (defaults to 3 seconds)
    pub fn flush_timeout(mut self, flush_timeout: Duration) -> Self {
        self.flush_timeout = flush_timeout;
        self
    }

    /// Sets the names of the fields the writer reads from log records.
    pub fn field_names(mut self, field_names: FieldNames) -> Self {
        self.field_names = field_names;
        self
    }

    /// Sets the clock used for records without a timestamp.
    /// (defaults to [`SystemTime::now`])
    pub fn clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> SystemTime + Send + Sync + 'static,
    {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Sets a callback for errors that happen while writing.
    pub fn error_handler<F>(mut self, error_handler: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(error_handler));
        self
    }

    /// Attaches the stacktrace of the logging call site to exceptions.
    /// (expensive, defaults to `true`)
    pub fn attach_stacktrace(mut self, attach_stacktrace: bool) -> Self {
        self.attach_stacktrace = attach_stacktrace;
        self
    }

    /// Builds a writer that sends events to the given DSN.
    ///
    /// An empty DSN creates a disabled writer: records are processed but
    /// nothing is delivered.
    pub fn build<D: IntoDsn>(self, dsn: D) -> Result<SentryWriter, Error> {
        self.validate()?;
        let dsn = dsn.into_dsn()?;
        let options = client_options(&self, dsn)?;
        let client = Arc::new(Client::from(options));
        let hub = Arc::new(Hub::new(Some(client), Arc::new(Scope::default())));
        self.into_writer(hub)
    }

    /// Builds a writer that sends events to an existing hub.
    ///
    /// The client settings of these options are not applied to the hub.
    pub fn build_with_hub(self, hub: Option<Arc<Hub>>) -> Result<SentryWriter, Error> {
        let hub = hub.ok_or(Error::MissingHub)?;
        self.validate()?;
        self.into_writer(hub)
    }

    fn validate(&self) -> Result<(), Error> {
        for rate in std::iter::once(self.sample_rate).chain(self.traces_sample_rate) {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::InvalidSampleRate(rate));
            }
        }
        Ok(())
    }

    fn into_writer(self, hub: Arc<Hub>) -> Result<SentryWriter, Error> {
        let ignore_errors = if self.ignore_errors.is_empty() {
            None
        } else {
            Some(RegexSet::new(&self.ignore_errors)?)
        };
        let filters = Filters {
            levels: self.levels,
            emit_breadcrumbs: self.breadcrumbs,
            sample_rate: self.sample_rate,
            ignore_errors,
        };
        let converter = EventConverter::new(self.field_names)
            .attach_stacktrace(self.attach_stacktrace);
        let debug_sink = self
            .debug_writer
            .unwrap_or_else(|| Arc::new(Mutex::new(io::stderr())));

        Ok(SentryWriter::from_parts(
            hub,
            WriterInner {
                filters,
                converter,
                before_send: self.before_send,
                clock: self.clock,
                error_handler: self.error_handler,
                flush_timeout: self.flush_timeout,
                debug: self.debug,
                debug_sink,
            },
        ))
    }
}

impl fmt::Debug for WriterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[derive(Debug)]
        struct Callback;
        let before_send = self.before_send.as_ref().map(|_| Callback);
        let clock = self.clock.as_ref().map(|_| Callback);
        let error_handler = self.error_handler.as_ref().map(|_| Callback);
        #[derive(Debug)]
        struct TransportFactory;
        let transport = self.transport.as_ref().map(|_| TransportFactory);
        #[derive(Debug)]
        struct DebugWriter;
        let debug_writer = self.debug_writer.as_ref().map(|_| DebugWriter);

        let mut s = f.debug_struct("WriterOptions");
        s.field("levels", &self.levels)
            .field("breadcrumbs", &self.breadcrumbs)
            .field("sample_rate", &self.sample_rate)
            .field("release", &self.release)
            .field("environment", &self.environment)
            .field("server_name", &self.server_name)
            .field("ignore_errors", &self.ignore_errors)
            .field("before_send", &before_send)
            .field("debug", &self.debug)
            .field("tracing", &self.tracing)
            .field("traces_sample_rate", &self.traces_sample_rate);
        #[cfg(feature = "transport")]
        s.field("http_client", &self.http_client)
            .field("ca_certs", &self.ca_certs.len());
        s.field("http_proxy", &self.http_proxy)
            .field("https_proxy", &self.https_proxy)
            .field("transport", &transport)
            .field("debug_writer", &debug_writer)
            .field("flush_timeout", &self.flush_timeout)
            .field("field_names", &self.field_names)
            .field("clock", &clock)
            .field("error_handler", &error_handler)
            .field("attach_stacktrace", &self.attach_stacktrace)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_sample_rates() {
        for rate in [-0.1, 1.5, f32::NAN] {
            let err = WriterOptions::new().sample_rate(rate).build("").unwrap_err();
            assert!(matches!(err, Error::InvalidSampleRate(_)));
        }
        let err = WriterOptions::new()
            .tracing(true)
            .traces_sample_rate(2.0)
            .build("")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSampleRate(r) if r == 2.0));
    }

    #[test]
    fn rejects_invalid_ignore_patterns() {
        let err = WriterOptions::new()
            .ignore_errors(["(unclosed"])
            .build("")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidIgnorePattern(_)));
    }

    #[test]
    fn missing_hub() {
        let err = WriterOptions::new().build_with_hub(None).unwrap_err();
        assert!(matches!(err, Error::MissingHub));
        assert_eq!(err.to_string(), "hub cannot be None");
    }

    #[test]
    fn debug_hides_callbacks() {
        let options = WriterOptions::new().before_send(Some).debug(true);
        let debug = format!("{options:?}");
        assert!(debug.contains("before_send: Some(Callback)"));
        assert!(debug.contains("debug: true"));
    }
}
