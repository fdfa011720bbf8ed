/// Prints a diagnostic line to the debug sink of a writer if debugging is on.
///
/// With the `debug-logs` feature the line goes to the `log` crate instead,
/// independently of the debug flag.
macro_rules! writer_debug {
    ($inner:expr, $($arg:tt)*) => {{
        #[cfg(feature = "debug-logs")]
        {
            let _ = &$inner;
            ::log::debug!(target: "sentry_jsonlog", $($arg)*);
        }
        #[cfg(not(feature = "debug-logs"))]
        {
            let inner: &$crate::writer::WriterInner = &$inner;
            if inner.debug {
                inner.debug_line(format_args!($($arg)*));
            }
        }
    }};
}
