// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Console output of the forwarder itself.
//!
//! Lines look like:
//!
//! ```text
//! [2024-05-01 12:00:00.123] [INFO] - CLOUDWATCH | Shipping to log stream 'web-1' in group 'app'
//! [2024-05-01 12:00:03.456] [WARN] - CLOUDWATCH | Can't deliver logs. Retry: #2. Error: ...
//! ```
//!
//! The subscriber is installed once, at process start, by [`init`].

use std::fmt;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Formats events as `[timestamp] [LEVEL] - message`.
#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        write!(
            &mut writer,
            "[{}] [{}] - ",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            metadata.level()
        )?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Filter directive for `log_level`, silencing the HTTP stack and keeping
/// only warnings from the AWS SDK.
pub fn env_filter_directive(log_level: &str) -> String {
    format!(
        "h2=off,hyper=off,hyper_util=off,rustls=off,aws_smithy_runtime=warn,aws_sdk_cloudwatchlogs=warn,{log_level}"
    )
}

/// Installs the console subscriber as the global default.
pub fn init(log_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_new(env_filter_directive(log_level))?)
        .with_writer(std::io::stdout)
        .event_format(Formatter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::fmt::Subscriber::builder()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .event_format(Formatter)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_format_level_and_message() {
        let output = capture(|| tracing::warn!("CLOUDWATCH | Can't deliver logs"));

        assert!(output.starts_with('['));
        assert!(output.ends_with("] [WARN] - CLOUDWATCH | Can't deliver logs\n"));
    }

    #[test]
    fn test_format_includes_span_fields() {
        let output = capture(|| {
            let span = tracing::info_span!("put_line", attempt = 2);
            let _guard = span.enter();
            tracing::info!("retrying");
        });

        assert!(output.contains("] [INFO] - put_line{attempt=2}: retrying"));
    }

    #[test]
    fn test_env_filter_directive() {
        let directive = env_filter_directive("debug");
        assert!(directive.ends_with(",debug"));
        assert!(EnvFilter::try_new(directive).is_ok());
    }
}
