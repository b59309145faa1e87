//! Shared building blocks for the insert benchmark.
//!
//! - [`dataset`]: schema-agnostic in-memory tables and their CSV form
//! - [`synth`]: deterministic synthetic records in the benchmark's fixed shape
//!
//! Logging goes through the `log` facade; binaries call [`initialize_logger`]
//! once at startup.

use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::{pattern::PatternEncoder, Encode},
    filter::threshold::ThresholdFilter,
};
use std::path::Path;
use std::{backtrace, env};

pub mod dataset;
pub mod synth;

const LOGGING_PATTERN: &str = "{d} {l} {f}:{L} - {m}\n";

/// Pattern encoder that appends a captured backtrace to error records when
/// `RUST_BACKTRACE` or `RUST_LIB_BACKTRACE` is set.
#[derive(Debug)]
struct BacktraceEncoder {
    inner: PatternEncoder,
    capture: bool,
}

impl BacktraceEncoder {
    fn boxed() -> Box<Self> {
        Box::new(Self {
            inner: PatternEncoder::new(LOGGING_PATTERN),
            capture: env::var_os("RUST_BACKTRACE").is_some()
                || env::var_os("RUST_LIB_BACKTRACE").is_some(),
        })
    }
}

impl Encode for BacktraceEncoder {
    fn encode(
        &self,
        w: &mut dyn log4rs::encode::Write,
        record: &log::Record<'_>,
    ) -> anyhow::Result<()> {
        if !self.capture || record.level() != log::Level::Error {
            return self.inner.encode(w, record);
        }

        let args = format_args!(
            "{}\nBacktrace:\n{}",
            record.args(),
            backtrace::Backtrace::capture()
        );
        let with_trace = log::Record::builder()
            .args(args)
            .level(record.level())
            .target(record.target())
            .module_path(record.module_path())
            .file(record.file())
            .line(record.line())
            .build();
        self.inner.encode(w, &with_trace)
    }
}

/// Install the global logger: stderr at `level`, plus everything down to
/// trace in `file_path` when one is given.
pub fn initialize_logger(level: LevelFilter, file_path: Option<&Path>) -> anyhow::Result<()> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(BacktraceEncoder::boxed())
        .build();

    let mut builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(level)))
            .build("stderr", Box::new(stderr)),
    );
    let mut root = Root::builder().appender("stderr");
    let mut root_level = level;

    if let Some(path) = file_path {
        let logfile = FileAppender::builder()
            .encoder(BacktraceEncoder::boxed())
            .build(path)?;
        builder = builder.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root = root.appender("logfile");
        root_level = LevelFilter::Trace;
    }

    let config = builder.build(root.build(root_level))?;
    log4rs::init_config(config)?;

    Ok(())
}
