//! Console and file logging for the `carbon` binary.
//!
//! Records always go to stderr so they never interleave with the
//! questionnaire on stdout. A log file can be attached once the
//! configuration is known.

use anyhow::{Context, Result};
use chrono::Local;
use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

use crate::config::LoggingConfig;

// --- Formatter ---

/// `<local timestamp> <LEVEL> <target> <fields>`, colored when the writer
/// supports ANSI escapes.
struct LocalFmt;

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "1;31",
        Level::WARN => "1;33",
        Level::INFO => "1;32",
        Level::DEBUG => "1;34",
        Level::TRACE => "1;35",
    }
}

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let stamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");

        if writer.has_ansi_escapes() {
            write!(
                writer,
                "\x1b[2m{stamp}\x1b[0m \x1b[{}m{:>5}\x1b[0m \x1b[36m{}\x1b[0m ",
                level_color(meta.level()),
                meta.level(),
                meta.target()
            )?;
        } else {
            write!(writer, "{stamp} {:>5} {} ", meta.level(), meta.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// --- Late-bound file writer ---

type SharedFile = Arc<Mutex<Option<File>>>;

/// Writes to the attached log file, or nowhere while none is attached.
#[derive(Clone)]
struct FileSlot(SharedFile);

struct SlotWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for SlotWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match self.0.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), File::flush)
    }
}

impl<'a> MakeWriter<'a> for FileSlot {
    type Writer = SlotWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SlotWriter(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// --- Handle ---

/// The installed global subscriber. Dropping it closes the log file.
pub struct Logging {
    filter: reload::Handle<EnvFilter, Registry>,
    file: SharedFile,
}

impl Logging {
    /// Installs the global subscriber. `RUST_LOG` takes precedence over
    /// `default_filter`. Fails if a subscriber is already installed.
    pub fn init(default_filter: &str) -> Result<Self> {
        let initial = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter))
            .with_context(|| format!("invalid log filter '{default_filter}'"))?;
        let (filter_layer, filter) = reload::Layer::new(initial);
        let file: SharedFile = Arc::new(Mutex::new(None));

        let console = tracing_subscriber::fmt::layer()
            .event_format(LocalFmt)
            .with_ansi(io::stderr().is_terminal())
            .with_writer(io::stderr);
        let to_file = tracing_subscriber::fmt::layer()
            .event_format(LocalFmt)
            .with_ansi(false)
            .with_writer(FileSlot(file.clone()));

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(console)
            .with(to_file)
            .try_init()
            .context("logging already initialized")?;

        Ok(Self { filter, file })
    }

    /// Applies the `[logging]` section. The level is skipped when
    /// `RUST_LOG` is set.
    pub fn apply(
        &self,
        config: &LoggingConfig,
    ) -> Result<()> {
        if std::env::var_os("RUST_LOG").is_none() {
            self.set_level(&config.level)?;
        }
        if let Some(path) = &config.file {
            self.log_to_file(path)?;
        }
        Ok(())
    }

    /// Replaces the active filter. Accepts a bare level such as `debug` or
    /// any `EnvFilter` directive.
    pub fn set_level(
        &self,
        directive: &str,
    ) -> Result<()> {
        let filter = EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log level '{directive}'"))?;
        self.filter
            .reload(filter)
            .context("failed to reload log filter")
    }

    /// Starts appending records to `path`, replacing any open file. The
    /// directory must already exist.
    pub fn log_to_file(
        &self,
        path: &Path,
    ) -> Result<()> {
        let file = File::options()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open log file '{}'", path.display()))?;
        *self.lock_file() = Some(file);
        Ok(())
    }

    pub fn close_file(&self) {
        self.lock_file().take();
    }

    fn lock_file(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Logging {
    fn drop(&mut self) {
        self.close_file();
    }
}
