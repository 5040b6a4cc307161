//! # Logger
//!
//! Installs the process-wide `tracing` subscriber used by Strata binaries.
//!
//! * A compact console layer on stderr, optionally showing thread names so that the log
//!   lines of simulated units running on different worker threads stay apart.
//! * An optional rolling file layer written through a non-blocking worker, in
//!   plain text or JSON.
//! * An `EnvFilter` whose default comes from the configured level or directive;
//!   `RUST_LOG` still applies when no directive is configured.
//!
//! Configure it by hand with [`Logger::builder`] or from the `logging` section of
//! the Strata configuration with [`Logger::from_config`].
//!
//! ## Example
//!
//! ```rust
//! # use strata_logger::{Logger, LevelFilter};
//!
//! let _logger = Logger::builder()
//!     .name("strata-node")
//!     .level(LevelFilter::DEBUG)
//!     .thread_names(true)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use private::Sealed;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::str::FromStr;
use strata_domain::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug)]
struct Settings {
    console: bool,
    thread_names: bool,
    directory: Option<PathBuf>,
    level: LevelFilter,
    rotation: Rotation,
    max_files: usize,
    json: bool,
    directive: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            console: true,
            thread_names: false,
            directory: None,
            level: LevelFilter::INFO,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
            directive: None,
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);
#[derive(Debug)]
pub struct NoFile;
#[derive(Debug)]
pub struct WithFile;

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}
impl Sealed for NoFile {}
impl Sealed for WithFile {}

/// Builder for the global subscriber. A name is required; the file options only
/// exist once a directory has been set.
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName, F: Sealed = NoFile> {
    settings: Settings,
    name: N,
    file: PhantomData<F>,
}

impl<F: Sealed> LoggerBuilder<NoName, F> {
    /// Names the logger; rolling files are prefixed with it.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName, F> {
        LoggerBuilder { settings: self.settings, name: WithName(name.into()), file: PhantomData }
    }
}

impl LoggerBuilder<WithName, WithFile> {
    /// Number of rotated files kept in the directory.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.settings.max_files = max;
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.settings.rotation = rotation;
        self
    }

    /// Writes the file layer as JSON lines.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn json(mut self, enabled: bool) -> Self {
        self.settings.json = enabled;
        self
    }
}

impl<F: Sealed> LoggerBuilder<WithName, F> {
    /// Default level when no directive is given.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.settings.level = level;
        self
    }

    /// Full `EnvFilter` directive, e.g. `strata_locality=trace,info`. Replaces `RUST_LOG`.
    ///
    /// Invalid directives make [`LoggerBuilder::init`] fail.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.settings.directive = Some(directive.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.settings.console = enabled;
        self
    }

    /// Prints the emitting thread's name on console lines.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn thread_names(mut self, enabled: bool) -> Self {
        self.settings.thread_names = enabled;
        self
    }

    /// Adds a rolling file layer writing into `directory`.
    pub fn directory(self, directory: impl Into<PathBuf>) -> LoggerBuilder<WithName, WithFile> {
        let mut settings = self.settings;
        settings.directory = Some(directory.into());
        LoggerBuilder { settings, name: self.name, file: PhantomData }
    }

    /// Installs the subscriber.
    ///
    /// The returned [`Logger`] owns the file worker guard; keep it alive until
    /// shutdown or buffered lines are lost.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, zero `max_files`,
    ///   a bad directive or no enabled layer.
    /// * [`LoggerError::Io`] or [`LoggerError::Appender`] if the file layer cannot be set up.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Self { settings, name: WithName(name), .. } = self;
        validate(&settings, &name)?;

        let filter = env_filter(&settings)?;
        let mut layers = Vec::new();

        if settings.console {
            layers.push(
                layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_thread_names(settings.thread_names)
                    .boxed(),
            );
        }

        let guard = match &settings.directory {
            Some(directory) => {
                std::fs::create_dir_all(directory)
                    .context(format!("Failed to create {}", directory.display()))?;

                let appender = RollingFileAppender::builder()
                    .rotation(settings.rotation.clone())
                    .filename_prefix(&name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(settings.max_files)
                    .build(directory)
                    .context(format!("Log directory {}", directory.display()))?;

                let (writer, guard) = tracing_appender::non_blocking(appender);
                let file_layer = layer().with_writer(writer).with_ansi(false).with_thread_names(true);
                layers.push(if settings.json { file_layer.json().boxed() } else { file_layer.boxed() });
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "no layer enabled; enable the console or set a directory".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;
        tracing::debug!(logger = %name, file = guard.is_some(), "Logger installed");

        Ok(Logger { guard })
    }
}

/// Keeps the file worker alive; dropping it flushes pending lines.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { settings: Settings::default(), name: NoName, file: PhantomData }
    }

    /// Installs a subscriber configured from the `logging` section.
    ///
    /// Console output is always on; `directory` adds the file layer and `json`
    /// switches its format.
    ///
    /// # Errors
    /// [`LoggerError::InvalidConfiguration`] for an unknown level name, plus
    /// everything [`LoggerBuilder::init`] returns.
    pub fn from_config(name: impl Into<String>, config: &LoggingConfig) -> Result<Self, LoggerError> {
        let mut builder = Self::builder().name(name).level(parse_level(&config.level)?).thread_names(true);
        if let Some(directive) = &config.filter {
            builder = builder.directive(directive.clone());
        }

        match &config.directory {
            Some(directory) => builder.directory(directory).json(config.json).init(),
            None => builder.init(),
        }
    }

    /// Whether a file layer is installed.
    #[must_use]
    pub const fn has_file(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::debug!("Flushing log files");
        }
    }
}

/// Parses a level name such as `info` or `TRACE`; `off` disables logging.
///
/// # Errors
/// [`LoggerError::InvalidConfiguration`] for anything else.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    LevelFilter::from_str(level.trim()).map_err(|e| LoggerError::InvalidConfiguration {
        message: format!("unknown level '{level}': {e}").into(),
        context: None,
    })
}

fn validate(settings: &Settings, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration { message: "logger name is empty".into(), context: None });
    }
    if settings.max_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }
    Ok(())
}

fn env_filter(settings: &Settings) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(settings.level.into());
    match &settings.directive {
        Some(directive) => builder.parse(directive).map_err(|e| LoggerError::InvalidConfiguration {
            message: format!("invalid directive '{directive}': {e}").into(),
            context: None,
        }),
        None => Ok(builder.from_env_lossy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn builder_defaults() {
        let builder = Logger::builder().name("unit-0");
        assert!(builder.settings.console);
        assert!(!builder.settings.thread_names);
        assert_eq!(builder.settings.level, LevelFilter::INFO);
        assert!(builder.settings.directive.is_none());
        assert!(builder.settings.directory.is_none());
    }

    #[test]
    fn file_options_follow_directory() {
        let builder = Logger::builder()
            .name("unit-0")
            .directive("strata_locality=trace")
            .directory("/tmp/strata-logs")
            .max_files(3)
            .json(true);

        assert_eq!(builder.settings.max_files, 3);
        assert!(builder.settings.json);
        assert_eq!(builder.settings.directive.as_deref(), Some("strata_locality=trace"));
        assert_eq!(builder.settings.directory.as_deref(), Some(std::path::Path::new("/tmp/strata-logs")));
    }

    #[test]
    fn level_names_parse_case_insensitively() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level(" WARN ").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::OFF);
        assert!(matches!(parse_level("chatty"), Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    #[serial]
    fn invalid_settings_are_rejected_before_install() {
        let err = Logger::builder().name("  ").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = Logger::builder().name("unit-0").console(false).init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = Logger::builder().name("unit-0").directive("strata=loud").init().unwrap_err();
        assert_eq!(err.kind(), strata_domain::ErrorKind::InvalidArgument);
    }

    #[test]
    #[serial]
    fn config_with_unknown_level_is_rejected() {
        let config = LoggingConfig { level: "chatty".to_owned(), ..LoggingConfig::default() };
        let err = Logger::from_config("unit-0", &config).unwrap_err();
        assert!(err.to_string().contains("chatty"));
    }
}
