// src/utils/logger.rs
use crate::utils::path::get_log_dir;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use time::macros::format_description;
use tracing_appender::rolling;
use tracing_subscriber::{
    fmt::{self, time::LocalTime},
    layer::SubscriberExt,
    registry,
    util::SubscriberInitExt,
    EnvFilter,
};

const DEFAULT_FILE_PREFIX: &str = "lang-loader.log";
/// Host crates stay at `warn`; the loader's own `[i18n]` events are kept at `info`.
const DEFAULT_LEVEL: &str = "warn,lang_loader=info";
/// Checked before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "LANG_LOADER_LOG";

/// Sets up the global `tracing` subscriber for hosts embedding the loader.
///
/// `LANG_LOADER_LOG`, then `RUST_LOG`, win over `default_level` when set. Stdout
/// output is off unless asked for, so the loader does not write into a host's
/// terminal by default.
#[derive(Debug)]
pub struct LoggerBuilder {
    log_dir: PathBuf,
    file_prefix: String,
    default_level: String,
    stdout: bool,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerBuilder {
    pub fn new() -> Self {
        LoggerBuilder {
            log_dir: get_log_dir(),
            file_prefix: DEFAULT_FILE_PREFIX.into(),
            default_level: DEFAULT_LEVEL.into(),
            stdout: false,
        }
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    pub fn stdout(mut self, enabled: bool) -> Self {
        self.stdout = enabled;
        self
    }

    fn filter(&self) -> Result<EnvFilter, Box<dyn Error>> {
        if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV_VAR) {
            return Ok(filter);
        }
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        Ok(EnvFilter::try_new(&self.default_level)?)
    }

    pub fn init(self) -> Result<(), Box<dyn Error>> {
        fs::create_dir_all(&self.log_dir)?;
        let file_appender = rolling::daily(&self.log_dir, &self.file_prefix);

        let time_format = LocalTime::new(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
        ));

        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_thread_names(true)
            .with_thread_ids(true)
            .with_timer(time_format.clone());

        let stdout_layer = self.stdout.then(|| {
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(false)
                .with_thread_names(true)
                .with_thread_ids(true)
                .with_timer(time_format)
        });

        let filter = self.filter()?;

        registry()
            .with(filter)
            .with(file_layer)
            .with(stdout_layer)
            .try_init()?;
        Ok(())
    }
}
