//! Tracing setup for the intcode workspace
//!
//! Provides a small builder, [`IntcodeTracer`], which installs a global `tracing` subscriber made
//! of one or more [`LayerInfo`] described layers (stdout and/or a log file).

mod formatter;
mod layers;

pub use formatter::LogFormat;
pub use layers::{BoxedLayer, FileWorkerGuard};

// Re-export for consumers that need to build directives or filters themselves.
pub use tracing_subscriber;

use layers::Layers;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Describes how a single layer formats and filters events.
#[derive(Debug, Clone)]
pub struct LayerInfo {
    format: LogFormat,
    default_directive: String,
    filters: String,
    color: Option<String>,
}

impl LayerInfo {
    /// Creates a new [`LayerInfo`].
    ///
    /// `default_directive` is used when `RUST_LOG` is unset, `filters` is a comma separated list
    /// of additional directives, and `color` is one of `always`, `auto` or `never`.
    pub fn new(
        format: LogFormat,
        default_directive: String,
        filters: String,
        color: Option<String>,
    ) -> Self {
        Self { format, default_directive, filters, color }
    }
}

impl Default for LayerInfo {
    fn default() -> Self {
        Self {
            format: LogFormat::Terminal,
            default_directive: "info".to_string(),
            filters: String::new(),
            color: Some("auto".to_string()),
        }
    }
}

/// Something that can install itself as the global tracing subscriber.
pub trait Tracer {
    /// Installs the subscriber. Returns a guard that must be held for as long as file logging
    /// should continue, if a file layer was configured.
    fn init(self) -> eyre::Result<Option<FileWorkerGuard>>;
}

/// The default tracer: a stdout layer plus an optional file layer.
#[derive(Debug, Clone, Default)]
pub struct IntcodeTracer {
    stdout: LayerInfo,
    file: Option<(PathBuf, String, LayerInfo)>,
}

impl IntcodeTracer {
    /// Creates a tracer that logs `info` and above to stdout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stdout layer configuration.
    pub fn with_stdout(mut self, config: LayerInfo) -> Self {
        self.stdout = config;
        self
    }

    /// Additionally writes logs to `dir/file_name` through a non-blocking writer.
    pub fn with_file(
        mut self,
        dir: impl Into<PathBuf>,
        file_name: impl Into<String>,
        config: LayerInfo,
    ) -> Self {
        self.file = Some((dir.into(), file_name.into(), config));
        self
    }
}

impl Tracer for IntcodeTracer {
    fn init(self) -> eyre::Result<Option<FileWorkerGuard>> {
        let mut layers = Layers::new();

        layers.stdout(
            self.stdout.format,
            &self.stdout.default_directive,
            &self.stdout.filters,
            self.stdout.color,
        )?;

        let guard = match self.file {
            Some((dir, file_name, info)) => Some(layers.file(
                info.format,
                &info.default_directive,
                &info.filters,
                dir,
                &file_name,
            )?),
            None => None,
        };

        tracing_subscriber::registry().with(layers.into_inner()).try_init()?;
        Ok(guard)
    }
}
