use std::path::Path;

use tracing_subscriber::{filter::Directive, EnvFilter, Layer, Registry};

use crate::formatter::LogFormat;

/// A boxed tracing [`Layer`].
pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Keeps the non-blocking file writer alive. Dropping it flushes and stops file logging.
pub type FileWorkerGuard = tracing_appender::non_blocking::WorkerGuard;

/// The layers that make up the global subscriber.
#[derive(Default)]
pub(crate) struct Layers {
    inner: Vec<BoxedLayer<Registry>>,
}

impl Layers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn into_inner(self) -> Vec<BoxedLayer<Registry>> {
        self.inner
    }

    pub(crate) fn stdout(
        &mut self,
        format: LogFormat,
        default_directive: &str,
        filters: &str,
        color: Option<String>,
    ) -> eyre::Result<()> {
        let filter = build_env_filter(default_directive, filters)?;
        self.inner.push(format.apply(filter, color, None));
        Ok(())
    }

    pub(crate) fn file(
        &mut self,
        format: LogFormat,
        default_directive: &str,
        filters: &str,
        dir: impl AsRef<Path>,
        file_name: &str,
    ) -> eyre::Result<FileWorkerGuard> {
        std::fs::create_dir_all(dir.as_ref())?;
        let appender = tracing_appender::rolling::never(dir.as_ref(), file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let filter = build_env_filter(default_directive, filters)?;
        self.inner.push(format.apply(filter, None, Some(writer)));
        Ok(guard)
    }
}

/// Builds an [`EnvFilter`] from `RUST_LOG` (or `default_directive` when unset) plus the comma
/// separated `directives`.
fn build_env_filter(default_directive: &str, directives: &str) -> eyre::Result<EnvFilter> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_directive.parse::<Directive>()?)
        .from_env_lossy();

    directives
        .split(',')
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .try_fold(env_filter, |env_filter, directive| {
            Ok(env_filter.add_directive(directive.parse::<Directive>()?))
        })
}
