//! Logging setup.

use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Filter from `RUST_LOG`, falling back to `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Setup logging with the given level.
///
/// Console output is pretty or JSON. With `file`, events are also appended
/// as JSON lines through a non-blocking writer; keep the returned guard alive
/// until the program exits so buffered lines are flushed.
pub fn setup_logging(
    level: &str,
    json: bool,
    file: Option<&Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let console: BoxedLayer = if json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().pretty().boxed()
    };
    let mut layers = vec![console];

    let guard = file.map(|path| {
        let (writer, guard) = tracing_appender::non_blocking(file_appender(path));
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
        guard
    });

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(level))
        .init();

    guard
}

fn file_appender(path: &Path) -> tracing_appender::rolling::RollingFileAppender {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "backtest.log".into());
    tracing_appender::rolling::never(dir, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_directives() {
        let filter = env_filter("debug,backtest_broker=trace");
        let rendered = filter.to_string();
        assert!(rendered.contains("backtest_broker=trace"));
    }

    #[test]
    fn test_file_appender_for_bare_name() {
        let path = std::env::temp_dir().join(format!("backtest-log-{}.log", std::process::id()));
        let _appender = file_appender(&path);
        let _ = std::fs::remove_file(&path);
    }
}
