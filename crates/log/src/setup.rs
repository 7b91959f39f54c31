use std::path::{Path, PathBuf};

use tracing::{subscriber::SetGlobalDefaultError, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global logger writing to stdout and to a new timestamped file
/// in `dir`.
///
/// The returned guard flushes the file writer when dropped, it has to be kept
/// alive for the whole run of the program.
pub fn init(dir: &Path) -> Result<WorkerGuard, SetGlobalDefaultError> {
    // for file name
    let dt = chrono::Local::now();
    let path: PathBuf = dt.format("%Y-%m-%d_%H-%M-%S.log").to_string().into();

    let file_appender = tracing_appender::rolling::never(dir, path);
    let (non_blocking_log_writer, guard) = tracing_appender::non_blocking(file_appender);

    let collector = tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                // defaults to INFO if RUST_LOG not set
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking_log_writer),
        );
    tracing::subscriber::set_global_default(collector)?;

    Ok(guard)
}
