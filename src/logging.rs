use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "neontype.log";

/// Route tracing output to `<dir>/neontype.log`.
///
/// The screen belongs to the TUI, so nothing is logged unless `RUST_LOG` is set.
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes and stops the writer.
pub fn init(dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().ok()?;

    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("neontype: cannot create log directory {}: {err}", dir.display());
        return None;
    }

    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        // a global subscriber is already installed; drop the guard so the writer shuts down
        .ok()
        .map(|_| guard)
}
