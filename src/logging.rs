use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the background file writer alive; drop it only at shutdown.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Install the global subscriber: stdout always, plus a daily rolling file
/// when `log_file` is set and its directory can be created. Returns the
/// file writer's guard.
///
/// Later calls leave the first subscriber in place.
pub fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Option<FileLogGuard> {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_writer, guard) = match log_file.and_then(rolling_writer) {
        Some((writer, guard)) => (Some(writer), Some(guard)),
        None => (None, None),
    };
    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init();

    guard.map(|guard| FileLogGuard { _guard: guard })
}

fn rolling_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    let (dir, file_name) = split_log_path(path)?;
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("log file disabled, cannot create {}: {err}", dir.display());
        return None;
    }
    Some(tracing_appender::non_blocking(
        tracing_appender::rolling::daily(dir, file_name),
    ))
}

fn split_log_path(path: &Path) -> Option<(&Path, &std::ffi::OsStr)> {
    let file_name = path.file_name()?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Some((dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("logs/neurolms.log")).unwrap();
        assert_eq!(dir, Path::new("logs"));
        assert_eq!(name, "neurolms.log");

        let (dir, _) = split_log_path(Path::new("neurolms.log")).unwrap();
        assert_eq!(dir, Path::new("."));

        assert!(split_log_path(Path::new("/")).is_none());
    }

    #[test]
    fn test_rolling_writer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        assert!(rolling_writer(&log_dir.join("neurolms.log")).is_some());
        assert!(log_dir.is_dir());

        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"").unwrap();
        assert!(rolling_writer(&blocker.join("neurolms.log")).is_none());
    }
}
