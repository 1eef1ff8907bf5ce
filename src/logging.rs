// Tracing setup. The full-screen UI owns stdout, so logs go to a file and
// nowhere else.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. `RUST_LOG` picks the level; an unset or
/// unparsable value means `info`.
pub fn init() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = filter_from(directives.as_deref());

    match open_first(&log_file_candidates()) {
        Ok((path, file, skipped)) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(filter)
                .init();
            tracing::info!(path = %path.display(), "logging initialized");
            for reason in skipped {
                tracing::warn!("{reason}");
            }
        }
        // No file: drop logs rather than writing over the UI.
        Err(_) => tracing_subscriber::registry().with(filter).init(),
    }
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_new("info").ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

/// Open the first usable candidate for appending. Alongside the file comes a
/// note for every candidate passed over; if none works, just the notes.
fn open_first(candidates: &[PathBuf]) -> Result<(PathBuf, File, Vec<String>), Vec<String>> {
    let mut skipped = Vec::new();
    for path in candidates {
        match open_append(path) {
            Ok(file) => return Ok((path.clone(), file, skipped)),
            Err(reason) => skipped.push(reason),
        }
    }
    Err(skipped)
}

fn open_append(path: &Path) -> Result<File, String> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| format!("cannot create log dir {}: {e}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("cannot open log file {}: {e}", path.display()))
}

fn log_file_candidates() -> Vec<PathBuf> {
    let local = PathBuf::from(".zello").join("logs").join("zello.log");
    match dirs::data_local_dir() {
        Some(dir) => vec![dir.join("zello").join("logs").join("zello.log"), local],
        None => vec![local],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_fallback_is_always_last() {
        let candidates = log_file_candidates();
        assert_eq!(
            candidates.last().unwrap(),
            &PathBuf::from(".zello/logs/zello.log")
        );
    }

    #[test]
    fn bad_directives_fall_back_to_info() {
        assert_eq!(filter_from(Some("zello_cli=debug")).to_string(), "zello_cli=debug");
        assert_eq!(filter_from(Some("zello_cli=loud")).to_string(), "info");
        assert_eq!(filter_from(None).to_string(), "info");
    }

    #[test]
    fn unusable_candidates_are_skipped_with_a_reason() {
        let root = std::env::temp_dir().join(format!("zello-log-{}", std::process::id()));
        fs::create_dir_all(&root).unwrap();
        // a regular file where a directory is needed
        let blocker = root.join("blocker");
        fs::write(&blocker, "").unwrap();

        let candidates = vec![blocker.join("logs").join("zello.log"), root.join("zello.log")];
        let (path, _file, skipped) = open_first(&candidates).unwrap();
        assert_eq!(path, root.join("zello.log"));
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].contains("cannot create log dir"));

        let missing = open_first(&candidates[..1]).unwrap_err();
        assert_eq!(missing.len(), 1);

        fs::remove_dir_all(&root).unwrap();
    }
}
