use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("invalid artifact pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("cannot read {path}: {source}")]
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of one retention sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<CleanupError>,
}

/// Delete files in `dir` matching `file_glob` whose modification time is more
/// than `max_age` before `now`. Files with a modification time after `now`
/// are kept.
pub fn remove_stale(
    dir: &Path,
    file_glob: &str,
    max_age: Duration,
    now: SystemTime,
) -> SweepReport {
    let mut report = SweepReport::default();

    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        file_glob
    );
    let entries = match glob::glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            report.failures.push(e.into());
            return report;
        }
    };

    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                let path = e.path().to_path_buf();
                report.failures.push(CleanupError::Metadata {
                    path,
                    source: e.into_error(),
                });
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }

        let modified = match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(source) => {
                report.failures.push(CleanupError::Metadata { path, source });
                continue;
            }
        };
        let stale = now
            .duration_since(modified)
            .is_ok_and(|age| age > max_age);
        if !stale {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => report.removed.push(path),
            Err(source) => report.failures.push(CleanupError::Remove { path, source }),
        }
    }

    report
}

/// Run the startup sweep over every `(dir, glob)` pair. Failures are logged
/// and otherwise ignored.
pub fn sweep_artifacts(targets: &[(&Path, &str)], max_age: Duration) -> usize {
    let now = SystemTime::now();
    let mut removed = 0;
    for (dir, file_glob) in targets {
        let report = remove_stale(dir, file_glob, max_age, now);
        for failure in &report.failures {
            log::warn!("Cleanup error: {failure}");
        }
        for path in &report.removed {
            log::debug!("Removed stale artifact {}", path.display());
        }
        removed += report.removed.len();
    }
    if removed > 0 {
        log::info!("Removed {removed} artifacts older than {}s", max_age.as_secs());
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn removes_only_old_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("dashboard_report_1.pdf");
        let csv = dir.path().join("filtered_customers_1.csv");
        std::fs::write(&pdf, b"%PDF").unwrap();
        std::fs::write(&csv, b"a,b").unwrap();

        // Fresh files survive.
        let report = remove_stale(dir.path(), "*.pdf", HOUR, SystemTime::now());
        assert!(report.removed.is_empty());
        assert!(pdf.exists());

        // Two hours later the report is stale; the CSV never matches.
        let later = SystemTime::now() + 2 * HOUR;
        let report = remove_stale(dir.path(), "*.pdf", HOUR, later);
        assert_eq!(report.removed, vec![pdf.clone()]);
        assert!(report.failures.is_empty());
        assert!(!pdf.exists());
        assert!(csv.exists());
    }

    #[test]
    fn future_timestamps_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("fig_age_1.png");
        std::fs::write(&png, b"png").unwrap();
        let earlier = SystemTime::now() - 2 * HOUR;
        let report = remove_stale(dir.path(), "*.png", HOUR, earlier);
        assert!(report.removed.is_empty());
        assert!(png.exists());
    }

    #[test]
    fn directory_names_with_glob_characters_are_escaped() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("out[1]");
        std::fs::create_dir(&dir).unwrap();
        let pdf = dir.join("old.pdf");
        std::fs::write(&pdf, b"%PDF").unwrap();

        let report = remove_stale(&dir, "*.pdf", HOUR, SystemTime::now() + 2 * HOUR);
        assert_eq!(report.removed, vec![pdf]);
    }

    #[test]
    fn missing_directory_is_not_an_error() {
        let root = tempfile::tempdir().unwrap();
        let report = remove_stale(&root.path().join("absent"), "*.pdf", HOUR, SystemTime::now());
        assert!(report.removed.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(sweep_artifacts(&[(root.path(), "*.pdf")], HOUR), 0);
    }
}
