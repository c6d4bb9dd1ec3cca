//! # Application Configuration
//!
//! Resolves the database path and report base directory.
//!
//! ## Resolution Order
//! 1. Command-line flags (`--db-path`, `--report-dir`)
//! 2. Environment variables (`KHATA_DB_PATH`, `KHATA_REPORT_DIR`,
//!    handled by clap's env support)
//! 3. Platform data directory defaults:
//!    - **Linux**: `~/.local/share/khata/`
//!    - **macOS**: `~/Library/Application Support/pk.khata.khata/`
//!    - **Windows**: `%APPDATA%\khata\khata\data\`

use std::path::PathBuf;

use anyhow::Context;
use directories::ProjectDirs;

/// Resolved application paths.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,

    /// Base directory for generated reports.
    /// Reports land at `{report_dir}/{salesman}/{month}/{date}.{ext}`.
    pub report_dir: PathBuf,
}

impl AppConfig {
    /// Resolves paths from optional overrides, falling back to the
    /// platform data directory.
    pub fn resolve(
        db_path: Option<PathBuf>,
        report_dir: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let data_dir = match (&db_path, &report_dir) {
            // Both overridden: no need to probe the platform dirs
            (Some(_), Some(_)) => None,
            _ => Some(default_data_dir()?),
        };

        let db_path = match db_path {
            Some(path) => path,
            None => data_dir.as_ref().unwrap().join("khata.db"),
        };

        let report_dir = match report_dir {
            Some(path) => path,
            None => data_dir.as_ref().unwrap().join("salesman-data"),
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }

        Ok(AppConfig {
            db_path,
            report_dir,
        })
    }
}

/// Platform-specific application data directory, created if missing.
fn default_data_dir() -> anyhow::Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("pk", "khata", "khata")
        .context("could not determine application data directory")?;

    let data_dir = proj_dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;

    Ok(data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_overrides_win() {
        let config = AppConfig::resolve(
            Some(PathBuf::from("/tmp/custom.db")),
            Some(PathBuf::from("/tmp/reports")),
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/custom.db"));
        assert_eq!(config.report_dir, PathBuf::from("/tmp/reports"));
    }
}
