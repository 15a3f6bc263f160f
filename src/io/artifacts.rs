//! Timestamped report artifacts.
//!
//! Layout under the report folder:
//!
//! ```text
//! <html_folder>/html<ts>.html
//! <html_folder>/<fig_folder>/fig<ts>.svg
//! ```
//!
//! `<ts>` is local time as `%Y-%m-%d-%H_%M_%S`. A file already at the target
//! path is deleted first, with a warning.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::AppError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H_%M_%S";

/// Target paths for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub html: PathBuf,
    pub figure: PathBuf,
    /// Figure path relative to the HTML file, for `<img src>`.
    pub figure_relative: PathBuf,
}

impl ArtifactPaths {
    pub fn at(html_folder: &Path, fig_folder: &Path, now: DateTime<Local>) -> Self {
        let ts = now.format(TIMESTAMP_FORMAT).to_string();
        let fig_name = format!("fig{ts}.svg");
        Self {
            html: html_folder.join(format!("html{ts}.html")),
            figure: html_folder.join(fig_folder).join(&fig_name),
            figure_relative: fig_folder.join(fig_name),
        }
    }
}

/// Write `contents` to `path`, creating parent folders and replacing any
/// existing file.
pub fn write_replacing(path: &Path, contents: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::new(2, format!("Failed to create folder '{}': {e}", parent.display())))?;
    }
    if path.exists() {
        tracing::warn!(path = %path.display(), "file already exists; deleting it");
        fs::remove_file(path)
            .map_err(|e| AppError::new(2, format!("Failed to delete '{}': {e}", path.display())))?;
    }
    fs::write(path, contents).map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn paths_carry_the_timestamp() {
        let now = Local.with_ymd_and_hms(2018, 4, 1, 9, 5, 7).unwrap();
        let paths = ArtifactPaths::at(Path::new("html"), Path::new("fig"), now);
        assert_eq!(paths.html, PathBuf::from("html/html2018-04-01-09_05_07.html"));
        assert_eq!(paths.figure, PathBuf::from("html/fig/fig2018-04-01-09_05_07.svg"));
        assert_eq!(paths.figure_relative, PathBuf::from("fig/fig2018-04-01-09_05_07.svg"));
    }

    #[test]
    fn existing_file_is_replaced() {
        let dir = std::env::temp_dir().join(format!("repay-artifacts-{}", std::process::id()));
        let path = dir.join("nested").join("out.txt");
        write_replacing(&path, "first").unwrap();
        write_replacing(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        let _ = fs::remove_dir_all(&dir);
    }
}
