use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while locating artifacts, driving the external tools or
/// assembling the report.
///
/// Pre-flight failures (missing input, missing RECmd pieces) abort the run.
/// Per-read failures (`NoCsv`, `Csv`) are logged by the caller and the
/// category is treated as empty.
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("Input path does not exist: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("{tool} executable not found: {}", path.display())]
    ToolNotFound { tool: &'static str, path: PathBuf },

    #[error("Shellbags file not found: {}", path.display())]
    HiveNotFound { path: PathBuf },

    #[error("{purpose} batch file not found: {}", path.display())]
    BatchFileNotFound { purpose: &'static str, path: PathBuf },

    #[error("Failed to expand archive {}: {details}", path.display())]
    Archive { path: PathBuf, details: String },

    #[error("Failed to walk {}: {details}", path.display())]
    Walk { path: PathBuf, details: String },

    #[error("No CSV found in {}", folder.display())]
    NoCsv { folder: PathBuf },

    #[error("Failed to read CSV {}: {details}", path.display())]
    Csv { path: PathBuf, details: String },

    #[error("IO failure at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractorError {
    /// True for the "file not found" family of fatal pre-flight errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::InputNotFound { .. }
                | Self::ToolNotFound { .. }
                | Self::HiveNotFound { .. }
                | Self::BatchFileNotFound { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
