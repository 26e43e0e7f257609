use crate::error::ExtractorError;
use std::fs;
use std::path::{Path, PathBuf};

pub const REPORT_FILE: &str = "Final_Report.xlsx";
pub const MFT_REPORT_FILE: &str = "MFT_Output.csv";
pub const SUMMARY_FILE: &str = "run_summary.json";

/// Folder structure under the user-supplied output directory.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub prefetch: PathBuf,
    pub jumplists: PathBuf,
    pub lnk: PathBuf,
    pub mft: PathBuf,
    pub registry: PathBuf,
    /// Captured stdout/stderr of each tool run.
    pub logs: PathBuf,
    /// Where ZIP inputs are expanded.
    pub unzipped: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            prefetch: root.join("PrefetchOutput"),
            jumplists: root.join("JumplistOutput"),
            lnk: root.join("RecentOutput"),
            mft: root.join("$MFTOutput"),
            registry: root.join("RegistryOutput"),
            logs: root.join("logs"),
            unzipped: root.join("unzipped_temp"),
            root,
        }
    }

    pub fn create_all(&self) -> Result<(), ExtractorError> {
        for folder in [
            &self.root,
            &self.prefetch,
            &self.jumplists,
            &self.lnk,
            &self.mft,
            &self.registry,
            &self.logs,
        ] {
            fs::create_dir_all(folder).map_err(|e| ExtractorError::io(folder, e))?;
        }
        Ok(())
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILE)
    }

    pub fn mft_report_path(&self) -> PathBuf {
        self.root.join(MFT_REPORT_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join(SUMMARY_FILE)
    }
}
