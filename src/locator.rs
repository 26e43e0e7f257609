use crate::error::ExtractorError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const REGISTRY_HIVES: [&str; 4] = ["SYSTEM", "SOFTWARE", "SAM", "SECURITY"];

/// Where each artifact category was found in the scanned tree.
///
/// Directories are recorded for prefetch, jumplists, lnk and registry. Shellbags
/// points at the `NTUSER.DAT` hive itself and mft at the `$MFT` file. When more
/// than one directory qualifies for a category the last one visited is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub prefetch: Option<PathBuf>,
    pub jumplists: Option<PathBuf>,
    pub lnk: Option<PathBuf>,
    pub shellbags: Option<PathBuf>,
    pub mft: Option<PathBuf>,
    pub registry: Option<PathBuf>,
}

impl ArtifactPaths {
    /// Apply every classification rule to one directory and its direct files.
    ///
    /// Rules are independent: a single directory may fill several categories.
    pub fn classify_directory(&mut self, dir: &Path, files: &[String]) {
        let dir_str = dir.to_string_lossy();
        let has_suffix = |suffix: &str| files.iter().any(|f| f.ends_with(suffix));

        if dir_str.contains("Prefetch") && has_suffix(".pf") {
            self.prefetch = Some(dir.to_path_buf());
        }
        if dir_str.contains("AutomaticDestinations") && has_suffix(".automaticDestinations-ms") {
            self.jumplists = Some(dir.to_path_buf());
        }
        if dir_str.contains("Recent") && has_suffix(".lnk") {
            self.lnk = Some(dir.to_path_buf());
        }
        if files.iter().any(|f| f == "NTUSER.DAT") {
            self.shellbags = Some(dir.join("NTUSER.DAT"));
        }
        if let Some(mft) = files.iter().find(|f| f.starts_with("$MFT")) {
            self.mft = Some(dir.join(mft));
        }
        if dir_str.to_lowercase().contains("config")
            && files.iter().any(|f| REGISTRY_HIVES.contains(&f.as_str()))
        {
            self.registry = Some(dir.to_path_buf());
        }
    }

    pub fn found_count(&self) -> usize {
        self.entries().iter().filter(|(_, path)| path.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.found_count() == 0
    }

    /// Category names paired with their located path, in a fixed order.
    pub fn entries(&self) -> [(&'static str, Option<&Path>); 6] {
        [
            ("prefetch", self.prefetch.as_deref()),
            ("jumplists", self.jumplists.as_deref()),
            ("lnk", self.lnk.as_deref()),
            ("shellbags", self.shellbags.as_deref()),
            ("mft", self.mft.as_deref()),
            ("registry", self.registry.as_deref()),
        ]
    }

    pub fn print_summary(&self) {
        println!("Artifact Discovery Summary:");
        for (name, path) in self.entries() {
            match path {
                Some(path) => println!("  {:<10} {}", name, path.display()),
                None => println!("  {:<10} (not found)", name),
            }
        }
    }
}

/// Fold an already ordered stream of `(directory, file names)` pairs into one record.
pub fn classify_all<I>(directories: I) -> ArtifactPaths
where
    I: IntoIterator<Item = (PathBuf, Vec<String>)>,
{
    directories
        .into_iter()
        .fold(ArtifactPaths::default(), |mut paths, (dir, files)| {
            paths.classify_directory(&dir, &files);
            paths
        })
}

/// Walk `root` depth-first and classify every directory.
///
/// Siblings are visited in file-name order so the last-visited match is
/// deterministic. The caller is responsible for checking that `root` exists.
/// Only an unreadable root is an error: directories below it that cannot be
/// listed are logged and skipped.
pub fn locate_artifacts(root: &Path) -> Result<ArtifactPaths, ExtractorError> {
    let walk_err = |e: std::io::Error| ExtractorError::Walk {
        path: root.to_path_buf(),
        details: e.to_string(),
    };
    if fs::metadata(root).map_err(walk_err)?.is_dir() {
        list_files(root).map_err(walk_err)?;
    }

    let mut skipped: Option<PathBuf> = None;
    let directories = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_dir() => match list_files(entry.path()) {
                Ok(files) => Some((entry.into_path(), files)),
                Err(e) => {
                    warn!("Skipping unreadable directory {}: {}", entry.path().display(), e);
                    skipped = Some(entry.into_path());
                    None
                }
            },
            Ok(_) => None,
            Err(e) => {
                // Already reported when its listing failed
                if e.path().is_some() && e.path() != skipped.as_deref() {
                    warn!("Skipping unreadable entry: {}", e);
                }
                None
            }
        });

    Ok(classify_all(directories))
}

/// Names of the non-directory entries directly inside `dir`, sorted.
fn list_files(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.path().is_dir() {
            continue;
        }
        files.push(entry.file_name().to_string_lossy().into_owned());
    }
    files.sort();

    Ok(files)
}
