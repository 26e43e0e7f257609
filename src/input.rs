use crate::error::ExtractorError;
use log::{error, info};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Resolve the input root, defaulting to the current directory.
pub fn resolve_input_root(input: Option<&Path>) -> Result<PathBuf, ExtractorError> {
    let root = match input {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().map_err(|e| ExtractorError::io(".", e))?,
    };

    if !root.exists() {
        error!("Input path does not exist: {}", root.display());
        return Err(ExtractorError::InputNotFound { path: root });
    }

    Ok(root)
}

pub fn is_zip_archive(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase().ends_with(".zip"))
            .unwrap_or(false)
}

/// Expand `input` into `work_dir` when it is a ZIP archive.
///
/// Returns the directory that should be scanned: `work_dir` for archives,
/// `input` unchanged otherwise. The working folder is left in place.
pub fn extract_if_zip(input: &Path, work_dir: &Path) -> Result<PathBuf, ExtractorError> {
    if !is_zip_archive(input) {
        return Ok(input.to_path_buf());
    }

    info!("Extracting ZIP archive: {}", input.display());
    let archive_err = |details: String| ExtractorError::Archive {
        path: input.to_path_buf(),
        details,
    };

    let file = File::open(input).map_err(|e| ExtractorError::io(input, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| archive_err(e.to_string()))?;

    fs::create_dir_all(work_dir).map_err(|e| ExtractorError::io(work_dir, e))?;
    archive
        .extract(work_dir)
        .map_err(|e| archive_err(e.to_string()))?;

    info!(
        "Extracted {} entries into {}",
        archive.len(),
        work_dir.display()
    );
    Ok(work_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn missing_input_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("no-such-image");

        let err = resolve_input_root(Some(&missing)).unwrap_err();
        assert!(matches!(err, ExtractorError::InputNotFound { .. }));
    }

    #[test]
    fn defaults_to_current_directory() {
        let root = resolve_input_root(None).unwrap();
        assert_eq!(root, std::env::current_dir().unwrap());
    }

    #[test]
    fn directories_pass_through() {
        let tmp = TempDir::new().unwrap();
        let work = tmp.path().join("unzipped_temp");

        let scanned = extract_if_zip(tmp.path(), &work).unwrap();
        assert_eq!(scanned, tmp.path());
        assert!(!work.exists());
    }

    #[test]
    fn expands_zip_archives() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("triage.ZIP");
        write_zip(
            &archive,
            &[("Windows/Prefetch/CMD.EXE-4A81B364.pf", b"MAM\x04")],
        );
        let work = tmp.path().join("out").join("unzipped_temp");

        let scanned = extract_if_zip(&archive, &work).unwrap();
        assert_eq!(scanned, work);
        assert!(work.join("Windows/Prefetch/CMD.EXE-4A81B364.pf").is_file());
    }

    #[test]
    fn corrupt_archive_is_reported() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("broken.zip");
        fs::write(&archive, b"not a zip").unwrap();

        let err = extract_if_zip(&archive, &tmp.path().join("work")).unwrap_err();
        assert!(matches!(err, ExtractorError::Archive { .. }));
    }
}
