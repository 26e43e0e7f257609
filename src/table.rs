use crate::error::ExtractorError;
use csv::ReaderBuilder;
use std::fs;
use std::path::{Path, PathBuf};

/// A CSV file held in memory as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Empty when there are no data rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.headers.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, ExtractorError> {
        let csv_err = |e: csv::Error| ExtractorError::Csv {
            path: path.to_path_buf(),
            details: e.to_string(),
        };

        // EZ tools occasionally emit ragged rows
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(csv_err)?;

        let headers = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(csv_err)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), ExtractorError> {
        let csv_err = |e: csv::Error| ExtractorError::Csv {
            path: path.to_path_buf(),
            details: e.to_string(),
        };

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(csv_err)?;
        writer.write_record(&self.headers).map_err(csv_err)?;
        for row in &self.rows {
            writer.write_record(row).map_err(csv_err)?;
        }
        writer.flush().map_err(|e| ExtractorError::io(path, e))?;
        Ok(())
    }
}

/// First `*.csv` file in `folder`, by file name.
pub fn first_csv_in(folder: &Path) -> Result<PathBuf, ExtractorError> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(folder)
        .map_err(|e| ExtractorError::io(folder, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .map(|name| name.to_string_lossy().ends_with(".csv"))
                    .unwrap_or(false)
        })
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| ExtractorError::NoCsv {
            folder: folder.to_path_buf(),
        })
}

pub fn read_first_csv_in(folder: &Path) -> Result<Table, ExtractorError> {
    let path = first_csv_in(folder)?;
    Table::from_csv_path(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_first_csv_by_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();
        fs::write(
            tmp.path().join("20240101_PECmd_Output.csv"),
            "\u{feff}SourceFilename,RunCount\nC:\\Windows\\Prefetch\\CMD.EXE-4A81B364.pf,3\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("20240101_PECmd_Output_Timeline.csv"),
            "RunTime,ExecutableName\n",
        )
        .unwrap();

        let table = read_first_csv_in(tmp.path()).unwrap();
        assert_eq!(table.headers, vec!["SourceFilename", "RunCount"]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows[0][1], "3");
    }

    #[test]
    fn missing_csv_is_reported() {
        let tmp = TempDir::new().unwrap();
        let err = read_first_csv_in(tmp.path()).unwrap_err();
        assert!(matches!(err, ExtractorError::NoCsv { .. }));
    }

    #[test]
    fn header_only_csv_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("out.csv"), "A,B\n").unwrap();

        let table = read_first_csv_in(tmp.path()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn ragged_rows_are_kept() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("recmd.csv");
        fs::write(
            &path,
            "HivePath,KeyPath,ValueName\nNTUSER.DAT,Software\nSYSTEM,Select,Current,extra\n",
        )
        .unwrap();

        let table = Table::from_csv_path(&path).unwrap();
        assert_eq!(table.rows[0].len(), 2);
        assert_eq!(table.rows[1].len(), 4);

        let copy = tmp.path().join("copy.csv");
        table.write_csv(&copy).unwrap();
        assert_eq!(Table::from_csv_path(&copy).unwrap(), table);
    }
}
