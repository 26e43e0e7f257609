use crate::{
    layout::OutputLayout,
    locator::ArtifactPaths,
    table::Table,
    tools::ToolRun,
};
use anyhow::Result;
use log::{info, warn};
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fs, path::PathBuf};

/// Excel caps a worksheet at 1,048,576 rows, one of which is the header.
const MAX_DATA_ROWS: usize = 1_048_575;
const MAX_COLUMNS: usize = 16_384;
const MAX_CELL_CHARS: usize = 32_767;

/// Tables read back from the tool output folders. Empty tables are valid.
#[derive(Debug, Default)]
pub struct CollectedTables {
    pub prefetch: Table,
    pub jumplists: Table,
    pub lnk: Table,
    pub mft: Table,
    pub registry: Table,
}

#[derive(Debug)]
pub struct Sheet {
    pub name: &'static str,
    pub table: Table,
}

#[derive(Debug)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub sheets: Vec<Sheet>,
    /// Kept out of the workbook and written as its own CSV.
    pub mft: Option<Table>,
}

impl Report {
    pub fn sheet_names(&self) -> Vec<&'static str> {
        self.sheets.iter().map(|s| s.name).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub version: String,
    pub input_root: PathBuf,
    pub scanned_root: PathBuf,
    pub artifacts: ArtifactPaths,
    pub tool_runs: Vec<ToolRun>,
    pub sheets: Vec<SheetSummary>,
    pub mft_rows: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SheetSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

/// Inputs to a report beyond the tables themselves.
pub struct RunContext<'a> {
    pub input_root: &'a std::path::Path,
    pub scanned_root: &'a std::path::Path,
    pub artifacts: &'a ArtifactPaths,
    pub tool_runs: &'a [ToolRun],
}

#[derive(Default)]
pub struct Reporter;

impl Reporter {
    pub fn new() -> Self {
        Self
    }

    /// Assemble the report. Sheets appear in the order Prefetch, Jumplists,
    /// LNK, Registry and only for non-empty tables.
    pub fn generate_report(&self, tables: CollectedTables, context: &RunContext<'_>) -> Report {
        let sheets: Vec<Sheet> = [
            ("Prefetch", tables.prefetch),
            ("Jumplists", tables.jumplists),
            ("LNK", tables.lnk),
            ("Registry", tables.registry),
        ]
        .into_iter()
        .filter(|(_, table)| !table.is_empty())
        .map(|(name, table)| Sheet { name, table })
        .collect();

        let mft = Some(tables.mft).filter(|table| !table.is_empty());
        let metadata = self.create_metadata(&sheets, mft.as_ref(), context);

        Report {
            metadata,
            sheets,
            mft,
        }
    }

    fn create_metadata(
        &self,
        sheets: &[Sheet],
        mft: Option<&Table>,
        context: &RunContext<'_>,
    ) -> ReportMetadata {
        ReportMetadata {
            generated_at: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            input_root: context.input_root.to_path_buf(),
            scanned_root: context.scanned_root.to_path_buf(),
            artifacts: context.artifacts.clone(),
            tool_runs: context.tool_runs.to_vec(),
            sheets: sheets
                .iter()
                .map(|sheet| SheetSummary {
                    name: sheet.name.to_string(),
                    rows: sheet.table.row_count(),
                    columns: sheet.table.headers.len(),
                })
                .collect(),
            mft_rows: mft.map(Table::row_count),
        }
    }

    /// Write the MFT CSV, the workbook and the run summary.
    ///
    /// A report without sheets produces no workbook: an xlsx file needs at
    /// least one visible worksheet.
    pub fn export_report(&self, report: &Report, layout: &OutputLayout) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&layout.root)?;
        let mut exported_files = Vec::new();

        if let Some(mft) = &report.mft {
            let mft_path = layout.mft_report_path();
            mft.write_csv(&mft_path)?;
            info!("Wrote {} MFT rows to {}", mft.row_count(), mft_path.display());
            exported_files.push(mft_path);
        }

        if report.sheets.is_empty() {
            info!("No sheets to write, skipping {}", layout.report_path().display());
        } else {
            let report_path = layout.report_path();
            self.write_workbook(&report.sheets, &report_path)?;
            info!(
                "Wrote {} sheet(s) to {}",
                report.sheets.len(),
                report_path.display()
            );
            exported_files.push(report_path);
        }

        let summary_path = layout.summary_path();
        fs::write(&summary_path, serde_json::to_string_pretty(&report.metadata)?)?;
        exported_files.push(summary_path);

        Ok(exported_files)
    }

    fn write_workbook(&self, sheets: &[Sheet], path: &std::path::Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        for sheet in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name)?;

            let table = &sheet.table;
            if table.headers.len() > MAX_COLUMNS {
                warn!(
                    "{} has {} columns, keeping the first {}",
                    sheet.name,
                    table.headers.len(),
                    MAX_COLUMNS
                );
            }
            if table.rows.len() > MAX_DATA_ROWS {
                warn!(
                    "{} has {} rows, keeping the first {}",
                    sheet.name,
                    table.rows.len(),
                    MAX_DATA_ROWS
                );
            }

            for (col, header) in table.headers.iter().take(MAX_COLUMNS).enumerate() {
                worksheet.write_string_with_format(
                    0,
                    col as u16,
                    &*cell_text(header),
                    &header_format,
                )?;
            }

            for (index, row) in table.rows.iter().take(MAX_DATA_ROWS).enumerate() {
                let row_num = (index + 1) as u32;
                for (col, value) in row.iter().take(MAX_COLUMNS).enumerate() {
                    if value.is_empty() {
                        continue;
                    }
                    worksheet.write_string(row_num, col as u16, &*cell_text(value))?;
                }
            }
        }

        workbook.save(path)?;
        Ok(())
    }
}

fn cell_text(value: &str) -> Cow<'_, str> {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => Cow::Owned(value[..cut].to_string()),
        None => Cow::Borrowed(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }

    fn context<'a>(artifacts: &'a ArtifactPaths) -> RunContext<'a> {
        RunContext {
            input_root: Path::new("/evidence/image"),
            scanned_root: Path::new("/evidence/image"),
            artifacts,
            tool_runs: &[],
        }
    }

    #[test]
    fn empty_tables_become_no_sheets() {
        let artifacts = ArtifactPaths::default();
        let report =
            Reporter::new().generate_report(CollectedTables::default(), &context(&artifacts));

        assert!(report.sheets.is_empty());
        assert!(report.mft.is_none());
        assert_eq!(report.metadata.mft_rows, None);
    }

    #[test]
    fn sheets_follow_fixed_order_and_skip_empty() {
        let tables = CollectedTables {
            prefetch: table(&["ExecutableName"], &[]),
            jumplists: table(&["AppId"], &[&["5f7b5f1e01b83767"]]),
            lnk: table(&[], &[]),
            mft: table(&["EntryNumber", "FileName"], &[&["0", "$MFT"]]),
            registry: table(
                &["HivePath", "KeyPath"],
                &[&["SYSTEM", "Select"], &["SAM", "Domains"]],
            ),
        };
        let artifacts = ArtifactPaths::default();
        let report = Reporter::new().generate_report(tables, &context(&artifacts));

        assert_eq!(report.sheet_names(), vec!["Jumplists", "Registry"]);
        assert_eq!(report.metadata.sheets[1].rows, 2);
        assert_eq!(report.mft.as_ref().map(Table::row_count), Some(1));
    }

    #[test]
    fn export_without_sheets_writes_only_summary() {
        let tmp = TempDir::new().unwrap();
        let layout = OutputLayout::new(tmp.path());
        let artifacts = ArtifactPaths::default();
        let report =
            Reporter::new().generate_report(CollectedTables::default(), &context(&artifacts));

        let files = Reporter::new().export_report(&report, &layout).unwrap();
        assert_eq!(files, vec![layout.summary_path()]);
        assert!(!layout.report_path().exists());
        assert!(!layout.mft_report_path().exists());

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(layout.summary_path()).unwrap()).unwrap();
        assert_eq!(summary["sheets"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn export_writes_workbook_and_mft_csv() {
        let tmp = TempDir::new().unwrap();
        let layout = OutputLayout::new(tmp.path());
        let tables = CollectedTables {
            prefetch: table(&["ExecutableName", "RunCount"], &[&["CMD.EXE", "3"]]),
            mft: table(&["EntryNumber", "FileName"], &[&["0", "$MFT"], &["5", "."]]),
            ..Default::default()
        };
        let artifacts = ArtifactPaths::default();
        let report = Reporter::new().generate_report(tables, &context(&artifacts));

        let files = Reporter::new().export_report(&report, &layout).unwrap();
        assert_eq!(files.len(), 3);
        assert!(layout.report_path().is_file());

        let mft = Table::from_csv_path(&layout.mft_report_path()).unwrap();
        assert_eq!(mft.row_count(), 2);
        assert_eq!(mft.rows[0][1], "$MFT");
    }

    #[test]
    fn long_cells_are_truncated() {
        let long = "x".repeat(MAX_CELL_CHARS + 10);
        assert_eq!(cell_text(&long).chars().count(), MAX_CELL_CHARS);
        assert!(matches!(cell_text("short"), Cow::Borrowed("short")));
    }
}
