use crate::{
    config::Config,
    input,
    layout::OutputLayout,
    locator::{locate_artifacts, ArtifactPaths},
    reporter::{CollectedTables, Report, Reporter, RunContext},
    table::{read_first_csv_in, Table},
    tools::{self, Category, ToolRun},
};
use anyhow::Result;
use log::{error, info, warn};
use std::path::{Path, PathBuf};

pub struct Extractor {
    config: Config,
    layout: OutputLayout,
    reporter: Reporter,
}

impl Extractor {
    pub fn new(config: Config, layout: OutputLayout) -> Self {
        Self {
            config,
            layout,
            reporter: Reporter::new(),
        }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Locate artifacts under `input_root`, run the tools and write the report.
    ///
    /// Fails only for fatal conditions: output folders that cannot be created,
    /// an unreadable archive or tree, missing RECmd pieces, or report writes.
    /// Individual tool failures leave their category empty.
    pub async fn run(&self, input_root: &Path) -> Result<ExtractionRun> {
        println!("📁 Preparing output folders in {}", self.layout.root.display());
        self.layout.create_all()?;

        let scanned_root = input::extract_if_zip(input_root, &self.layout.unzipped)
            .inspect_err(|e| error!("{e}"))?;

        println!("🔍 Locating artifacts under {}...", scanned_root.display());
        let artifacts = locate_artifacts(&scanned_root).inspect_err(|e| error!("{e}"))?;
        for (name, path) in artifacts.entries() {
            match path {
                Some(path) => info!("Found {}: {}", name, path.display()),
                None => info!("No {} artifacts found", name),
            }
        }

        let plan = tools::plan_invocations(&artifacts, &self.config, &self.layout);
        tools::preflight(&plan)?;

        let tool_runs = if plan.is_empty() {
            println!("\n⚠️  No artifacts found, nothing to run");
            Vec::new()
        } else {
            println!(
                "\n🛠️  Running {} tool(s){}...",
                plan.len(),
                if self.config.run.parallel { " in parallel" } else { "" }
            );
            tools::run_all(&plan, self.config.run.parallel).await
        };

        for run in &tool_runs {
            match &run.outcome {
                tools::ToolOutcome::Succeeded => println!("  ✓ {}", run.name),
                tools::ToolOutcome::Failed { reason } => println!("  ✗ {}: {}", run.name, reason),
            }
        }

        println!("\n📊 Collecting tool output...");
        let tables = self.collect_tables(&tool_runs);
        let report = self.reporter.generate_report(
            tables,
            &RunContext {
                input_root,
                scanned_root: &scanned_root,
                artifacts: &artifacts,
                tool_runs: &tool_runs,
            },
        );
        let exported_files = self.reporter.export_report(&report, &self.layout)?;

        Ok(ExtractionRun {
            artifacts,
            tool_runs,
            report,
            exported_files,
        })
    }

    fn collect_tables(&self, runs: &[ToolRun]) -> CollectedTables {
        let layout = &self.layout;
        CollectedTables {
            prefetch: read_category("Prefetch", &layout.prefetch, &[Category::Prefetch], runs),
            jumplists: read_category("Jumplists", &layout.jumplists, &[Category::Jumplists], runs),
            lnk: read_category("LNK", &layout.lnk, &[Category::Lnk], runs),
            mft: read_category("MFT", &layout.mft, &[Category::Mft], runs),
            registry: read_category(
                "RECmd",
                &layout.registry,
                &[Category::Shellbags, Category::Registry],
                runs,
            ),
        }
    }
}

/// Read the first CSV a category's tools produced.
///
/// Categories that were never run, or whose every run failed, are skipped.
/// A missing or unreadable CSV is logged and treated as empty.
fn read_category(label: &str, folder: &Path, categories: &[Category], runs: &[ToolRun]) -> Table {
    let attempted: Vec<&ToolRun> = runs
        .iter()
        .filter(|run| categories.contains(&run.category))
        .collect();

    if attempted.is_empty() {
        return Table::default();
    }
    if !attempted.iter().any(|run| run.outcome.is_success()) {
        warn!("Skipping {} CSV: tool run failed", label);
        return Table::default();
    }

    match read_first_csv_in(folder) {
        Ok(table) => {
            info!("{} CSV: {} rows", label, table.row_count());
            table
        }
        Err(e) => {
            error!("{} CSV error: {}", label, e);
            Table::default()
        }
    }
}

pub struct ExtractionRun {
    pub artifacts: ArtifactPaths,
    pub tool_runs: Vec<ToolRun>,
    pub report: Report,
    pub exported_files: Vec<PathBuf>,
}

impl ExtractionRun {
    pub fn failed_tools(&self) -> Vec<&ToolRun> {
        self.tool_runs
            .iter()
            .filter(|run| !run.outcome.is_success())
            .collect()
    }

    pub fn print_summary(&self) {
        println!("\n📊 Extraction Summary");
        println!("=====================");

        println!();
        self.artifacts.print_summary();

        println!("\n🛠️  Tools:");
        println!("  Run: {}", self.tool_runs.len());
        println!("  Failed: {}", self.failed_tools().len());

        println!("\n📄 Report:");
        if self.report.sheets.is_empty() {
            println!("  No sheets (no tool produced data)");
        }
        for sheet in &self.report.sheets {
            println!("  {}: {} rows", sheet.name, sheet.table.row_count());
        }
        match &self.report.mft {
            Some(mft) => println!("  MFT (separate CSV): {} rows", mft.row_count()),
            None => println!("  MFT: no data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolOutcome};
    use std::fs;

    fn run(category: Category, tool: Tool, outcome: ToolOutcome) -> ToolRun {
        ToolRun {
            category,
            tool,
            name: tool.name().to_string(),
            outcome,
        }
    }

    fn failed() -> ToolOutcome {
        ToolOutcome::Failed {
            reason: "exited with status 1".to_string(),
        }
    }

    #[test]
    fn failed_run_skips_the_read() {
        let tmp = tempfile::tempdir().unwrap();
        // A leftover CSV must not be picked up after a failed run.
        fs::write(tmp.path().join("old.csv"), "A\n1\n").unwrap();

        let runs = [run(Category::Prefetch, Tool::PECmd, failed())];
        let table = read_category("Prefetch", tmp.path(), &[Category::Prefetch], &runs);
        assert!(table.is_empty());
    }

    #[test]
    fn registry_reads_when_any_recmd_run_succeeded() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("recmd.csv"), "HivePath\nSYSTEM\n").unwrap();

        let runs = [
            run(Category::Shellbags, Tool::RECmd, failed()),
            run(Category::Registry, Tool::RECmd, ToolOutcome::Succeeded),
        ];
        let table = read_category(
            "RECmd",
            tmp.path(),
            &[Category::Shellbags, Category::Registry],
            &runs,
        );
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn success_without_csv_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let runs = [run(Category::Lnk, Tool::LECmd, ToolOutcome::Succeeded)];
        assert!(read_category("LNK", tmp.path(), &[Category::Lnk], &runs).is_empty());
    }

    #[tokio::test]
    async fn empty_tree_produces_no_sheets() {
        let evidence = tempfile::tempdir().unwrap();
        fs::create_dir_all(evidence.path().join("Users/Public/Documents")).unwrap();
        let out = tempfile::tempdir().unwrap();

        let extractor = Extractor::new(Config::default(), OutputLayout::new(out.path()));
        let result = extractor.run(evidence.path()).await.unwrap();

        assert!(result.artifacts.is_empty());
        assert!(result.tool_runs.is_empty());
        assert!(result.report.sheets.is_empty());
        assert!(!extractor.layout().report_path().exists());
        assert!(!extractor.layout().mft_report_path().exists());
        assert!(extractor.layout().summary_path().is_file());
    }
}
