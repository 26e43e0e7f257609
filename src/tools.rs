use crate::{
    config::Config,
    error::ExtractorError,
    layout::OutputLayout,
    locator::ArtifactPaths,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::task::JoinSet;

/// Artifact categories, one per `ArtifactPaths` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Prefetch,
    Jumplists,
    Lnk,
    Shellbags,
    Mft,
    Registry,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Prefetch => "Prefetch",
            Category::Jumplists => "Jumplists",
            Category::Lnk => "LNK",
            Category::Shellbags => "Shellbags",
            Category::Mft => "MFT",
            Category::Registry => "Registry",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tool {
    PECmd,
    JLECmd,
    LECmd,
    MFTECmd,
    RECmd,
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Tool::PECmd => "PECmd",
            Tool::JLECmd => "JLECmd",
            Tool::LECmd => "LECmd",
            Tool::MFTECmd => "MFTECmd",
            Tool::RECmd => "RECmd",
        }
    }
}

/// One fully resolved external tool call.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub category: Category,
    pub tool: Tool,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Directory or file handed to the tool.
    pub target: PathBuf,
    pub batch_file: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Invocation {
    /// Human readable name used in log lines, e.g. `RECmd (Shellbags)`.
    pub fn display_name(&self) -> String {
        match self.tool {
            Tool::RECmd => format!("{} ({})", self.tool.name(), self.category.name()),
            _ => self.tool.name().to_string(),
        }
    }

    /// File stem of the captured stdout/stderr log.
    pub fn log_label(&self) -> String {
        match self.tool {
            Tool::RECmd => format!("{}_{}", self.tool.name(), self.category.name()),
            _ => self.tool.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Succeeded,
    Failed { reason: String },
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Succeeded)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRun {
    pub category: Category,
    pub tool: Tool,
    pub name: String,
    pub outcome: ToolOutcome,
}

fn os_args(parts: &[&dyn AsRef<std::ffi::OsStr>]) -> Vec<OsString> {
    parts.iter().map(|p| p.as_ref().to_os_string()).collect()
}

/// Build the tool calls for every category that was located.
///
/// Order is fixed: prefetch, jumplists, lnk, mft, shellbags, registry. Both
/// RECmd runs write into the registry output folder.
pub fn plan_invocations(
    paths: &ArtifactPaths,
    config: &Config,
    layout: &OutputLayout,
) -> Vec<Invocation> {
    let tools = &config.tools;
    let mut plan = Vec::new();

    let directory_tools = [
        (Category::Prefetch, Tool::PECmd, &tools.pecmd, &paths.prefetch, &layout.prefetch),
        (Category::Jumplists, Tool::JLECmd, &tools.jlecmd, &paths.jumplists, &layout.jumplists),
        (Category::Lnk, Tool::LECmd, &tools.lecmd, &paths.lnk, &layout.lnk),
    ];
    for (category, tool, program, found, output_dir) in directory_tools {
        if let Some(dir) = found {
            plan.push(Invocation {
                category,
                tool,
                program: program.clone(),
                args: os_args(&[&"-d", dir, &"--csv", output_dir]),
                target: dir.clone(),
                batch_file: None,
                output_dir: output_dir.clone(),
                log_dir: layout.logs.clone(),
            });
        }
    }

    if let Some(mft) = &paths.mft {
        plan.push(Invocation {
            category: Category::Mft,
            tool: Tool::MFTECmd,
            program: tools.mftecmd.clone(),
            args: os_args(&[&"-f", mft, &"--csv", &layout.mft]),
            target: mft.clone(),
            batch_file: None,
            output_dir: layout.mft.clone(),
            log_dir: layout.logs.clone(),
        });
    }

    if let Some(hive) = &paths.shellbags {
        let batch = &config.batch_files.shellbags;
        plan.push(Invocation {
            category: Category::Shellbags,
            tool: Tool::RECmd,
            program: tools.recmd.clone(),
            args: os_args(&[
                &"-f",
                hive,
                &"--bn",
                batch,
                &"--csv",
                &layout.registry,
                &"--nl",
                &"false",
            ]),
            target: hive.clone(),
            batch_file: Some(batch.clone()),
            output_dir: layout.registry.clone(),
            log_dir: layout.logs.clone(),
        });
    }

    if let Some(dir) = &paths.registry {
        let batch = &config.batch_files.registry;
        plan.push(Invocation {
            category: Category::Registry,
            tool: Tool::RECmd,
            program: tools.recmd.clone(),
            args: os_args(&[
                &"-d",
                dir,
                &"--bn",
                batch,
                &"--csv",
                &layout.registry,
                &"--nl",
                &"false",
            ]),
            target: dir.clone(),
            batch_file: Some(batch.clone()),
            output_dir: layout.registry.clone(),
            log_dir: layout.logs.clone(),
        });
    }

    plan
}

/// Check that RECmd runs have everything they need before anything starts.
///
/// A missing executable, hive or batch file is fatal and is logged before
/// being returned.
pub fn preflight(plan: &[Invocation]) -> Result<(), ExtractorError> {
    for invocation in plan {
        if let Err(err) = check_invocation(invocation) {
            error!("{err}");
            return Err(err);
        }
    }
    Ok(())
}

fn check_invocation(invocation: &Invocation) -> Result<(), ExtractorError> {
    if invocation.tool != Tool::RECmd {
        return Ok(());
    }

    if !invocation.program.exists() {
        return Err(ExtractorError::ToolNotFound {
            tool: invocation.tool.name(),
            path: invocation.program.clone(),
        });
    }

    if invocation.category == Category::Shellbags && !invocation.target.exists() {
        return Err(ExtractorError::HiveNotFound {
            path: invocation.target.clone(),
        });
    }

    if let Some(batch) = &invocation.batch_file {
        if !batch.exists() {
            return Err(ExtractorError::BatchFileNotFound {
                purpose: invocation.category.name(),
                path: batch.clone(),
            });
        }
    }

    Ok(())
}

/// Run a single tool to completion and capture its output under the log folder.
///
/// Never fails: a non-zero exit or a process that cannot be started is
/// reported as `ToolOutcome::Failed` and logged with the tool name.
pub async fn run_invocation(invocation: &Invocation) -> ToolRun {
    let name = invocation.display_name();
    info!("Executing {}: {:?}", name, invocation.args);

    let program =
        fs::canonicalize(&invocation.program).unwrap_or_else(|_| invocation.program.clone());
    let output = Command::new(&program).args(&invocation.args).output().await;

    let outcome = match output {
        Ok(out) => {
            write_tool_log(&invocation.log_dir, &invocation.log_label(), &out.stdout, &out.stderr);

            if out.status.success() {
                info!("{} finished successfully", name);
                ToolOutcome::Succeeded
            } else {
                let reason = match out.status.code() {
                    Some(code) => format!("exited with status {code}"),
                    None => "terminated by signal".to_string(),
                };
                error!(
                    "Error running {}: {}. See logs/{}.log",
                    name,
                    reason,
                    invocation.log_label()
                );
                ToolOutcome::Failed { reason }
            }
        }
        Err(e) => {
            let reason = format!("could not start {}: {}", program.display(), e);
            error!("Error running {}: {}", name, reason);
            ToolOutcome::Failed { reason }
        }
    };

    ToolRun {
        category: invocation.category,
        tool: invocation.tool,
        name,
        outcome,
    }
}

fn write_tool_log(log_dir: &Path, label: &str, stdout: &[u8], stderr: &[u8]) {
    let log_path = log_dir.join(format!("{label}.log"));
    let content = format!(
        "--- STDOUT ---\n{}\n--- STDERR ---\n{}",
        String::from_utf8_lossy(stdout),
        String::from_utf8_lossy(stderr)
    );
    if let Err(e) = fs::write(&log_path, content) {
        warn!("Could not write tool log {}: {}", log_path.display(), e);
    }
}

/// Run every planned invocation, one after another or as a concurrent group.
///
/// Results come back in plan order regardless of mode.
pub async fn run_all(plan: &[Invocation], parallel: bool) -> Vec<ToolRun> {
    if !parallel {
        let mut runs = Vec::with_capacity(plan.len());
        for invocation in plan {
            runs.push(run_invocation(invocation).await);
        }
        return runs;
    }

    let mut set = JoinSet::new();
    for (index, invocation) in plan.iter().cloned().enumerate() {
        set.spawn(async move { (index, run_invocation(&invocation).await) });
    }

    let mut slots: Vec<Option<ToolRun>> = vec![None; plan.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, run)) => slots[index] = Some(run),
            Err(e) => error!("Tool task aborted: {}", e),
        }
    }

    slots
        .into_iter()
        .zip(plan)
        .map(|(slot, invocation)| {
            slot.unwrap_or_else(|| ToolRun {
                category: invocation.category,
                tool: invocation.tool,
                name: invocation.display_name(),
                outcome: ToolOutcome::Failed {
                    reason: "task aborted".to_string(),
                },
            })
        })
        .collect()
}
