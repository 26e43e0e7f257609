use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub tools: ToolPaths,
    pub batch_files: BatchFiles,
    pub logging: LoggingConfig,
    pub run: RunConfig,
}

/// Executables of the EZ tools driven by the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub pecmd: PathBuf,
    pub jlecmd: PathBuf,
    pub lecmd: PathBuf,
    pub mftecmd: PathBuf,
    pub recmd: PathBuf,
}

/// RECmd batch definitions (`.reb`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchFiles {
    pub shellbags: PathBuf,
    pub registry: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Run log file name, created inside the output directory.
    pub file_name: String,
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunConfig {
    pub parallel: bool,
}

const BATCH_EXAMPLES_DIR: &str = r"D:\forensic\RECmd\RECmd\BatchExamples";

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            pecmd: PathBuf::from(r"D:\forensic\PECmd\PECmd.exe"),
            jlecmd: PathBuf::from(r"D:\forensic\JLECmd\JLECmd.exe"),
            lecmd: PathBuf::from(r"D:\forensic\LECmd\LECmd.exe"),
            mftecmd: PathBuf::from(r"D:\forensic\MFTECmd\MFTECmd.exe"),
            recmd: PathBuf::from(r"D:\forensic\RECmd\RECmd\RECmd.exe"),
        }
    }
}

impl Default for BatchFiles {
    fn default() -> Self {
        Self {
            shellbags: PathBuf::from(format!(
                r"{BATCH_EXAMPLES_DIR}\BatchExampleUserAssist.reb"
            )),
            registry: PathBuf::from(format!(r"{BATCH_EXAMPLES_DIR}\RECmd_Batch_MC.reb")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_name: "artifact_extractor.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.to_lowercase().as_str() {
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        }
    }
}

impl Config {
    /// Get the default config file path (~/.artifact-extractor.toml)
    pub fn default_config_path() -> crate::Result<PathBuf> {
        let home_dir = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(PathBuf::from(home_dir).join(".artifact-extractor.toml"))
    }

    /// Load config from the default location, falling back to defaults if the file doesn't exist
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            println!("📝 Loading configuration from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            println!(
                "ℹ️  No config file found at {}, using default tool locations",
                config_path.display()
            );
            println!("💡 Run 'artifact-extractor config' to create a configuration file");
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create a config file with all available options documented
    pub fn create_documented_config() -> String {
        r#"# Artifact Extractor Configuration File
# Locations of the forensic tools and RECmd batch files used during extraction.
# Literal strings ('...') keep Windows backslashes intact.

[tools]
# Prefetch parser
pecmd = 'D:\forensic\PECmd\PECmd.exe'
# Jump list parser
jlecmd = 'D:\forensic\JLECmd\JLECmd.exe'
# Shortcut (.lnk) parser
lecmd = 'D:\forensic\LECmd\LECmd.exe'
# $MFT parser
mftecmd = 'D:\forensic\MFTECmd\MFTECmd.exe'
# Registry parser, used for both shellbags (NTUSER.DAT) and the config hives
recmd = 'D:\forensic\RECmd\RECmd\RECmd.exe'

[batch_files]
# Batch definition used against NTUSER.DAT
shellbags = 'D:\forensic\RECmd\RECmd\BatchExamples\BatchExampleUserAssist.reb'
# Batch definition used against the config directory (SYSTEM, SOFTWARE, SAM, SECURITY)
registry = 'D:\forensic\RECmd\RECmd\BatchExamples\RECmd_Batch_MC.reb'

[logging]
# Run log, written inside the output directory
file_name = "artifact_extractor.log"
# One of: error, warn, info, debug
level = "info"

[run]
# Run the tools concurrently. Each tool writes to its own output folder.
parallel = false
"#
        .to_string()
    }
}
