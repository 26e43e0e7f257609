use crate::{config::LoggingConfig, error::ExtractorError};
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Create the run log inside `output_dir`.
pub fn create_log_file(
    output_dir: &Path,
    logging: &LoggingConfig,
) -> Result<(File, PathBuf, LevelFilter), ExtractorError> {
    fs::create_dir_all(output_dir).map_err(|e| ExtractorError::io(output_dir, e))?;

    let path = output_dir.join(&logging.file_name);
    let file = File::create(&path).map_err(|e| ExtractorError::io(&path, e))?;

    Ok((file, path, logging.level_filter()))
}

/// Route `log` records to the run log file and warnings to the terminal.
///
/// Returns the log file path. Installing a second logger in the same process
/// is ignored.
pub fn init_run_log(output_dir: &Path, logging: &LoggingConfig) -> Result<PathBuf, ExtractorError> {
    let (file, path, level) = create_log_file(output_dir, logging)?;

    let loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(
            LevelFilter::Warn,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
        WriteLogger::new(level, Config::default(), file),
    ];
    let _ = CombinedLogger::init(loggers);

    Ok(path)
}
