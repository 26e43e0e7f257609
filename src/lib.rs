pub mod config;
pub mod error;
pub mod extractor;
pub mod input;
pub mod layout;
pub mod locator;
pub mod logging;
pub mod reporter;
pub mod table;
pub mod tools;

pub use config::Config;
pub use error::ExtractorError;
pub use extractor::{ExtractionRun, Extractor};
pub use layout::OutputLayout;
pub use locator::{locate_artifacts, ArtifactPaths};
pub use reporter::Reporter;

pub type Result<T> = anyhow::Result<T>;
