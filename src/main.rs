use artifact_extractor::{
    input, locate_artifacts, logging, Config, Extractor, ExtractorError, OutputLayout,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "artifact-extractor")]
#[command(
    about = "Windows artifact extractor: runs the EZ tools against an image and builds one report"
)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Locate artifacts, run the forensic tools and write the consolidated report
    Extract {
        /// Mounted image, ZIP archive, or extracted folder (defaults to the current directory)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output folder for tool output and reports
        #[arg(short, long)]
        output: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run the tools concurrently
        #[arg(long)]
        parallel: bool,
    },
    /// Only locate artifacts and print what was found as JSON
    Scan {
        /// Directory to scan (defaults to the current directory)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Generate a documented configuration file
    Config {
        /// Output path for the config file (defaults to ~/.artifact-extractor.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            output,
            config,
            parallel,
        } => {
            extract(input, output, config, parallel).await?;
        }
        Commands::Scan { input } => {
            scan(input)?;
        }
        Commands::Config { output } => {
            generate_config(output)?;
        }
    }

    Ok(())
}

async fn extract(
    input_path: Option<PathBuf>,
    output_path: PathBuf,
    config_path: Option<PathBuf>,
    parallel: bool,
) -> anyhow::Result<()> {
    println!("🚀 Starting Windows Artifact Extraction");
    println!("=======================================");

    let start_time = Instant::now();

    let mut config = match config_path {
        Some(path) => Config::from_file(&path)?,
        None => Config::load()?,
    };
    if parallel {
        config.run.parallel = true;
    }

    let log_path = logging::init_run_log(&output_path, &config.logging)?;
    log::info!("Artifact extraction started, output in {}", output_path.display());

    let input_root = input::resolve_input_root(input_path.as_deref())?;

    println!("🎯 Input: {}", input_root.display());
    println!("📤 Output directory: {}", output_path.display());
    println!("📝 Run log: {}", log_path.display());

    let extractor = Extractor::new(config, OutputLayout::new(&output_path));
    let run = match extractor.run(&input_root).await {
        Ok(run) => run,
        Err(e) => {
            log::error!("Extraction aborted: {:#}", e);
            if e
                .downcast_ref::<ExtractorError>()
                .is_some_and(ExtractorError::is_not_found)
            {
                println!("💡 Check the [tools] and [batch_files] paths in your configuration.");
            }
            return Err(e);
        }
    };

    let duration = start_time.elapsed();
    run.print_summary();

    println!("\n✅ Extraction completed in {:.2}s", duration.as_secs_f64());
    if !run.failed_tools().is_empty() {
        println!("⚠️  Some tools failed, see {} for details", log_path.display());
    }
    println!("📁 Reports exported to:");
    for file in &run.exported_files {
        println!("   - {}", file.display());
    }

    Ok(())
}

fn scan(input_path: Option<PathBuf>) -> anyhow::Result<()> {
    let root = input::resolve_input_root(input_path.as_deref())?;
    let artifacts = locate_artifacts(&root)?;
    println!("{}", serde_json::to_string_pretty(&artifacts)?);
    Ok(())
}

fn generate_config(output_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = output_path.unwrap_or_else(|| {
        Config::default_config_path().unwrap_or_else(|_| PathBuf::from("artifact-extractor.toml"))
    });

    println!("📝 Generating configuration file: {}", config_path.display());
    std::fs::write(&config_path, Config::create_documented_config())?;

    println!("✅ Configuration file created successfully!");
    println!("💡 Point the [tools] and [batch_files] entries at your EZ tools install.");

    Ok(())
}
