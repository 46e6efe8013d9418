use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cite_rename::config::{find_config_file, load_config, Config};
use cite_rename::pipeline::{list_documents, JsonlLog, RenameCoordinator, RenameLog, TracingLog};
use cite_rename::ui;
use cite_rename::utils::extract_first_page;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// cite-rename - Rename paper PDFs after their bibliographic citation
#[derive(Parser, Debug)]
#[command(name = "cite-rename")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rename paper PDFs after the citation found on CiNii Research", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rename every PDF in the input directory
    Run {
        /// Directory to scan (overrides paths.input_dir)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Directory to move renamed files into (overrides paths.output_dir)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Resolve and log names without moving any file
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the citation for a single PDF without renaming it
    Resolve {
        /// PDF to identify
        file: PathBuf,
    },

    /// Write a configuration file with the default settings
    InitConfig {
        /// Destination path
        #[arg(default_value = cite_rename::config::CONFIG_FILE_NAME)]
        path: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("cite_rename={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.clone().or_else(find_config_file);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    match cli.command {
        Commands::Run {
            input,
            output,
            dry_run,
        } => {
            let mut config = load_config(config_path.as_deref())?;
            if let Some(input) = input {
                config.paths.input_dir = input;
            }
            if let Some(output) = output {
                config.paths.output_dir = output;
            }
            run(&config, dry_run, cli.quiet).await
        }

        Commands::Resolve { file } => {
            let config = load_config(config_path.as_deref())?;
            let coordinator = RenameCoordinator::from_config(&config)?;
            let max_chars = config.llm.max_input_chars;

            let text = tokio::task::spawn_blocking(move || extract_first_page(&file, max_chars))
                .await?
                .context("Could not read the first page")?;
            let citation = coordinator.resolve_citation(&text).await?;
            println!("{}", citation);
            Ok(())
        }

        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to replace it)", path.display());
            }
            Config::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
    }
}

/// Log sink for a run: a JSON-lines file under `{output_dir}/log`, or plain
/// tracing output for a dry run, which must leave the filesystem untouched
fn open_run_log(output_dir: &Path, dry_run: bool) -> Result<Arc<dyn RenameLog>> {
    if dry_run {
        return Ok(Arc::new(TracingLog));
    }

    let log = JsonlLog::timestamped(&output_dir.join("log")).context("Could not open the run log")?;
    tracing::info!("Writing run log to {}", log.path().display());
    Ok(Arc::new(log))
}

async fn run(config: &Config, dry_run: bool, quiet: bool) -> Result<()> {
    let input_dir = &config.paths.input_dir;
    let documents = list_documents(input_dir)
        .with_context(|| format!("Could not list {}", input_dir.display()))?;
    tracing::info!("Processing {} documents from {}", documents.len(), input_dir.display());

    let coordinator = RenameCoordinator::from_config(config)?
        .with_log(open_run_log(&config.paths.output_dir, dry_run)?)
        .dry_run(dry_run);

    let pb = ui::create_progress_bar(documents.len() as u64);
    let summary = coordinator
        .run_documents(documents, config.llm.max_input_chars, |outcome| {
            pb.inc(1);
            if !quiet {
                pb.println(ui::outcome_line(outcome));
            }
        })
        .await?;
    pb.finish_and_clear();

    if !quiet {
        ui::print_summary(&summary);
    }
    Ok(())
}
