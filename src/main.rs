use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use dashpack::cli::{
    handle_config, handle_export, handle_import, handle_init, handle_preview, handle_status,
    ExportArgs, ImportArgs, PreviewArgs,
};
use dashpack::config::{paths::DashPaths, settings::Settings};
use dashpack::storage::Storage;

#[derive(Parser)]
#[command(
    name = "dashpack",
    author = "Kaylee Beyene",
    version,
    about = "Export and import dashboard application state as portable archives",
    long_about = "dashpack packages dashboards, widgets, integrations, branding, \
                  templates and media libraries into a single zip archive with \
                  checksums and optionally encrypted credentials, and imports such \
                  archives into another store."
)]
struct Cli {
    /// Log pipeline progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store directories and default settings
    Init,

    /// Show current configuration and paths
    Config,

    /// Show entity counts in the store
    Status,

    /// Write the store to an archive
    Export(ExportArgs),

    /// Summarize an archive without importing it
    Preview(PreviewArgs),

    /// Import an archive into the store
    Import(ImportArgs),
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    dashpack::logging::init(cli.verbose);

    // Initialize paths and settings
    let paths = DashPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Init) => handle_init(&paths, &settings)?,
        Some(Commands::Config) => handle_config(&paths, &settings)?,
        Some(Commands::Status) => {
            let storage = Storage::open(paths)?;
            handle_status(&storage)?;
        }
        Some(Commands::Export(args)) => {
            let storage = Storage::open(paths)?;
            handle_export(&storage, &settings, args)?;
        }
        Some(Commands::Preview(args)) => handle_preview(&paths, &settings, args)?,
        Some(Commands::Import(args)) => {
            let storage = Storage::open(paths)?;
            if !handle_import(&storage, &settings, args)? {
                return Ok(ExitCode::from(2));
            }
        }
        None => {
            println!("dashpack - dashboard export/import archives");
            println!();
            println!("Run 'dashpack --help' for usage information.");
        }
    }

    Ok(ExitCode::SUCCESS)
}
