//! Archive commands: export, preview and import

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::config::{paths::DashPaths, settings::Settings};
use crate::crypto::CredentialVault;
use crate::display::{format_export_report, format_import_result, format_summary};
use crate::error::{PackError, PackResult};
use crate::export::{export_to_path, export_to_writer};
use crate::import::{preview_path, ImportOptions, Importer};
use crate::storage::Storage;

use super::password;

/// Arguments for `dashpack export`
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file, a directory to receive `<prefix>-YYYY-MM-DD.zip`, or `-`
    /// for standard output (defaults to the store's exports directory)
    pub output: Option<PathBuf>,

    /// Include integration secrets, encrypted with a password
    #[arg(short, long)]
    pub encrypt: bool,

    /// Password for --encrypt (prompted for when unset)
    #[arg(long, env = "DASHPACK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Arguments for `dashpack preview`
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Archive to inspect
    pub archive: PathBuf,

    /// Do not verify manifest checksums
    #[arg(long)]
    pub skip_checksums: bool,
}

/// Arguments for `dashpack import`
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Archive to import
    pub archive: PathBuf,

    /// Prompt for the credentials password
    #[arg(short = 'p', long)]
    pub password_prompt: bool,

    /// Password for the encrypted credentials
    #[arg(long, env = "DASHPACK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Do not verify manifest checksums
    #[arg(long)]
    pub skip_checksums: bool,

    /// Delete all existing dashboards, integrations and media first
    #[arg(long)]
    pub replace_all: bool,
}

/// Handle `dashpack export`
pub fn handle_export(storage: &Storage, settings: &Settings, args: ExportArgs) -> PackResult<()> {
    let password = if args.encrypt {
        password::resolve(args.password, true, true)?
    } else {
        None
    };

    if args.output.as_deref() == Some(Path::new("-")) {
        let (_, manifest, unprotected) =
            export_to_writer(storage, settings, io::stdout().lock(), password.as_deref())?;
        eprintln!("Exported {} files to standard output", manifest.total_files);
        if unprotected {
            eprintln!(
                "Note: integration secrets were redacted. Re-run with --encrypt to include them."
            );
        }
        return Ok(());
    }

    let output = match args.output {
        Some(output) => output,
        None => {
            let dir = storage.paths().exports_dir();
            fs::create_dir_all(&dir).map_err(|e| {
                PackError::Export(format!("Failed to create {}: {}", dir.display(), e))
            })?;
            dir
        }
    };

    let report = export_to_path(storage, settings, &output, password.as_deref())?;
    print!("{}", format_export_report(&report));
    Ok(())
}

/// Handle `dashpack preview`
pub fn handle_preview(paths: &DashPaths, settings: &Settings, args: PreviewArgs) -> PackResult<()> {
    let verify = settings.verify_checksums && !args.skip_checksums;
    let summary = preview_path(&args.archive, &paths.scratch_dir(), verify)?;
    print!("{}", format_summary(&summary));
    Ok(())
}

/// Handle `dashpack import`. Returns whether the import was clean.
pub fn handle_import(storage: &Storage, settings: &Settings, args: ImportArgs) -> PackResult<bool> {
    let password = password::resolve(args.password, args.password_prompt, false)?;

    let options = ImportOptions {
        password: password.as_deref(),
        skip_checksums: args.skip_checksums || !settings.verify_checksums,
        replace_all: args.replace_all,
    };

    let importer = Importer::new(storage, CredentialVault::new(settings.key_derivation));
    let result = importer.import_from_path(&args.archive, &options)?;

    println!("Imported: {}", args.archive.display());
    println!();
    print!("{}", format_import_result(&result));
    Ok(result.is_clean())
}
