//! Store commands: init, config and status

use crate::config::{paths::DashPaths, settings::Settings};
use crate::display::format_store_counts;
use crate::error::PackResult;
use crate::storage::Storage;

/// Handle `dashpack init`
pub fn handle_init(paths: &DashPaths, settings: &Settings) -> PackResult<()> {
    if paths.is_initialized() {
        println!("dashpack is already initialized at: {}", paths.base_dir().display());
        return Ok(());
    }

    println!("Initializing dashpack at: {}", paths.base_dir().display());
    let storage = Storage::new(paths.clone())?;
    storage.save_all()?;
    settings.save(paths)?;
    println!("Initialization complete!");
    Ok(())
}

/// Handle `dashpack config`
pub fn handle_config(paths: &DashPaths, settings: &Settings) -> PackResult<()> {
    println!("dashpack Configuration");
    println!("======================");
    println!("Base directory:    {}", paths.base_dir().display());
    println!("Data directory:    {}", paths.data_dir().display());
    println!("Uploads directory: {}", paths.uploads_dir().display());
    println!("Scratch directory: {}", paths.scratch_dir().display());
    println!();
    println!("Settings:");
    println!("  Instance name:    {}", settings.instance_name);
    println!("  Export prefix:    {}", settings.export_prefix);
    println!("  Verify checksums: {}", settings.verify_checksums);
    println!(
        "  Key derivation:   argon2id m={} t={} p={}",
        settings.key_derivation.memory_cost,
        settings.key_derivation.time_cost,
        settings.key_derivation.parallelism
    );
    Ok(())
}

/// Handle `dashpack status`
pub fn handle_status(storage: &Storage) -> PackResult<()> {
    let counts = storage.counts()?;
    print!("{}", format_store_counts(&counts));
    Ok(())
}
