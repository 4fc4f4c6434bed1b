//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `electriscan_core` linkage without a UI.
//! - Optionally list the households found in a storage directory.

use electriscan_core::{PersistenceManager, StorageConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("electriscan_core ping={}", electriscan_core::ping());
    println!("electriscan_core version={}", electriscan_core::core_version());

    let Some(storage_dir) = std::env::args_os().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match list_households(storage_dir.into()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn list_households(storage_dir: std::path::PathBuf) -> Result<(), String> {
    let config = StorageConfig::new(storage_dir).map_err(|err| err.to_string())?;
    electriscan_core::logging::init_logging_for_storage(
        electriscan_core::default_log_level(),
        &config,
    )?;

    let manager = PersistenceManager::open(config).map_err(|err| err.to_string())?;
    for entry in manager.entries() {
        println!(
            "{}\t{}\t{}",
            entry.id,
            entry.display_name,
            entry.path.display()
        );
    }
    manager.tear_down().map_err(|err| err.to_string())
}
