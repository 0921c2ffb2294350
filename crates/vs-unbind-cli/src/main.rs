mod commands;
mod logging;
mod progress;

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use colored::*;
use commands::Cli;
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{debug, error};
use vs_unbind_core::platform::{Elevator, NoElevation, SystemElevator};
use vs_unbind_core::{AppConfig, Error, UnbindEngine};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let mut config = match vs_unbind_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration, using defaults: {}", err);
            AppConfig::default()
        }
    };
    if args.no_elevate {
        config.elevate_on_access_denied = false;
    }
    let pause = config.pause_on_exit && !args.no_pause;

    if let Err(err) = run(&args, config) {
        for line in usage_error_lines(&err) {
            println!("{}", line.red());
        }
    }

    if pause {
        wait_for_enter();
    }
}

fn run(args: &Cli, config: AppConfig) -> anyhow::Result<()> {
    let root = target_folder(args.folder.as_deref())?;
    debug!("Target folder: {}", root.display());

    let elevator: Box<dyn Elevator> = if config.elevate_on_access_denied {
        match SystemElevator::for_current_exe(&root) {
            Ok(elevator) => Box::new(elevator),
            Err(err) => {
                debug!("Elevation unavailable: {}", err);
                Box::new(NoElevation)
            }
        }
    } else {
        Box::new(NoElevation)
    };

    UnbindEngine::new(config)
        .with_elevator(elevator)
        .run(&root, &CliReporter)?;
    Ok(())
}

/// The trimmed folder argument, or the executable's own folder.
fn target_folder(folder: Option<&str>) -> anyhow::Result<PathBuf> {
    match folder {
        Some(folder) => Ok(PathBuf::from(folder.trim())),
        None => {
            let exe = env::current_exe().context("Cannot locate the running executable")?;
            exe.parent()
                .map(Path::to_path_buf)
                .context("The running executable has no parent folder")
        }
    }
}

fn usage_error_lines(err: &anyhow::Error) -> Vec<String> {
    let first = match err.downcast_ref::<Error>() {
        Some(Error::EmptyFolder) => "ERROR: empty folder name".to_string(),
        Some(Error::FolderNotFound(_)) => "ERROR: Folder does not exist".to_string(),
        _ => format!("ERROR: {:#}", err),
    };
    vec![first, "Stopping ...".to_string()]
}

fn wait_for_enter() {
    print!("Press ENTER to exit ...");
    let mut input = String::new();
    if let Err(err) = io::stdout()
        .flush()
        .and_then(|_| io::stdin().read_line(&mut input))
    {
        debug!("Could not read from stdin: {}", err);
    }
}
