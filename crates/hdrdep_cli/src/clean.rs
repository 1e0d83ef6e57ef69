//! `hdrdep clean`: deletes the incremental snapshot, so the next check is a
//! cold start.

use hdrdep_cache::{IncrementalStore, SNAPSHOT_FILE};

use crate::pipeline::{load_project, open_module};
use crate::{CleanArgs, EngineArgs, GlobalArgs};

/// Runs the `hdrdep clean` command.
pub fn run(args: &CleanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let engine = EngineArgs {
        cache_dir: args.cache_dir.clone(),
        ..EngineArgs::default()
    };
    let module = open_module(&project, &engine, false)?;
    let settings = module.settings();

    let path = settings.cache_dir.join(SNAPSHOT_FILE);
    let removed = IncrementalStore::clean(&settings.cache_dir)?;
    if !global.quiet {
        if removed {
            eprintln!("     Removed {} snapshot {}", module.name(), path.display());
        } else {
            eprintln!("     Nothing to clean in {}", settings.cache_dir.display());
        }
    }
    Ok(0)
}
