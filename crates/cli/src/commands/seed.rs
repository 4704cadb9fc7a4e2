use std::path::PathBuf;

use fashiondesk_db::OrderStore;

use crate::commands::{exit, load_config, runtime, CommandResult};

pub fn run(path: Option<PathBuf>, force: bool) -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let Some(path) = path.or(config.store.snapshot_path) else {
        return CommandResult::failure(
            "seed",
            "missing_snapshot_path",
            "no snapshot path given; pass --path or set store.snapshot_path",
            exit::USAGE,
        );
    };

    if path.exists() && !force {
        return CommandResult::failure(
            "seed",
            "snapshot_exists",
            format!("`{}` already exists; pass --force to overwrite it", path.display()),
            exit::STORE,
        );
    }

    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    match runtime.block_on(OrderStore::seeded().save_snapshot(&path)) {
        Ok(count) => CommandResult::success(
            "seed",
            format!("wrote {count} seed orders to `{}`", path.display()),
        ),
        Err(error) => {
            CommandResult::failure("seed", "snapshot_write", error.to_string(), exit::STORE)
        }
    }
}
