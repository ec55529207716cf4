use dirs::home_dir;
use std::{env, path::PathBuf};

use crate::storage::StorePaths;

const DEFAULT_DIR_NAME: &str = ".calorie_core";
const HOME_ENV: &str = "CALORIE_CORE_HOME";

/// Returns the application data directory, defaulting to `~/.calorie_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Store and backup locations inside the application data directory.
pub fn store_paths() -> StorePaths {
    StorePaths::under(&app_data_dir())
}
