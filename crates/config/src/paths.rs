//! Data directory layout

use std::path::PathBuf;

/// Root data directory (~/.agenthub)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .expect("failed to locate home directory")
        .join(".agenthub")
}

/// Config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Default SQLite database location
pub fn store_path() -> PathBuf {
    data_dir().join("agenthub.db")
}

/// Ensure directory exists
pub async fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}
