use std::fs;
use std::path::{Path, PathBuf};

use crate::io::config_io;
use crate::io::store::{JsonDirStore, StoreError};
use crate::model::config::StoreConfig;

/// Name of the directory that marks a taskboard root
pub const BOARD_DIR: &str = "taskboard";

/// A taskboard opened from disk
#[derive(Debug)]
pub struct Board {
    /// Directory containing `taskboard/`
    pub root: PathBuf,
    /// Path to the `taskboard/` directory
    pub board_dir: PathBuf,
    /// Parsed config.toml
    pub config: StoreConfig,
    /// Store over `taskboard/data/`
    pub store: JsonDirStore,
}

/// Discover the board by walking up from the given directory, looking for
/// a `taskboard/` subdirectory with a `config.toml`.
pub fn discover_board(start: &Path) -> Result<PathBuf, StoreError> {
    let mut current = start.to_path_buf();
    loop {
        let board_dir = current.join(BOARD_DIR);
        if board_dir.is_dir() && board_dir.join("config.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(StoreError::NotABoard);
        }
    }
}

/// Open the board rooted at `root`.
pub fn open_board(root: &Path) -> Result<Board, StoreError> {
    let board_dir = root.join(BOARD_DIR);
    if !board_dir.is_dir() {
        return Err(StoreError::NotABoard);
    }
    let (config, _) = config_io::read_config(&board_dir)?;
    let data_dir = board_dir.join("data");
    fs::create_dir_all(&data_dir).map_err(|source| StoreError::WriteError {
        path: data_dir.clone(),
        source,
    })?;

    Ok(Board {
        root: root.to_path_buf(),
        board_dir,
        config,
        store: JsonDirStore::new(data_dir),
    })
}

/// Create `taskboard/` with a default config under `root`.
pub fn init_board(root: &Path, name: &str, force: bool) -> Result<Board, StoreError> {
    let board_dir = root.join(BOARD_DIR);
    if board_dir.join("config.toml").exists() && !force {
        return Err(StoreError::AlreadyInitialized(root.to_path_buf()));
    }
    let data_dir = board_dir.join("data");
    fs::create_dir_all(&data_dir).map_err(|source| StoreError::WriteError {
        path: data_dir.clone(),
        source,
    })?;
    config_io::write_default_config(&board_dir, name)?;
    tracing::info!(root = %root.display(), "initialized taskboard");
    open_board(root)
}
