use std::fs::{File, create_dir_all, rename, write};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::game_state::WorldSnapshot;

pub const SAVE_DIR: &str = "./data/save";
const WORLD_FILE: &str = "world.json";

pub fn world_path() -> PathBuf {
    Path::new(SAVE_DIR).join(WORLD_FILE)
}

/// Writes the snapshot to a scratch file and renames it into place, so a
/// crash mid-write cannot corrupt the previous snapshot.
pub fn save_world(path: &Path, snapshot: &WorldSnapshot) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let serialized = serde_json::to_string_pretty(snapshot)?;
    let scratch = path.with_extension("json.tmp");
    write(&scratch, serialized)?;
    rename(&scratch, path)?;
    Ok(())
}

pub fn load_world(path: &Path) -> Result<WorldSnapshot, AppError> {
    let file = File::open(path)?;
    let snapshot = serde_json::from_reader(file)?;
    Ok(snapshot)
}
