use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::domain::TaskRegistry;
use crate::snapshot::{TrackerRecord, from_record, to_record};

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    JsonDecode(serde_json::Error),
    JsonEncode(serde_json::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::JsonDecode(err) => write!(f, "failed to parse tracker file: {err}"),
            StorageError::JsonEncode(err) => write!(f, "failed to encode tracker file: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

pub fn load_tracker(path: &Path) -> Result<TaskRegistry, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(TaskRegistry::new()),
        Err(err) => return Err(StorageError::Io(err)),
    };

    if raw.trim().is_empty() {
        return Ok(TaskRegistry::new());
    }

    let record: TrackerRecord = serde_json::from_str(&raw).map_err(StorageError::JsonDecode)?;
    Ok(from_record(record))
}

pub fn save_tracker(path: &Path, registry: &TaskRegistry) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }
    }

    let blob = serde_json::to_string(&to_record(registry)).map_err(StorageError::JsonEncode)?;
    fs::write(path, blob).map_err(StorageError::Io)
}
