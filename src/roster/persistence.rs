use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::roster::{
    error::{RosterError, storage_error},
    types::CreatureRecord,
};

const PERSISTENCE_VERSION: u64 = 1;

#[derive(Debug, Clone)]
pub struct RosterPersistence {
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedRoster {
    version: u64,
    creatures: Vec<CreatureRecord>,
}

impl RosterPersistence {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Vec<CreatureRecord>>, RosterError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(storage_error(format!(
                    "failed to read roster state '{}': {err}",
                    self.path.display()
                )));
            }
        };

        let parsed: PersistedRoster = serde_json::from_str(&content).map_err(|err| {
            storage_error(format!(
                "failed to parse roster state '{}': {err}",
                self.path.display()
            ))
        })?;
        if parsed.version != PERSISTENCE_VERSION {
            return Err(storage_error(format!(
                "unsupported roster state version {} at '{}'",
                parsed.version,
                self.path.display()
            )));
        }

        Ok(Some(parsed.creatures))
    }

    pub fn save<'a>(
        &self,
        creatures: impl IntoIterator<Item = &'a CreatureRecord>,
    ) -> Result<(), RosterError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|err| {
            storage_error(format!(
                "failed to create roster state directory '{}': {err}",
                parent.display()
            ))
        })?;

        let persisted = PersistedRoster {
            version: PERSISTENCE_VERSION,
            creatures: creatures.into_iter().cloned().collect(),
        };

        let tmp_path = self.path.with_extension("tmp");
        let file = fs::File::create(&tmp_path).map_err(|err| {
            storage_error(format!(
                "failed to create roster temp file '{}': {err}",
                tmp_path.display()
            ))
        })?;
        {
            let mut writer = BufWriter::new(&file);
            serde_json::to_writer_pretty(&mut writer, &persisted).map_err(|err| {
                storage_error(format!(
                    "failed to serialize roster state '{}': {err}",
                    tmp_path.display()
                ))
            })?;
            writer
                .write_all(b"\n")
                .and_then(|()| writer.flush())
                .map_err(|err| {
                    storage_error(format!(
                        "failed to flush roster state '{}': {err}",
                        tmp_path.display()
                    ))
                })?;
        }
        file.sync_all().map_err(|err| {
            storage_error(format!(
                "failed to sync roster temp file '{}': {err}",
                tmp_path.display()
            ))
        })?;

        fs::rename(&tmp_path, &self.path).map_err(|err| {
            storage_error(format!(
                "failed to replace roster state '{}' from '{}': {err}",
                self.path.display(),
                tmp_path.display()
            ))
        })?;

        if let Ok(parent_file) = fs::File::open(parent) {
            let _ = parent_file.sync_all();
        }

        Ok(())
    }
}
