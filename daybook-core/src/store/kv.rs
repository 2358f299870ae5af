//! Durable local key-value layer.
//!
//! One serialized blob per key. Writes are synchronous and unbuffered;
//! a failed write surfaces to the caller immediately.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::error::DaybookResult;

pub trait KeyValue {
    fn get(&self, key: &str) -> DaybookResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> DaybookResult<()>;
}

/// File-backed store: `<dir>/<key>.json`, one document per key.
pub struct JsonFileKv {
    dir: PathBuf,
}

impl JsonFileKv {
    pub fn open(dir: PathBuf) -> DaybookResult<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValue for JsonFileKv {
    fn get(&self, key: &str) -> DaybookResult<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> DaybookResult<()> {
        fs::write(self.path(key), value)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryKv {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValue for MemoryKv {
    fn get(&self, key: &str) -> DaybookResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> DaybookResult<()> {
        self.entries.borrow_mut().insert(key.into(), value.into());
        Ok(())
    }
}
