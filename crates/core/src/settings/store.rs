//! Durable key-value backends.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::Result;

/// Process-wide persisted settings, keyed by string.
///
/// Implementations must tolerate concurrent readers; writes only happen from
/// the control task.
pub trait KeyValueStore: Send + Sync {
	fn get(&self, key: &str) -> Option<Value>;

	fn set(&self, key: &str, value: Value) -> Result<()>;

	fn remove(&self, key: &str) -> Result<()>;

	/// Returns every stored entry, for diagnostics.
	fn entries(&self) -> BTreeMap<String, Value>;
}

/// Volatile store, used by tests and by hosts that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Option<Value> {
		self.entries.lock().get(key).cloned()
	}

	fn set(&self, key: &str, value: Value) -> Result<()> {
		self.entries.lock().insert(key.to_string(), value);
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<()> {
		self.entries.lock().remove(key);
		Ok(())
	}

	fn entries(&self) -> BTreeMap<String, Value> {
		self.entries.lock().clone()
	}
}

/// JSON-file backed store with write-through semantics.
///
/// A missing or unreadable file loads as empty; prior state is treated as
/// absent rather than as an error.
#[derive(Debug)]
pub struct FileStore {
	path: PathBuf,
	entries: Mutex<BTreeMap<String, Value>>,
}

impl FileStore {
	pub fn load(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let entries = fs::read_to_string(&path)
			.ok()
			.and_then(|content| serde_json::from_str(&content).ok())
			.unwrap_or_default();
		Self {
			path,
			entries: Mutex::new(entries),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn save(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		let json = serde_json::to_string_pretty(entries)?;
		fs::write(&self.path, json)?;
		Ok(())
	}
}

impl KeyValueStore for FileStore {
	fn get(&self, key: &str) -> Option<Value> {
		self.entries.lock().get(key).cloned()
	}

	fn set(&self, key: &str, value: Value) -> Result<()> {
		let mut entries = self.entries.lock();
		entries.insert(key.to_string(), value);
		self.save(&entries)
	}

	fn remove(&self, key: &str) -> Result<()> {
		let mut entries = self.entries.lock();
		if entries.remove(key).is_some() {
			self.save(&entries)?;
		}
		Ok(())
	}

	fn entries(&self) -> BTreeMap<String, Value> {
		self.entries.lock().clone()
	}
}
