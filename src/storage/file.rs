//! File-backed storage: `<root>/<key>.json`

use std::path::{Path, PathBuf};

use super::SessionStorage;
use crate::error::{WalletError, WalletResult};

const EXTENSION: &str = "json";

/// `$CRIBWALLET_ROOT`, else the platform local data dir, plus `cribwallet`.
pub fn default_root() -> PathBuf {
    std::env::var("CRIBWALLET_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cribwallet")
        })
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn open(root: impl Into<PathBuf>) -> WalletResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| WalletError::Storage(format!("mkdir {}: {e}", root.display())))?;
        Ok(Self { root })
    }

    pub fn open_default() -> WalletResult<Self> {
        Self::open(default_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> WalletResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(WalletError::Storage(format!("invalid key: {key:?}")));
        }
        Ok(self.root.join(format!("{key}.{EXTENSION}")))
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> WalletResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WalletError::Storage(format!("read {}: {e}", path.display()))),
        }
    }

    fn set(&self, key: &str, value: &str) -> WalletResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, value)
            .map_err(|e| WalletError::Storage(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| WalletError::Storage(format!("rename {}: {e}", path.display())))
    }

    fn remove(&self, key: &str) -> WalletResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WalletError::Storage(format!("remove {}: {e}", path.display()))),
        }
    }

    fn clear(&self) -> WalletResult<()> {
        let entries = std::fs::read_dir(&self.root)
            .map_err(|e| WalletError::Storage(format!("list {}: {e}", self.root.display())))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(EXTENSION) {
                std::fs::remove_file(&path)
                    .map_err(|e| WalletError::Storage(format!("remove {}: {e}", path.display())))?;
            }
        }
        Ok(())
    }
}
