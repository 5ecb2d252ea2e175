//! On-disk keystore store
//!
//! One keystore file per validator name:
//!
//! ```text
//! <datadir>/validators/<network>/<name>/voting-keystore.json
//! ```
//!
//! The directory tree is the source of truth. The sibling
//! `validator_definitions.yml` is a cache the validator binary rebuilds
//! lazily, so every mutation deletes it best-effort; a failed deletion is
//! a warning, never a caller error. Note the cache path does not include
//! the network segment while keystore files do.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::types::Keystore;

/// File name of a validator's keystore inside its directory.
pub const KEYSTORE_FILE: &str = "voting-keystore.json";

const DEFINITIONS_FILE: &str = "validator_definitions.yml";

/// A validator name with its keystore public key, as returned by listings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ValidatorInfo {
    pub name: String,
    pub pubkey: String,
}

/// CRUD over the keystore tree of one `(datadir, network)` pair.
///
/// Constructed per request from the parsed child flags; holds no open
/// handles and no locks. Concurrent mutations of the same name race at
/// the filesystem layer, last write wins.
pub struct KeystoreStore {
    datadir: PathBuf,
    network: String,
}

impl KeystoreStore {
    pub fn new(datadir: impl Into<PathBuf>, network: impl Into<String>) -> Self {
        Self {
            datadir: datadir.into(),
            network: network.into(),
        }
    }

    fn validators_root(&self) -> PathBuf {
        self.datadir.join("validators")
    }

    fn network_dir(&self) -> PathBuf {
        self.validators_root().join(&self.network)
    }

    fn keystore_path(&self, name: &str) -> PathBuf {
        self.network_dir().join(name).join(KEYSTORE_FILE)
    }

    /// Write a new keystore. Fails if one already exists under `name`.
    pub async fn create(&self, name: &str, keystore: &[u8]) -> Result<()> {
        check_name(name)?;
        let path = self.keystore_path(name);
        match fs::metadata(&path).await {
            Ok(_) => {
                return Err(Error::AlreadyExists(
                    "Validator keystore already exists".to_string(),
                ))
            }
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            Err(_) => {}
        }
        self.write_keystore(&path, keystore).await?;
        self.invalidate_definitions().await;
        Ok(())
    }

    /// Overwrite an existing keystore. Fails if none exists under `name`.
    pub async fn update(&self, name: &str, keystore: &[u8]) -> Result<()> {
        check_name(name)?;
        let path = self.keystore_path(name);
        match fs::metadata(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(
                    "Validator keystore does not exist".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        }
        self.write_keystore(&path, keystore).await?;
        self.invalidate_definitions().await;
        Ok(())
    }

    /// Remove the whole directory of `name`, keystore included.
    pub async fn delete(&self, name: &str) -> Result<()> {
        check_name(name)?;
        let dir = self.network_dir().join(name);
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Error::Io(std::io::Error::new(
                    ErrorKind::Other,
                    "expected validator definition to be a directory",
                )))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(
                    "Validator definition does not exist".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        }
        fs::remove_dir_all(&dir).await?;
        self.invalidate_definitions().await;
        Ok(())
    }

    /// Read one validator's `{name, pubkey}`.
    pub async fn get(&self, name: &str) -> Result<ValidatorInfo> {
        check_name(name)?;
        let path = self.keystore_path(name);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(
                    "Validator keystore not found".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        };
        let keystore: Keystore = serde_json::from_slice(&data)?;
        Ok(ValidatorInfo {
            name: name.to_string(),
            pubkey: keystore.pubkey,
        })
    }

    /// Walk the network directory and collect every readable keystore.
    ///
    /// An absent directory yields an empty listing. Entries that cannot be
    /// read or parsed are skipped with a warning so one corrupt keystore
    /// does not hide the rest.
    pub async fn list(&self) -> Result<Vec<ValidatorInfo>> {
        let dir = self.network_dir();
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Error::Io(std::io::Error::new(
                    ErrorKind::Other,
                    "validators path is not a directory",
                )))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        }

        let mut found = Vec::new();
        let mut pending = vec![dir];
        while let Some(current) = pending.pop() {
            let mut entries = fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if entry.file_name() == KEYSTORE_FILE {
                    match read_entry(&path).await {
                        Ok(info) => found.push(info),
                        Err(e) => warn!("Skipping keystore at {}: {}", path.display(), e),
                    }
                }
            }
        }
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn write_keystore(&self, path: &Path, keystore: &[u8]) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
            set_mode(dir, 0o755).await?;
        }
        fs::write(path, keystore).await?;
        set_mode(path, 0o644).await?;
        Ok(())
    }

    /// Delete the definitions cache. Best-effort: absence is fine, any
    /// other failure is logged at warn and swallowed.
    pub async fn invalidate_definitions(&self) {
        let path = self.validators_root().join(DEFINITIONS_FILE);
        match fs::remove_file(&path).await {
            Ok(()) => debug!("Invalidated {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete {}: {}", path.display(), e),
        }
    }
}

async fn read_entry(path: &Path) -> Result<ValidatorInfo> {
    let name = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Error::Io(std::io::Error::new(
                ErrorKind::InvalidData,
                "keystore path has no parent directory name",
            ))
        })?;
    let data = fs::read(path).await?;
    let keystore: Keystore = serde_json::from_slice(&data)?;
    Ok(ValidatorInfo {
        name: name.to_string(),
        pubkey: keystore.pubkey,
    })
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Reject names that could escape the network directory. Checked before
/// any filesystem access.
fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::BadRequest(
            "Missing required field: name".to_string(),
        ));
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(Error::BadRequest(format!(
            "invalid validator name: {name:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NETWORK: &str = "mainnet";

    fn fixture_keystore(pubkey: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "crypto": {
                "kdf": {"function": "scrypt", "params": {"n": 262144}},
                "checksum": {"function": "sha256", "params": {}, "message": "ab"},
                "cipher": {"function": "aes-128-ctr", "params": {"iv": "cd"}, "message": "ef"}
            },
            "path": "m/12381/3600/0/0/0",
            "uuid": "9f1b6cc6-4ac0-4b79-b3d5-344a69fbc2b1",
            "version": 4,
            "pubkey": pubkey
        }))
        .unwrap()
    }

    fn store(dir: &TempDir) -> KeystoreStore {
        KeystoreStore::new(dir.path(), NETWORK)
    }

    #[tokio::test]
    async fn create_then_get_and_list() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.create("v1", &fixture_keystore("0xabc")).await.unwrap();

        let one = store.get("v1").await.unwrap();
        assert_eq!(one.name, "v1");
        assert_eq!(one.pubkey, "0xabc");

        let listing = store.list().await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0], one);
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.create("v1", &fixture_keystore("0xabc")).await.unwrap();
        let err = store
            .create("v1", &fixture_keystore("0xdef"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn update_requires_existing_keystore() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let err = store
            .update("ghost", &fixture_keystore("0xabc"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        store.create("v1", &fixture_keystore("0xabc")).await.unwrap();
        store.update("v1", &fixture_keystore("0xdef")).await.unwrap();
        assert_eq!(store.get("v1").await.unwrap().pubkey, "0xdef");
    }

    #[tokio::test]
    async fn delete_removes_entry_and_directory() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.create("v1", &fixture_keystore("0xabc")).await.unwrap();
        store.delete("v1").await.unwrap();

        assert!(matches!(
            store.get("v1").await.unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(store.list().await.unwrap().is_empty());
        assert!(!dir.path().join("validators").join(NETWORK).join("v1").exists());
    }

    #[tokio::test]
    async fn delete_of_missing_entry_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = store(&dir).delete("ghost").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn list_of_absent_network_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_skips_unparseable_entries() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.create("good", &fixture_keystore("0xabc")).await.unwrap();

        let bad_dir = dir.path().join("validators").join(NETWORK).join("bad");
        std::fs::create_dir_all(&bad_dir).unwrap();
        std::fs::write(bad_dir.join(KEYSTORE_FILE), b"not json").unwrap();

        let listing = store.list().await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name, "good");
    }

    #[tokio::test]
    async fn mutations_invalidate_the_definitions_cache() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let cache = dir.path().join("validators").join(DEFINITIONS_FILE);

        std::fs::create_dir_all(cache.parent().unwrap()).unwrap();
        std::fs::write(&cache, b"---").unwrap();
        store.create("v1", &fixture_keystore("0xabc")).await.unwrap();
        assert!(!cache.exists());

        std::fs::write(&cache, b"---").unwrap();
        store.update("v1", &fixture_keystore("0xdef")).await.unwrap();
        assert!(!cache.exists());

        std::fs::write(&cache, b"---").unwrap();
        store.delete("v1").await.unwrap();
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn unsafe_names_are_rejected_before_touching_disk() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        for name in ["..", ".", "a/b", "a\\b", "../escape", ""] {
            let err = store.create(name, &fixture_keystore("0xabc")).await.unwrap_err();
            assert!(matches!(err, Error::BadRequest(_)), "name {name:?}");
        }
        // Nothing was created anywhere under the datadir.
        assert!(!dir.path().join("validators").exists());
    }
}
