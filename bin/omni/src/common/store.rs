//! A [`CredentialStore`] backed by a directory on disk.

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use clap::Args;
use omni_account::{CredentialStore, CredentialStoreError};
use tracing::{debug, trace};

use super::CliError;

/// Credential store location, shared by commands that persist state.
#[derive(Debug, Clone, Default, Args)]
pub struct StoreArgs {
    /// Credential store directory. Defaults to `<data dir>/omni`.
    #[arg(long = "store", env = "OMNI_STORE")]
    pub store: Option<PathBuf>,
}

impl StoreArgs {
    /// The configured directory, or the platform default.
    pub fn dir(&self) -> Result<PathBuf, CliError> {
        match &self.store {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir().map(|dir| dir.join("omni")).ok_or(CliError::NoDataDir),
        }
    }

    /// Opens the store, creating its directory if needed.
    pub fn open(&self) -> Result<FileCredentialStore, CliError> {
        FileCredentialStore::open(self.dir()?)
    }
}

/// Keeps every item in its own file at `<root>/<service>/<account>`.
///
/// Files are kept owner-only on unix, including items that existed before.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    root: PathBuf,
}

impl FileCredentialStore {
    /// Opens the store rooted at `root`, creating the directory if it does not exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CliError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|source| CliError::StoreInit { path: root.clone(), source })?;
        debug!(target: "omni::store", root = %root.display(), "credential store opened");
        Ok(Self { root })
    }

    /// The store directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn item_path(&self, account: &str, service: &str) -> Result<PathBuf, CredentialStoreError> {
        let valid = |part: &str| {
            !part.is_empty() &&
                part != "." &&
                part != ".." &&
                !part.contains(['/', '\\', '\0'])
        };
        if !valid(account) || !valid(service) {
            return Err(CredentialStoreError::InvalidData);
        }
        Ok(self.root.join(service).join(account))
    }
}

fn status(err: &std::io::Error) -> CredentialStoreError {
    match err.kind() {
        ErrorKind::NotFound => CredentialStoreError::DataNotFound,
        _ => CredentialStoreError::UnexpectedStatus(err.raw_os_error().unwrap_or(-1)),
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, data: &[u8], account: &str, service: &str) -> Result<(), CredentialStoreError> {
        let path = self.item_path(account, service)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| status(&e))?;
        }
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path).map_err(|e| status(&e))?;
        // `mode` only applies on creation; an existing item keeps its bits otherwise.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600)).map_err(|e| status(&e))?;
        }
        file.write_all(data).map_err(|e| status(&e))?;
        trace!(target: "omni::store", account, service, len = data.len(), "item saved");
        Ok(())
    }

    fn read(&self, account: &str, service: &str) -> Result<Vec<u8>, CredentialStoreError> {
        let path = self.item_path(account, service)?;
        fs::read(path).map_err(|e| status(&e))
    }

    fn delete(&self, account: &str, service: &str) -> Result<(), CredentialStoreError> {
        let path = self.item_path(account, service)?;
        fs::remove_file(path).map_err(|e| status(&e))?;
        trace!(target: "omni::store", account, service, "item deleted");
        Ok(())
    }
}
