// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed blob store
//!
//! One file per key under a root directory. Version tokens are content
//! hashes. Conditional writes hold an exclusive advisory lock on a sidecar
//! `.lock` file for the compare-and-write, and replace the blob by
//! renaming a temp file, so readers never see a partial write.

use crate::blob::{Blob, BlobError, BlobStore, VersionToken};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

#[derive(Clone, Debug)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Open a store at the given path, creating it if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn read_blocking(path: &Path, key: &str) -> Result<Blob, BlobError> {
        let lock = open_lock(path)?;
        FileExt::lock_shared(&lock)?;
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BlobError::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Blob {
            version: VersionToken::of_content(&bytes),
            bytes,
        })
    }

    fn write_blocking(
        path: &Path,
        key: &str,
        bytes: &[u8],
        if_match: Option<&VersionToken>,
    ) -> Result<VersionToken, BlobError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock = open_lock(path)?;
        lock.lock_exclusive()?;

        let current = match fs::read(path) {
            Ok(existing) => Some(VersionToken::of_content(&existing)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        let matches = match (&current, if_match) {
            (None, None) => true,
            (Some(current), Some(expected)) => current == expected,
            _ => false,
        };
        if !matches {
            return Err(BlobError::PreconditionFailed(key.to_string()));
        }

        let tmp = sidecar(path, "tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(VersionToken::of_content(bytes))
    }
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn open_lock(path: &Path) -> Result<File, BlobError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(sidecar(path, "lock"))?)
}

fn join_error(e: tokio::task::JoinError) -> BlobError {
    BlobError::Io(io::Error::other(e))
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> Result<Blob, BlobError> {
        let path = self.path_for(key)?;
        let key = key.to_string();
        tokio::task::spawn_blocking(move || Self::read_blocking(&path, &key))
            .await
            .map_err(join_error)?
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        if_match: Option<&VersionToken>,
    ) -> Result<VersionToken, BlobError> {
        let path = self.path_for(key)?;
        let key = key.to_string();
        let if_match = if_match.cloned();
        tokio::task::spawn_blocking(move || {
            Self::write_blocking(&path, &key, &bytes, if_match.as_ref())
        })
        .await
        .map_err(join_error)?
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
