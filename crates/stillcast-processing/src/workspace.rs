//! Output directory lifecycle.
//!
//! The directory is a single-writer resource: the purge-then-install sequence
//! runs under one lock, so a concurrent request can never interleave its purge
//! between another request's purge and install. In steady state the directory
//! holds at most one artifact.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use uuid::Uuid;

use stillcast_core::models::{VideoArtifact, ARTIFACT_EXTENSION};

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("Failed to prepare output directory {dir}: {source}")]
    Prepare {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install artifact {filename}: {source}")]
    Install {
        filename: String,
        #[source]
        source: std::io::Error,
    },
}

/// Owns the served output directory.
pub struct OutputWorkspace {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl OutputWorkspace {
    /// Create the manager, ensuring the directory exists. Idempotent.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| WorkspaceError::Prepare {
                dir: dir.clone(),
                source,
            })?;

        Ok(OutputWorkspace {
            dir,
            lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Delete every finished artifact. Used at startup to clear stale outputs.
    pub async fn purge(&self) {
        let _guard = self.lock.lock().await;
        self.purge_locked().await;
    }

    /// Move a finished temp encode into the directory as the new single
    /// artifact: purge, then rename, atomically with respect to other
    /// installs.
    pub async fn install(&self, finished: &Path, id: Uuid) -> Result<VideoArtifact, WorkspaceError> {
        let _guard = self.lock.lock().await;

        // A missing directory is not acceptable degraded behavior; recreate it.
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            return Err(WorkspaceError::Prepare {
                dir: self.dir.clone(),
                source: e,
            });
        }

        self.purge_locked().await;

        let artifact = VideoArtifact::new(id, &self.dir);
        move_file(finished, &artifact.path)
            .await
            .map_err(|source| WorkspaceError::Install {
                filename: artifact.filename.clone(),
                source,
            })?;

        tracing::info!(
            artifact_id = %artifact.id,
            path = %artifact.path.display(),
            "Artifact installed"
        );

        Ok(artifact)
    }

    /// Best-effort deletion of everything matching the artifact pattern.
    /// Failures are logged and swallowed; stale files are acceptable degraded
    /// behavior.
    async fn purge_locked(&self) {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "Failed to list output directory for purge");
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %self.dir.display(), error = %e, "Failed to read output directory entry");
                    break;
                }
            };

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXTENSION) {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Purged previous artifact");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to purge artifact");
                }
            }
        }
    }
}

/// Rename, falling back to copy+delete when the temp namespace is on a
/// different filesystem than the output directory.
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(_) => {
            tokio::fs::copy(from, to).await?;
            if let Err(e) = tokio::fs::remove_file(from).await {
                tracing::warn!(path = %from.display(), error = %e, "Failed to remove temp encode after copy");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn write_temp(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        tokio::fs::write(&path, contents).await.unwrap();
        path
    }

    async fn count_artifacts(dir: &Path) -> usize {
        let mut count = 0;
        let mut entries = tokio::fs::read_dir(dir).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            if entry.path().extension().and_then(|e| e.to_str()) == Some("mp4") {
                count += 1;
            }
        }
        count
    }

    #[tokio::test]
    async fn new_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("videos");
        OutputWorkspace::new(&path).await.unwrap();
        OutputWorkspace::new(&path).await.unwrap();
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn install_moves_encode_into_directory() {
        let out = tempdir().unwrap();
        let tmp = tempdir().unwrap();
        let workspace = OutputWorkspace::new(out.path()).await.unwrap();

        let finished = write_temp(tmp.path(), "final.mp4", b"video").await;
        let id = Uuid::new_v4();
        let artifact = workspace.install(&finished, id).await.unwrap();

        assert_eq!(artifact.id, id);
        assert!(artifact.path.is_file());
        assert!(!finished.exists());
        assert_eq!(tokio::fs::read(&artifact.path).await.unwrap(), b"video");
    }

    #[tokio::test]
    async fn install_purges_previous_artifacts() {
        let out = tempdir().unwrap();
        let tmp = tempdir().unwrap();
        let workspace = OutputWorkspace::new(out.path()).await.unwrap();

        let first = write_temp(tmp.path(), "a.mp4", b"first").await;
        let old = workspace.install(&first, Uuid::new_v4()).await.unwrap();

        let second = write_temp(tmp.path(), "b.mp4", b"second").await;
        let new = workspace.install(&second, Uuid::new_v4()).await.unwrap();

        assert!(!old.path.exists());
        assert!(new.path.is_file());
        assert_eq!(count_artifacts(out.path()).await, 1);
    }

    #[tokio::test]
    async fn purge_leaves_non_artifact_files_alone() {
        let out = tempdir().unwrap();
        let workspace = OutputWorkspace::new(out.path()).await.unwrap();

        write_temp(out.path(), "stale.mp4", b"stale").await;
        let keep = write_temp(out.path(), "notes.txt", b"keep").await;

        workspace.purge().await;

        assert_eq!(count_artifacts(out.path()).await, 0);
        assert!(keep.is_file());
    }

    #[tokio::test]
    async fn install_recreates_missing_directory() {
        let out = tempdir().unwrap();
        let tmp = tempdir().unwrap();
        let videos = out.path().join("videos");
        let workspace = OutputWorkspace::new(&videos).await.unwrap();

        tokio::fs::remove_dir_all(&videos).await.unwrap();

        let finished = write_temp(tmp.path(), "final.mp4", b"video").await;
        let artifact = workspace.install(&finished, Uuid::new_v4()).await.unwrap();
        assert!(artifact.path.is_file());
    }

    #[tokio::test]
    async fn purge_tolerates_missing_directory() {
        let out = tempdir().unwrap();
        let videos = out.path().join("videos");
        let workspace = OutputWorkspace::new(&videos).await.unwrap();
        tokio::fs::remove_dir_all(&videos).await.unwrap();
        workspace.purge().await;
    }

    #[tokio::test]
    async fn concurrent_installs_leave_exactly_one_artifact() {
        let out = tempdir().unwrap();
        let tmp = tempdir().unwrap();
        let workspace = std::sync::Arc::new(OutputWorkspace::new(out.path()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..8 {
            let workspace = workspace.clone();
            let finished = write_temp(tmp.path(), &format!("clip-{i}.mp4"), b"video").await;
            handles.push(tokio::spawn(async move {
                workspace.install(&finished, Uuid::new_v4()).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(count_artifacts(out.path()).await, 1);
    }
}
