//! Staged inputs: validated local copies of source images.

use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::policy::ImageKind;

/// A local file holding validated image bytes, owned exclusively by the
/// request that created it. Never outlives the request.
#[derive(Debug)]
pub struct StagedInput {
    pub path: PathBuf,
    pub kind: ImageKind,
    pub len: u64,
}

impl StagedInput {
    /// Unique per-request location in the system temp namespace.
    pub fn allocate_path(kind: ImageKind) -> PathBuf {
        std::env::temp_dir().join(format!("stillcast-{}.{}", Uuid::new_v4(), kind.extension()))
    }

    /// Materialize an in-memory payload as a staged input.
    pub async fn from_bytes(data: &[u8], kind: ImageKind) -> std::io::Result<StagedInput> {
        let path = Self::allocate_path(kind);

        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        Ok(StagedInput {
            path,
            kind,
            len: data.len() as u64,
        })
    }

    /// Best-effort delete. Failures are logged and swallowed; the filesystem
    /// will eventually reclaim temp space.
    pub async fn release(self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to release staged input"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn from_bytes_writes_payload() {
        let staged = StagedInput::from_bytes(b"not really a png", ImageKind::Png)
            .await
            .unwrap();

        assert_eq!(staged.len, 16);
        assert!(staged.path.to_string_lossy().ends_with(".png"));
        let data = tokio::fs::read(&staged.path).await.unwrap();
        assert_eq!(data, b"not really a png");

        let path = staged.path.clone();
        staged.release().await;
        assert!(!tokio::fs::try_exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn release_tolerates_already_deleted_file() {
        let staged = StagedInput::from_bytes(b"x", ImageKind::Jpeg).await.unwrap();
        tokio::fs::remove_file(&staged.path).await.unwrap();
        staged.release().await;
    }

    #[test]
    fn allocated_paths_are_unique() {
        let a = StagedInput::allocate_path(ImageKind::Jpeg);
        let b = StagedInput::allocate_path(ImageKind::Jpeg);
        assert_ne!(a, b);
    }
}
