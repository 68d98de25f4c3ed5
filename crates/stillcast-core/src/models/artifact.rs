//! The finished, servable output video.

use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

/// File extension shared by every artifact; the purge pattern matches on it.
pub const ARTIFACT_EXTENSION: &str = "mp4";

/// Stable path prefix under which artifacts are served.
pub const PUBLIC_VIDEO_PREFIX: &str = "/videos";

/// Derive the on-disk filename for an artifact identifier.
pub fn artifact_filename(id: Uuid) -> String {
    format!("{}.{}", id, ARTIFACT_EXTENSION)
}

/// A finished clip in the output directory. Immutable once installed.
#[derive(Clone, Debug, Serialize)]
pub struct VideoArtifact {
    /// Random identifier; never sequential or guessable.
    pub id: Uuid,
    pub filename: String,
    /// Absolute location inside the output directory.
    pub path: PathBuf,
    /// Public-facing relative path.
    pub public_path: String,
}

impl VideoArtifact {
    pub fn new(id: Uuid, output_dir: &Path) -> Self {
        let filename = artifact_filename(id);
        VideoArtifact {
            id,
            path: output_dir.join(&filename),
            public_path: format!("{}/{}", PUBLIC_VIDEO_PREFIX, filename),
            filename,
        }
    }

    /// Absolute URL under the configured public base.
    pub fn public_url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.public_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_derives_from_id() {
        let id = Uuid::new_v4();
        let artifact = VideoArtifact::new(id, Path::new("/srv/videos"));
        assert_eq!(artifact.filename, format!("{}.mp4", id));
        assert_eq!(artifact.path, Path::new("/srv/videos").join(&artifact.filename));
        assert_eq!(artifact.public_path, format!("/videos/{}.mp4", id));
    }

    #[test]
    fn public_url_joins_without_double_slash() {
        let artifact = VideoArtifact::new(Uuid::new_v4(), Path::new("videos"));
        let url = artifact.public_url("http://localhost:3000/");
        assert!(url.starts_with("http://localhost:3000/videos/"));
        assert!(!url.contains("//videos"));
    }

    #[test]
    fn ids_are_unique_per_artifact() {
        let a = VideoArtifact::new(Uuid::new_v4(), Path::new("videos"));
        let b = VideoArtifact::new(Uuid::new_v4(), Path::new("videos"));
        assert_ne!(a.id, b.id);
        assert_ne!(a.filename, b.filename);
    }
}
