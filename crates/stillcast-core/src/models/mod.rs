mod artifact;
mod clip;

pub use artifact::{artifact_filename, VideoArtifact, ARTIFACT_EXTENSION, PUBLIC_VIDEO_PREFIX};
pub use clip::{ClipDefaults, ClipParams};
