//! The stillcast pipeline: bounded ingestion of untrusted images, the
//! staged-input and output-directory lifecycle, and the encode orchestration
//! that drives the external encoder process.

pub mod encode;
pub mod fetch;
pub mod policy;
pub mod staged;
pub mod workspace;

pub use encode::{ClipOrchestrator, EncodeError, EncodeJob, Encoder, FfmpegEncoder, RenderedClip};
pub use fetch::{fetcher_for, FetchError, ImageFetcher};
pub use policy::{ImageKind, PolicyError};
pub use staged::StagedInput;
pub use workspace::{OutputWorkspace, WorkspaceError};
