//! Still-to-video encoding: the typed filter pipeline, codec profiles, the
//! encoder capability trait with its ffmpeg subprocess implementation, and the
//! orchestrator that sequences single and intro+main encodes.

mod encoder;
mod filter;
mod orchestrator;
mod profile;

pub use encoder::{EncodeError, EncodeJob, Encoder, FfmpegEncoder};
pub use filter::{FilterGraph, FilterStage, PAD_COLOR};
pub use orchestrator::{ClipOrchestrator, RenderedClip};
pub use profile::EncodeProfile;
