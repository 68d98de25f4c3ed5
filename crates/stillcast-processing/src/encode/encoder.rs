//! Encoder capability boundary.
//!
//! The orchestrator only needs something that applies a filter pipeline and
//! codec profile to input files and produces an output file, or fails with a
//! structured error. [`FfmpegEncoder`] does that by driving an external
//! ffmpeg process; tests substitute their own implementation.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::filter::FilterGraph;
use super::profile::EncodeProfile;

/// Silent source feeding the audio track; there is no real audio.
const SILENT_AUDIO_SOURCE: &str = "anullsrc=channel_layout=stereo:sample_rate=44100";

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Input file missing or unreadable: {0}")]
    MissingInput(PathBuf),

    #[error("Failed to spawn encoder '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Encoder failed ({status}): {stderr}")]
    Process { status: String, stderr: String },

    #[error("Codec '{0}' is not supported by the encoder")]
    UnsupportedCodec(String),

    #[error("Encode workspace error: {0}")]
    Io(#[from] std::io::Error),
}

/// One encoder invocation.
#[derive(Debug)]
pub enum EncodeJob {
    /// Loop a still image into a clip of the given duration, through the
    /// filter pipeline, with a generated silent audio track.
    Still {
        input: PathBuf,
        output: PathBuf,
        filter: FilterGraph,
        fps: u32,
        duration_secs: u32,
        profile: EncodeProfile,
    },
    /// Stream-copy concatenation of previously encoded segments listed in
    /// `list_file`. No re-encode; segments must share codec parameters.
    Concat { list_file: PathBuf, output: PathBuf },
}

#[async_trait]
pub trait Encoder: Send + Sync {
    async fn run(&self, job: EncodeJob) -> Result<(), EncodeError>;
}

/// Drives the external ffmpeg binary.
pub struct FfmpegEncoder {
    ffmpeg_path: String,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Startup probe: the binary must run and list the configured codec.
    /// A broken encoder configuration is fatal at boot, not per-request.
    pub async fn verify(&self, codec: &str) -> Result<(), EncodeError> {
        let output = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-encoders"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| EncodeError::Spawn {
                command: self.ffmpeg_path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(EncodeError::Process {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let encoders = String::from_utf8_lossy(&output.stdout);
        if !encoders
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(codec))
        {
            return Err(EncodeError::UnsupportedCodec(codec.to_string()));
        }

        Ok(())
    }

    fn still_args(
        input: &Path,
        output: &Path,
        filter: &FilterGraph,
        fps: u32,
        duration_secs: u32,
        profile: &EncodeProfile,
    ) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-loop".to_string(),
            "1".to_string(),
            "-framerate".to_string(),
            fps.to_string(),
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            SILENT_AUDIO_SOURCE.to_string(),
            "-vf".to_string(),
            filter.render(),
        ];
        args.extend(profile.video_args());
        args.push("-pix_fmt".to_string());
        args.push("yuv420p".to_string());
        args.extend(profile.audio_args());
        args.extend_from_slice(&[
            "-t".to_string(),
            duration_secs.to_string(),
            "-shortest".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.to_string_lossy().into_owned(),
        ]);
        args
    }

    fn concat_args(list_file: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list_file.to_string_lossy().into_owned(),
            "-c".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }

    async fn run_ffmpeg(&self, args: &[String]) -> Result<(), EncodeError> {
        let output = Command::new(&self.ffmpeg_path)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| EncodeError::Spawn {
                command: self.ffmpeg_path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(EncodeError::Process {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn run(&self, job: EncodeJob) -> Result<(), EncodeError> {
        match job {
            EncodeJob::Still {
                input,
                output,
                filter,
                fps,
                duration_secs,
                profile,
            } => {
                if !tokio::fs::try_exists(&input).await.unwrap_or(false) {
                    return Err(EncodeError::MissingInput(input));
                }

                let args =
                    Self::still_args(&input, &output, &filter, fps, duration_secs, &profile);
                tracing::debug!(
                    input = %input.display(),
                    output = %output.display(),
                    fps,
                    duration_secs,
                    "Encoding still to clip"
                );
                self.run_ffmpeg(&args).await
            }
            EncodeJob::Concat { list_file, output } => {
                if !tokio::fs::try_exists(&list_file).await.unwrap_or(false) {
                    return Err(EncodeError::MissingInput(list_file));
                }

                let args = Self::concat_args(&list_file, &output);
                tracing::debug!(
                    list_file = %list_file.display(),
                    output = %output.display(),
                    "Concatenating segments"
                );
                self.run_ffmpeg(&args).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stillcast_core::models::ClipParams;
    use stillcast_core::EncodeSettings;

    fn settings() -> EncodeSettings {
        EncodeSettings {
            codec: "libx264".to_string(),
            crf: 28,
            preset: "veryfast".to_string(),
            max_bitrate_kbps: 2500,
            bufsize_kbps: 5000,
            gop: 48,
            audio_bitrate_kbps: 64,
        }
    }

    fn still_args_for(profile: EncodeProfile) -> Vec<String> {
        let params = ClipParams {
            duration_secs: 5,
            fps: 24,
            width: 720,
            height: 1280,
        };
        FfmpegEncoder::still_args(
            Path::new("/tmp/in.jpg"),
            Path::new("/tmp/out.mp4"),
            &FilterGraph::fit_and_pad(&params),
            params.fps,
            params.duration_secs,
            &profile,
        )
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let i = args
            .iter()
            .position(|a| a == flag)
            .unwrap_or_else(|| panic!("missing {}", flag));
        &args[i + 1]
    }

    #[test]
    fn still_args_loop_the_image_at_the_target_fps() {
        let args = still_args_for(EncodeProfile::baseline(&settings()));
        assert_eq!(value_after(&args, "-loop"), "1");
        assert_eq!(value_after(&args, "-framerate"), "24");
        assert_eq!(value_after(&args, "-i"), "/tmp/in.jpg");
    }

    #[test]
    fn still_args_generate_a_silent_audio_source() {
        let args = still_args_for(EncodeProfile::baseline(&settings()));
        assert!(args.iter().any(|a| a.starts_with("anullsrc=")));
        assert_eq!(value_after(&args, "-f"), "lavfi");
    }

    #[test]
    fn still_args_trim_to_duration_and_bound_by_shortest() {
        let args = still_args_for(EncodeProfile::baseline(&settings()));
        assert_eq!(value_after(&args, "-t"), "5");
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn still_args_enable_fast_start_and_default_pixel_format() {
        let args = still_args_for(EncodeProfile::baseline(&settings()));
        assert_eq!(value_after(&args, "-movflags"), "+faststart");
        assert_eq!(value_after(&args, "-pix_fmt"), "yuv420p");
        assert_eq!(args.last().unwrap(), "/tmp/out.mp4");
    }

    #[test]
    fn still_args_carry_compressed_rate_control() {
        let args = still_args_for(EncodeProfile::compressed(&settings()));
        assert_eq!(value_after(&args, "-crf"), "28");
        assert_eq!(value_after(&args, "-maxrate"), "2500k");
        assert_eq!(value_after(&args, "-g"), "48");
        assert_eq!(value_after(&args, "-ac"), "1");
    }

    #[test]
    fn concat_args_stream_copy_without_reencode() {
        let args = FfmpegEncoder::concat_args(Path::new("/tmp/list.txt"), Path::new("/tmp/out.mp4"));
        assert_eq!(value_after(&args, "-f"), "concat");
        assert_eq!(value_after(&args, "-safe"), "0");
        assert_eq!(value_after(&args, "-c"), "copy");
        assert_eq!(args.last().unwrap(), "/tmp/out.mp4");
    }

    #[tokio::test]
    async fn still_job_fails_before_spawn_when_input_missing() {
        let encoder = FfmpegEncoder::new("/nonexistent/ffmpeg");
        let params = ClipParams {
            duration_secs: 5,
            fps: 24,
            width: 720,
            height: 1280,
        };
        let err = encoder
            .run(EncodeJob::Still {
                input: PathBuf::from("/nonexistent/input.jpg"),
                output: PathBuf::from("/tmp/out.mp4"),
                filter: FilterGraph::fit_and_pad(&params),
                fps: params.fps,
                duration_secs: params.duration_secs,
                profile: EncodeProfile::baseline(&settings()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EncodeError::MissingInput(_)));
    }
}
