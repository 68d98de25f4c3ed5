//! Clip orchestration: staged input → encoder invocations → finished temp
//! encode, ready for the workspace to install.
//!
//! All intermediates (intro clip, main clip, concat list) live in a per-render
//! temp directory and are removed when the render result is dropped, on
//! success and failure alike. Nothing here ever touches the output directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use stillcast_core::models::ClipParams;
use stillcast_core::EncodeSettings;

use super::encoder::{EncodeError, EncodeJob, Encoder};
use super::filter::FilterGraph;
use super::profile::EncodeProfile;
use crate::staged::StagedInput;

/// A finished encode still sitting in temporary storage. Holds its working
/// directory alive until the artifact is moved out; dropping it removes every
/// leftover intermediate.
pub struct RenderedClip {
    workdir: TempDir,
    output: PathBuf,
    pub params: ClipParams,
    /// Playable length including any intro segment.
    pub total_duration_secs: u32,
}

impl RenderedClip {
    pub fn output(&self) -> &Path {
        &self.output
    }

    fn single(workdir: TempDir, output: PathBuf, params: ClipParams) -> Self {
        RenderedClip {
            workdir,
            output,
            params,
            total_duration_secs: params.duration_secs,
        }
    }
}

impl std::fmt::Debug for RenderedClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedClip")
            .field("workdir", &self.workdir.path())
            .field("output", &self.output)
            .field("params", &self.params)
            .field("total_duration_secs", &self.total_duration_secs)
            .finish()
    }
}

/// Sequences encoder invocations for single and intro+main renders.
pub struct ClipOrchestrator {
    encoder: Arc<dyn Encoder>,
    settings: EncodeSettings,
}

impl ClipOrchestrator {
    pub fn new(encoder: Arc<dyn Encoder>, settings: EncodeSettings) -> Self {
        Self { encoder, settings }
    }

    /// Fixed-quality single-clip render.
    pub async fn render_baseline(
        &self,
        staged: &StagedInput,
        params: ClipParams,
    ) -> Result<RenderedClip, EncodeError> {
        let profile = EncodeProfile::baseline(&self.settings);
        let workdir = encode_workdir()?;
        let output = self
            .build_clip(workdir.path(), "clip.mp4", staged, params, &profile)
            .await?;
        Ok(RenderedClip::single(workdir, output, params))
    }

    /// Rate-controlled render, optionally preceded by a losslessly
    /// concatenated intro segment.
    pub async fn render_compressed(
        &self,
        staged: &StagedInput,
        params: ClipParams,
        intro: Option<(&StagedInput, u32)>,
    ) -> Result<RenderedClip, EncodeError> {
        let profile = EncodeProfile::compressed(&self.settings);
        let workdir = encode_workdir()?;

        let (intro_staged, intro_secs) = match intro {
            Some((staged, secs)) if secs > 0 => (staged, secs),
            _ => {
                let output = self
                    .build_clip(workdir.path(), "clip.mp4", staged, params, &profile)
                    .await?;
                return Ok(RenderedClip::single(workdir, output, params));
            }
        };

        // Both segments come out of the same clip-building routine with the
        // same dimensions/fps/codec, which is what makes stream-copy
        // concatenation valid.
        let intro_params = ClipParams {
            duration_secs: intro_secs,
            ..params
        };
        let intro_path = self
            .build_clip(workdir.path(), "intro.mp4", intro_staged, intro_params, &profile)
            .await?;
        let main_path = self
            .build_clip(workdir.path(), "main.mp4", staged, params, &profile)
            .await?;

        let list_path = workdir.path().join("segments.txt");
        tokio::fs::write(&list_path, concat_list(&[&intro_path, &main_path])).await?;

        let output = workdir.path().join("final.mp4");
        self.encoder
            .run(EncodeJob::Concat {
                list_file: list_path,
                output: output.clone(),
            })
            .await?;

        tracing::info!(
            intro_secs,
            main_secs = params.duration_secs,
            "Concatenated intro and main segments"
        );

        Ok(RenderedClip {
            workdir,
            output,
            params,
            total_duration_secs: intro_secs + params.duration_secs,
        })
    }

    async fn build_clip(
        &self,
        workdir: &Path,
        name: &str,
        input: &StagedInput,
        params: ClipParams,
        profile: &EncodeProfile,
    ) -> Result<PathBuf, EncodeError> {
        if !tokio::fs::try_exists(&input.path).await.unwrap_or(false) {
            return Err(EncodeError::MissingInput(input.path.clone()));
        }

        let output = workdir.join(name);
        self.encoder
            .run(EncodeJob::Still {
                input: input.path.clone(),
                output: output.clone(),
                filter: FilterGraph::fit_and_pad(&params),
                fps: params.fps,
                duration_secs: params.duration_secs,
                profile: profile.clone(),
            })
            .await?;

        Ok(output)
    }
}

fn encode_workdir() -> Result<TempDir, EncodeError> {
    Ok(tempfile::Builder::new()
        .prefix("stillcast-encode-")
        .tempdir()?)
}

/// The concat demuxer's list format, one segment per line, in play order.
fn concat_list(segments: &[&Path]) -> String {
    let mut list = String::new();
    for segment in segments {
        list.push_str(&format!("file '{}'\n", segment.display()));
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ImageKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records jobs and writes output files the way a real encoder would.
    struct MockEncoder {
        jobs: Mutex<Vec<String>>,
    }

    impl MockEncoder {
        fn new() -> Arc<Self> {
            Arc::new(MockEncoder {
                jobs: Mutex::new(Vec::new()),
            })
        }

        fn job_log(&self) -> Vec<String> {
            self.jobs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Encoder for MockEncoder {
        async fn run(&self, job: EncodeJob) -> Result<(), EncodeError> {
            match &job {
                EncodeJob::Still {
                    output,
                    duration_secs,
                    ..
                } => {
                    tokio::fs::write(output, b"clip").await?;
                    self.jobs
                        .lock()
                        .unwrap()
                        .push(format!("still:{}:{}", file_name(output), duration_secs));
                }
                EncodeJob::Concat { list_file, output } => {
                    let list = tokio::fs::read_to_string(list_file).await?;
                    tokio::fs::write(output, b"concat").await?;
                    self.jobs
                        .lock()
                        .unwrap()
                        .push(format!("concat:{}", list.lines().count()));
                }
            }
            Ok(())
        }
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

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

    fn params() -> ClipParams {
        ClipParams {
            duration_secs: 5,
            fps: 24,
            width: 720,
            height: 1280,
        }
    }

    async fn staged() -> StagedInput {
        StagedInput::from_bytes(b"image", ImageKind::Jpeg).await.unwrap()
    }

    #[tokio::test]
    async fn baseline_render_produces_single_clip() {
        let encoder = MockEncoder::new();
        let orchestrator = ClipOrchestrator::new(encoder.clone(), settings());
        let input = staged().await;

        let rendered = orchestrator.render_baseline(&input, params()).await.unwrap();
        assert!(rendered.output().is_file());
        assert_eq!(rendered.total_duration_secs, 5);
        assert_eq!(encoder.job_log(), vec!["still:clip.mp4:5"]);

        input.release().await;
    }

    #[tokio::test]
    async fn compressed_render_with_intro_builds_and_concats_segments() {
        let encoder = MockEncoder::new();
        let orchestrator = ClipOrchestrator::new(encoder.clone(), settings());
        let input = staged().await;
        let intro = staged().await;

        let rendered = orchestrator
            .render_compressed(&input, params(), Some((&intro, 1)))
            .await
            .unwrap();

        assert!(rendered.output().is_file());
        assert_eq!(rendered.total_duration_secs, 6);
        // Intro first, main second, then a two-line concat list.
        assert_eq!(
            encoder.job_log(),
            vec!["still:intro.mp4:1", "still:main.mp4:5", "concat:2"]
        );

        input.release().await;
        intro.release().await;
    }

    #[tokio::test]
    async fn zero_intro_duration_skips_the_intro_entirely() {
        let encoder = MockEncoder::new();
        let orchestrator = ClipOrchestrator::new(encoder.clone(), settings());
        let input = staged().await;
        let intro = staged().await;

        let rendered = orchestrator
            .render_compressed(&input, params(), Some((&intro, 0)))
            .await
            .unwrap();

        assert_eq!(rendered.total_duration_secs, 5);
        assert_eq!(encoder.job_log(), vec!["still:clip.mp4:5"]);

        input.release().await;
        intro.release().await;
    }

    #[tokio::test]
    async fn missing_staged_input_fails_before_any_encoder_call() {
        let encoder = MockEncoder::new();
        let orchestrator = ClipOrchestrator::new(encoder.clone(), settings());

        let input = staged().await;
        let missing = StagedInput {
            path: input.path.with_extension("gone.jpg"),
            kind: ImageKind::Jpeg,
            len: 0,
        };

        let err = orchestrator
            .render_baseline(&missing, params())
            .await
            .unwrap_err();
        assert!(matches!(err, EncodeError::MissingInput(_)));
        assert!(encoder.job_log().is_empty());

        input.release().await;
    }

    #[tokio::test]
    async fn intermediates_are_removed_when_render_is_dropped() {
        let encoder = MockEncoder::new();
        let orchestrator = ClipOrchestrator::new(encoder.clone(), settings());
        let input = staged().await;
        let intro = staged().await;

        let rendered = orchestrator
            .render_compressed(&input, params(), Some((&intro, 1)))
            .await
            .unwrap();
        let workdir = rendered.workdir.path().to_path_buf();
        assert!(workdir.join("intro.mp4").is_file());
        assert!(workdir.join("segments.txt").is_file());

        drop(rendered);
        assert!(!workdir.exists());

        input.release().await;
        intro.release().await;
    }

    #[tokio::test]
    async fn concat_list_is_ordered_and_quoted() {
        let list = concat_list(&[Path::new("/tmp/a/intro.mp4"), Path::new("/tmp/a/main.mp4")]);
        assert_eq!(list, "file '/tmp/a/intro.mp4'\nfile '/tmp/a/main.mp4'\n");
    }

    #[tokio::test]
    async fn encoder_failure_propagates_unmasked() {
        struct FailingEncoder;

        #[async_trait]
        impl Encoder for FailingEncoder {
            async fn run(&self, _job: EncodeJob) -> Result<(), EncodeError> {
                Err(EncodeError::Process {
                    status: "exit status: 1".to_string(),
                    stderr: "unknown encoder 'libx265'".to_string(),
                })
            }
        }

        let orchestrator = ClipOrchestrator::new(Arc::new(FailingEncoder), settings());
        let input = staged().await;

        let err = orchestrator.render_baseline(&input, params()).await.unwrap_err();
        match err {
            EncodeError::Process { stderr, .. } => assert!(stderr.contains("unknown encoder")),
            other => panic!("expected Process, got {:?}", other),
        }

        input.release().await;
    }
}
