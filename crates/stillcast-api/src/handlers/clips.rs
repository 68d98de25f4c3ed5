//! Clip creation handlers.
//!
//! Exactly one of {`url` query parameter, multipart `file` field} supplies the
//! source image. Numeric parameters clamp to their bounds and never reject.
//! Every staged input is released on every exit path.

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stillcast_core::models::{ClipParams, VideoArtifact};
use stillcast_core::AppError;
use stillcast_processing::{policy, StagedInput};

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::{extract_multipart_file, MaybeMultipart};

#[derive(Debug, Deserialize)]
pub struct ClipQuery {
    pub url: Option<String>,
    pub duration: Option<String>,
    pub fps: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub intro_url: Option<String>,
    pub intro_duration: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClipResponse {
    pub id: Uuid,
    pub filename: String,
    /// Playable length actually produced, including any intro segment.
    pub duration: u32,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    /// Absolute public URL of the artifact.
    pub url: String,
    /// Public-facing relative path.
    pub path: String,
}

/// `POST /api/v0/clips` — baseline profile.
#[tracing::instrument(skip(state, query, multipart), fields(operation = "create_clip"))]
pub async fn create_clip(
    State(state): State<AppState>,
    Query(query): Query<ClipQuery>,
    MaybeMultipart(multipart): MaybeMultipart,
) -> Result<Response, HttpAppError> {
    let params = resolve_params(&state, &query);
    let staged = stage_source(&state, query.url.as_deref(), multipart).await?;

    let result = async {
        let rendered = state.orchestrator.render_baseline(&staged, params).await?;
        install(&state, rendered).await
    }
    .await;
    staged.release().await;
    let (artifact, duration) = result?;

    Ok(success_response(&state, artifact, params, duration))
}

/// `POST /api/v0/clips/compressed` — rate-controlled profile with an optional
/// stream-copied intro segment.
#[tracing::instrument(skip(state, query, multipart), fields(operation = "create_compressed_clip"))]
pub async fn create_compressed_clip(
    State(state): State<AppState>,
    Query(query): Query<ClipQuery>,
    MaybeMultipart(multipart): MaybeMultipart,
) -> Result<Response, HttpAppError> {
    let params = resolve_params(&state, &query);
    let intro_secs = ClipParams::clamp_intro_duration(
        query.intro_duration.as_deref(),
        state.config.max_intro_duration_secs,
    );

    let staged = stage_source(&state, query.url.as_deref(), multipart).await?;

    let intro_staged = match (query.intro_url.as_deref(), intro_secs) {
        (Some(intro_url), secs) if secs > 0 => match state.fetcher.fetch(intro_url).await {
            Ok(intro) => Some(intro),
            Err(e) => {
                staged.release().await;
                return Err(e.into());
            }
        },
        _ => None,
    };

    let result = async {
        let rendered = state
            .orchestrator
            .render_compressed(&staged, params, intro_staged.as_ref().map(|s| (s, intro_secs)))
            .await?;
        install(&state, rendered).await
    }
    .await;
    staged.release().await;
    if let Some(intro) = intro_staged {
        intro.release().await;
    }
    let (artifact, duration) = result?;

    Ok(success_response(&state, artifact, params, duration))
}

fn resolve_params(state: &AppState, query: &ClipQuery) -> ClipParams {
    ClipParams::resolve(
        query.duration.as_deref(),
        query.fps.as_deref(),
        query.width.as_deref(),
        query.height.as_deref(),
        state.clip_defaults(),
    )
}

/// Produce the staged input from whichever source the request carries.
/// Upload validation happens on the declared filename alone, before any
/// fetch or encode work begins.
async fn stage_source(
    state: &AppState,
    url: Option<&str>,
    multipart: Option<Multipart>,
) -> Result<StagedInput, HttpAppError> {
    let upload = match multipart {
        Some(multipart) => extract_multipart_file(multipart)
            .await
            .map_err(HttpAppError::from)?,
        None => None,
    };

    match (url, upload) {
        (Some(_), Some(_)) => Err(AppError::InvalidInput(
            "Provide either a source URL or an uploaded file, not both".to_string(),
        )
        .into()),
        (None, None) => Err(AppError::InvalidInput(
            "A source URL or an uploaded file is required".to_string(),
        )
        .into()),
        (Some(url), None) => Ok(state.fetcher.fetch(url).await?),
        (None, Some((data, filename))) => {
            let kind = policy::classify_upload(&filename)?;
            let staged = StagedInput::from_bytes(&data, kind)
                .await
                .map_err(AppError::from)?;
            tracing::info!(
                filename = %filename,
                size_bytes = staged.len,
                "Upload staged"
            );
            Ok(staged)
        }
    }
}

async fn install(
    state: &AppState,
    rendered: stillcast_processing::RenderedClip,
) -> Result<(VideoArtifact, u32), HttpAppError> {
    let artifact = state
        .workspace
        .install(rendered.output(), Uuid::new_v4())
        .await?;
    Ok((artifact, rendered.total_duration_secs))
}

fn success_response(
    state: &AppState,
    artifact: VideoArtifact,
    params: ClipParams,
    duration: u32,
) -> Response {
    let url = artifact.public_url(&state.config.public_base_url);

    tracing::info!(
        artifact_id = %artifact.id,
        duration,
        fps = params.fps,
        width = params.width,
        height = params.height,
        "Clip created"
    );

    (
        StatusCode::CREATED,
        Json(ClipResponse {
            id: artifact.id,
            filename: artifact.filename,
            duration,
            fps: params.fps,
            width: params.width,
            height: params.height,
            url,
            path: artifact.public_path,
        }),
    )
        .into_response()
}
