//! Application assembly: pipeline wiring, routes, and server startup.

pub mod routes;
pub mod server;

use std::sync::Arc;

use axum::Router;

use stillcast_core::Config;
use stillcast_processing::{fetch, fetcher_for, ClipOrchestrator, FfmpegEncoder, OutputWorkspace};

use crate::state::AppState;

/// Build the pipeline and router. A broken encoder configuration fails here,
/// at startup, rather than on the first request.
pub async fn initialize_app(config: Config) -> Result<(AppState, Router), anyhow::Error> {
    let client = fetch::build_client(config.download_timeout, config.max_redirects)?;
    let fetcher = fetcher_for(
        config.fetch_strategy,
        client,
        config.max_image_size_bytes as u64,
    );

    let workspace = Arc::new(OutputWorkspace::new(&config.output_dir).await?);
    // Outputs from a previous process are stale by definition.
    workspace.purge().await;

    let encoder = FfmpegEncoder::new(config.ffmpeg_path.clone());
    encoder
        .verify(&config.encode.codec)
        .await
        .map_err(|e| anyhow::anyhow!("Encoder verification failed: {}", e))?;

    let orchestrator = Arc::new(ClipOrchestrator::new(Arc::new(encoder), config.encode.clone()));

    let state = AppState {
        config,
        fetcher,
        workspace,
        orchestrator,
    };
    let router = routes::build_router(state.clone());

    Ok((state, router))
}
