//! Configuration module
//!
//! All settings are resolved once from the environment at process start and
//! treated as immutable for the process lifetime.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_OUTPUT_DIR: &str = "videos";
const MAX_IMAGE_SIZE_MB: usize = 10;
const DOWNLOAD_TIMEOUT_SECS: u64 = 20;
const MAX_REDIRECTS: usize = 5;
const VIDEO_CRF: u32 = 28;
const VIDEO_MAX_BITRATE_KBPS: u32 = 2500;
const VIDEO_BUFSIZE_KBPS: u32 = 5000;
const VIDEO_GOP: u32 = 48;
const AUDIO_BITRATE_KBPS: u32 = 64;
const DEFAULT_WIDTH: u32 = 1080;
const DEFAULT_HEIGHT: u32 = 1920;
const MAX_INTRO_DURATION_SECS: u32 = 1;

/// How the fetcher pulls remote bytes into local storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Whole payload in memory before touching disk.
    Buffered,
    /// Chunk-by-chunk to disk with a running byte count.
    Streamed,
}

/// Codec parameters for the external encoder. Configuration-time constants,
/// never per-request.
#[derive(Clone, Debug)]
pub struct EncodeSettings {
    pub codec: String,
    pub crf: u32,
    pub preset: String,
    pub max_bitrate_kbps: u32,
    pub bufsize_kbps: u32,
    pub gop: u32,
    pub audio_bitrate_kbps: u32,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub public_base_url: String,
    pub output_dir: PathBuf,
    pub max_image_size_bytes: usize,
    pub download_timeout: Duration,
    pub max_redirects: usize,
    pub fetch_strategy: FetchStrategy,
    pub ffmpeg_path: String,
    pub encode: EncodeSettings,
    pub default_width: u32,
    pub default_height: u32,
    pub max_intro_duration_secs: u32,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", server_port));

        let max_image_size_mb = env::var("MAX_IMAGE_SIZE_MB")
            .unwrap_or_else(|_| MAX_IMAGE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_IMAGE_SIZE_MB);

        let fetch_strategy = match env::var("FETCH_STRATEGY")
            .unwrap_or_else(|_| "streamed".to_string())
            .to_lowercase()
            .as_str()
        {
            "buffered" => FetchStrategy::Buffered,
            _ => FetchStrategy::Streamed,
        };

        let config = Config {
            server_port,
            public_base_url,
            output_dir: PathBuf::from(
                env::var("OUTPUT_DIR").unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string()),
            ),
            max_image_size_bytes: max_image_size_mb * 1024 * 1024,
            download_timeout: Duration::from_secs(
                env::var("DOWNLOAD_TIMEOUT_SECS")
                    .unwrap_or_else(|_| DOWNLOAD_TIMEOUT_SECS.to_string())
                    .parse()
                    .unwrap_or(DOWNLOAD_TIMEOUT_SECS),
            ),
            max_redirects: env::var("MAX_REDIRECTS")
                .unwrap_or_else(|_| MAX_REDIRECTS.to_string())
                .parse()
                .unwrap_or(MAX_REDIRECTS),
            fetch_strategy,
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            encode: EncodeSettings {
                codec: env::var("VIDEO_CODEC").unwrap_or_else(|_| "libx264".to_string()),
                crf: env::var("VIDEO_CRF")
                    .unwrap_or_else(|_| VIDEO_CRF.to_string())
                    .parse()
                    .unwrap_or(VIDEO_CRF),
                preset: env::var("VIDEO_PRESET").unwrap_or_else(|_| "veryfast".to_string()),
                max_bitrate_kbps: env::var("VIDEO_MAX_BITRATE_KBPS")
                    .unwrap_or_else(|_| VIDEO_MAX_BITRATE_KBPS.to_string())
                    .parse()
                    .unwrap_or(VIDEO_MAX_BITRATE_KBPS),
                bufsize_kbps: env::var("VIDEO_BUFSIZE_KBPS")
                    .unwrap_or_else(|_| VIDEO_BUFSIZE_KBPS.to_string())
                    .parse()
                    .unwrap_or(VIDEO_BUFSIZE_KBPS),
                gop: env::var("VIDEO_GOP")
                    .unwrap_or_else(|_| VIDEO_GOP.to_string())
                    .parse()
                    .unwrap_or(VIDEO_GOP),
                audio_bitrate_kbps: env::var("AUDIO_BITRATE_KBPS")
                    .unwrap_or_else(|_| AUDIO_BITRATE_KBPS.to_string())
                    .parse()
                    .unwrap_or(AUDIO_BITRATE_KBPS),
            },
            default_width: env::var("DEFAULT_WIDTH")
                .unwrap_or_else(|_| DEFAULT_WIDTH.to_string())
                .parse()
                .unwrap_or(DEFAULT_WIDTH),
            default_height: env::var("DEFAULT_HEIGHT")
                .unwrap_or_else(|_| DEFAULT_HEIGHT.to_string())
                .parse()
                .unwrap_or(DEFAULT_HEIGHT),
            max_intro_duration_secs: env::var("MAX_INTRO_DURATION_SECS")
                .unwrap_or_else(|_| MAX_INTRO_DURATION_SECS.to_string())
                .parse()
                .unwrap_or(MAX_INTRO_DURATION_SECS),
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_image_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_IMAGE_SIZE_MB must be at least 1"));
        }

        if self.public_base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("PUBLIC_BASE_URL cannot be empty"));
        }

        if self.encode.crf > 51 {
            return Err(anyhow::anyhow!("VIDEO_CRF must be in 0..=51"));
        }

        if self.encode.bufsize_kbps < self.encode.max_bitrate_kbps {
            return Err(anyhow::anyhow!(
                "VIDEO_BUFSIZE_KBPS ({}) must be at least VIDEO_MAX_BITRATE_KBPS ({})",
                self.encode.bufsize_kbps,
                self.encode.max_bitrate_kbps
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
