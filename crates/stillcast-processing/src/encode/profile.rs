//! Codec parameter sets for the two encode profiles.

use stillcast_core::EncodeSettings;

/// Stereo AAC bitrate for the baseline profile's silent track.
const BASELINE_AUDIO_BITRATE_KBPS: u32 = 128;

/// Fixed codec/rate-control arguments for one encode. All values are
/// configuration-time constants, never per-request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeProfile {
    /// Fixed-quality encode with a stereo silent track.
    Baseline { codec: String },
    /// Rate-controlled encode tuned for file size: quality factor, speed
    /// preset, peak bitrate with matching buffer, fixed keyframe interval,
    /// mono audio at a lower bitrate.
    Compressed {
        codec: String,
        crf: u32,
        preset: String,
        max_bitrate_kbps: u32,
        bufsize_kbps: u32,
        gop: u32,
        audio_bitrate_kbps: u32,
    },
}

impl EncodeProfile {
    pub fn baseline(settings: &EncodeSettings) -> Self {
        EncodeProfile::Baseline {
            codec: settings.codec.clone(),
        }
    }

    pub fn compressed(settings: &EncodeSettings) -> Self {
        EncodeProfile::Compressed {
            codec: settings.codec.clone(),
            crf: settings.crf,
            preset: settings.preset.clone(),
            max_bitrate_kbps: settings.max_bitrate_kbps,
            bufsize_kbps: settings.bufsize_kbps,
            gop: settings.gop,
            audio_bitrate_kbps: settings.audio_bitrate_kbps,
        }
    }

    /// Video codec and rate-control arguments.
    pub fn video_args(&self) -> Vec<String> {
        match self {
            EncodeProfile::Baseline { codec } => {
                vec!["-c:v".to_string(), codec.clone()]
            }
            EncodeProfile::Compressed {
                codec,
                crf,
                preset,
                max_bitrate_kbps,
                bufsize_kbps,
                gop,
                ..
            } => vec![
                "-c:v".to_string(),
                codec.clone(),
                "-crf".to_string(),
                crf.to_string(),
                "-preset".to_string(),
                preset.clone(),
                "-maxrate".to_string(),
                format!("{}k", max_bitrate_kbps),
                "-bufsize".to_string(),
                format!("{}k", bufsize_kbps),
                "-g".to_string(),
                gop.to_string(),
            ],
        }
    }

    /// Audio codec arguments for the silent track.
    pub fn audio_args(&self) -> Vec<String> {
        match self {
            EncodeProfile::Baseline { .. } => vec![
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                format!("{}k", BASELINE_AUDIO_BITRATE_KBPS),
                "-ac".to_string(),
                "2".to_string(),
            ],
            EncodeProfile::Compressed {
                audio_bitrate_kbps, ..
            } => vec![
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                format!("{}k", audio_bitrate_kbps),
                "-ac".to_string(),
                "1".to_string(),
            ],
        }
    }
}
