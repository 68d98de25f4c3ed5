//! Typed video filter pipeline.
//!
//! Stages are an ordered list of named operations with parameters; the filter
//! string only materializes at the encoder boundary, never at call sites.

use std::fmt;

use stillcast_core::models::ClipParams;

/// Surround fill for padded frames.
pub const PAD_COLOR: &str = "black";

/// One named stage of the video filter chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterStage {
    /// Fit the source into the target box preserving aspect ratio, never
    /// upscaling past it.
    Scale { width: u32, height: u32 },
    /// Pad to exactly the target box, centered, filling with [`PAD_COLOR`].
    Pad { width: u32, height: u32 },
    /// Resample to the target frame rate.
    Fps { fps: u32 },
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterStage::Scale { width, height } => write!(
                f,
                "scale={}:{}:force_original_aspect_ratio=decrease",
                width, height
            ),
            FilterStage::Pad { width, height } => write!(
                f,
                "pad={}:{}:(ow-iw)/2:(oh-ih)/2:color={}",
                width, height, PAD_COLOR
            ),
            FilterStage::Fps { fps } => write!(f, "fps={}", fps),
        }
    }
}

/// Ordered filter chain. Every output has exactly the requested dimensions
/// regardless of input aspect ratio.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterGraph(Vec<FilterStage>);

impl FilterGraph {
    /// The fixed scale → pad → fps pipeline for a clip.
    pub fn fit_and_pad(params: &ClipParams) -> Self {
        FilterGraph(vec![
            FilterStage::Scale {
                width: params.width,
                height: params.height,
            },
            FilterStage::Pad {
                width: params.width,
                height: params.height,
            },
            FilterStage::Fps { fps: params.fps },
        ])
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.0
    }

    /// Render to the encoder's filter syntax.
    pub fn render(&self) -> String {
        self.0
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ClipParams {
        ClipParams {
            duration_secs: 5,
            fps: 24,
            width: 720,
            height: 1280,
        }
    }

    #[test]
    fn pipeline_is_scale_then_pad_then_fps() {
        let graph = FilterGraph::fit_and_pad(&params());
        assert!(matches!(graph.stages()[0], FilterStage::Scale { .. }));
        assert!(matches!(graph.stages()[1], FilterStage::Pad { .. }));
        assert!(matches!(graph.stages()[2], FilterStage::Fps { .. }));
    }

    #[test]
    fn render_produces_expected_filter_string() {
        let graph = FilterGraph::fit_and_pad(&params());
        assert_eq!(
            graph.render(),
            "scale=720:1280:force_original_aspect_ratio=decrease,\
             pad=720:1280:(ow-iw)/2:(oh-ih)/2:color=black,\
             fps=24"
        );
    }

    #[test]
    fn scale_never_upscales_past_the_box() {
        // The "decrease" fit mode is the whole point; guard the literal.
        let stage = FilterStage::Scale {
            width: 1080,
            height: 1920,
        };
        assert!(stage.to_string().contains("force_original_aspect_ratio=decrease"));
    }

    #[test]
    fn pad_centers_and_fills_with_fixed_color() {
        let stage = FilterStage::Pad {
            width: 1080,
            height: 1920,
        };
        let rendered = stage.to_string();
        assert!(rendered.contains("(ow-iw)/2:(oh-ih)/2"));
        assert!(rendered.ends_with("color=black"));
    }
}
