//! Sample planning: which moments of the source to cut and how long each
//! clip may be.

use crate::error::AppError;

/// Fractions of the total duration at which clips are sampled. Fixed and
/// ordered; the assembler relies on the resulting offsets being strictly
/// increasing so the preview plays through the source chronologically.
pub const SAMPLE_FRACTIONS: [f64; 4] = [0.2, 0.4, 0.6, 0.8];

/// Sources shorter than this cannot produce four non-degenerate clips
/// (the 0.8 offset would leave less than 0.4s of runway).
pub const MIN_SOURCE_SECS: f64 = 2.0;

/// One planned cut: where to seek and how much to copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedClip {
    pub index: usize,
    pub offset_secs: f64,
    pub clip_secs: f64,
}

/// Ordered set of planned cuts for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePlan {
    pub clips: Vec<PlannedClip>,
}

impl SamplePlan {
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Plans one clip per sample fraction. Clip length is clamped to the runway
/// left after the offset so no cut ever extends past the end of the source.
pub fn sample_plan(duration_secs: f64, clip_secs: f64) -> Result<SamplePlan, AppError> {
    if !duration_secs.is_finite() || duration_secs < MIN_SOURCE_SECS {
        return Err(AppError::SourceTooShort(if duration_secs.is_finite() {
            duration_secs
        } else {
            0.0
        }));
    }

    let clips = SAMPLE_FRACTIONS
        .iter()
        .enumerate()
        .map(|(index, fraction)| {
            let offset_secs = fraction * duration_secs;
            PlannedClip {
                index,
                offset_secs,
                clip_secs: clip_secs.min(duration_secs - offset_secs),
            }
        })
        .collect();

    Ok(SamplePlan { clips })
}
