pub mod detect;
pub mod error;

pub use detect::{
    candidate_cells, decode, detect_batch, detections_to_array, face_probabilities,
    non_max_suppression, prior_for_cell, BBox, BBoxFormat, CellScore, CenterSize, Corners,
    Detection, DetectionBatch, FeatureLevel, OverlapMethod, PREFILTER_THRESHOLD,
};
pub use error::Error;

use ndarray::prelude::*;

pub struct S3fdConfig {
    /// User-facing retention threshold, as a 0-1 fraction.
    pub confidence: f32,
    pub nms_threshold: f32,
    pub nms_method: OverlapMethod,
}

impl S3fdConfig {
    pub fn new(confidence: f32) -> Self {
        Self {
            confidence,
            nms_threshold: 0.3,
            nms_method: OverlapMethod::Iou,
        }
    }
}

/// S3FD post-processing stage: turns the network's raw pyramid
/// outputs into per-image face boxes.
pub struct S3fd {
    config: S3fdConfig,
}

impl S3fd {
    pub fn new(config: S3fdConfig) -> Self {
        Self { config }
    }

    /// Decode, filter and suppress one batch of raw predictions.
    ///
    /// `outputs` are the network's tensors in emission order:
    /// alternating classification `(batch, 2, H, W)` and regression
    /// `(batch, 4, H, W)`, one pair per pyramid level.
    pub fn finalize_predictions(
        &self,
        outputs: &[ArrayView4<'_, f32>],
    ) -> Result<DetectionBatch, Error> {
        detect_batch(outputs, &self.config)
    }
}
