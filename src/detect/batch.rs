use ndarray::prelude::*;
use rayon::prelude::*;
use tracing::trace;

use crate::detect::detection::Detection;
use crate::detect::nms::non_max_suppression;
use crate::detect::priors::{decode, prior_for_cell};
use crate::detect::scores::{candidate_cells, PREFILTER_THRESHOLD};
use crate::error::Error;
use crate::S3fdConfig;

/// Per-image post-processing results, in input image order. `None`
/// marks an image where no cell passed the recall pre-filter (no
/// faces found), as opposed to a list NMS has emptied.
pub type DetectionBatch = Vec<Option<Vec<Detection>>>;

/// One pyramid level's classification/regression pair. The stride is
/// positional: level `i` maps to `2^(i + 2)`.
#[derive(Debug, Clone)]
pub struct FeatureLevel<'a> {
    pub cls: ArrayView4<'a, f32>,
    pub reg: ArrayView4<'a, f32>,
    pub stride: f32,
}

/// Pair and validate the raw network outputs.
///
/// The network emits alternating classification `(batch, 2, H, W)` and
/// regression `(batch, 4, H, W)` tensors, one pair per level, in
/// pyramid order. Any structural mismatch is an integration bug with
/// the inference collaborator and fails the whole batch.
fn feature_levels<'a>(outputs: &[ArrayView4<'a, f32>]) -> Result<Vec<FeatureLevel<'a>>, Error> {
    if outputs.len() % 2 != 0 {
        return Err(Error::OddTensorCount(outputs.len()));
    }

    let batch = outputs.first().map(|t| t.shape()[0]).unwrap_or(0);
    let mut levels = Vec::with_capacity(outputs.len() / 2);

    for (level, pair) in outputs.chunks(2).enumerate() {
        let (cls, reg) = (&pair[0], &pair[1]);

        if cls.shape()[1] != 2 {
            return Err(Error::ChannelMismatch {
                level,
                tensor: "classification",
                expected: 2,
                got: cls.shape()[1],
            });
        }
        if reg.shape()[1] != 4 {
            return Err(Error::ChannelMismatch {
                level,
                tensor: "regression",
                expected: 4,
                got: reg.shape()[1],
            });
        }

        for tensor in &[cls, reg] {
            if tensor.shape()[0] != batch {
                return Err(Error::BatchSizeMismatch {
                    level,
                    expected: batch,
                    got: tensor.shape()[0],
                });
            }
        }

        if cls.shape()[2..] != reg.shape()[2..] {
            return Err(Error::SpatialMismatch {
                level,
                cls_height: cls.shape()[2],
                cls_width: cls.shape()[3],
                reg_height: reg.shape()[2],
                reg_width: reg.shape()[3],
            });
        }

        levels.push(FeatureLevel {
            cls: cls.clone(),
            reg: reg.clone(),
            stride: (1usize << (level + 2)) as f32,
        });
    }

    Ok(levels)
}

/// Decode every pre-filtered cell of every level for one image into a
/// single candidate list, level-major then row-major.
fn image_candidates(levels: &[FeatureLevel<'_>], image: usize) -> Vec<Detection> {
    let mut candidates = Vec::new();

    for level in levels {
        let cls = level.cls.index_axis(Axis(0), image);
        let reg = level.reg.index_axis(Axis(0), image);

        for cell in candidate_cells(cls, PREFILTER_THRESHOLD) {
            let prior = prior_for_cell(cell.row, cell.col, level.stride);
            let loc = [
                reg[[0, cell.row, cell.col]],
                reg[[1, cell.row, cell.col]],
                reg[[2, cell.row, cell.col]],
                reg[[3, cell.row, cell.col]],
            ];

            candidates.push(Detection {
                bbox: decode(loc, &prior),
                score: cell.score,
            });
        }
    }

    candidates
}

/// Run the full decode + suppression pipeline over a batch of raw
/// network outputs.
///
/// ```text
///     Parameters
///     ----------
///     outputs : &[ArrayView4<f32>]
///         Alternating classification/regression tensors, one pair per
///         pyramid level.
///     config : &S3fdConfig
///         Confidence threshold, suppression threshold and overlap
///         method.
///
///     Returns
///     -------
///     DetectionBatch
///         One entry per image, in input order.
/// ```
///
/// Images are independent, so the per-image work is mapped in
/// parallel; the indexed collect restores input order regardless of
/// completion order.
pub fn detect_batch(
    outputs: &[ArrayView4<'_, f32>],
    config: &S3fdConfig,
) -> Result<DetectionBatch, Error> {
    let levels = feature_levels(outputs)?;
    let batch = levels.first().map(|l| l.cls.shape()[0]).unwrap_or(0);

    let results = (0..batch)
        .into_par_iter()
        .map(|image| {
            let candidates = image_candidates(&levels, image);
            trace!(image, candidates = candidates.len(), "candidates accumulated");

            if candidates.is_empty() {
                return None;
            }

            let retained = non_max_suppression(
                &candidates,
                config.nms_threshold,
                config.nms_method,
                config.confidence,
            );
            trace!(image, retained = retained.len(), "suppression done");

            Some(retained)
        })
        .collect();

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::nms::OverlapMethod;

    fn config(confidence: f32) -> S3fdConfig {
        S3fdConfig::new(confidence)
    }

    /// All-background logits: every cell's face probability is ~0.018,
    /// below the 0.05 pre-filter.
    fn background_level(batch: usize, height: usize, width: usize) -> (Array4<f32>, Array4<f32>) {
        let mut cls = Array4::zeros((batch, 2, height, width));
        cls.index_axis_mut(Axis(1), 0).fill(4.0);
        let reg = Array4::zeros((batch, 4, height, width));
        (cls, reg)
    }

    #[test]
    fn odd_tensor_count_is_rejected() {
        let (cls, reg) = background_level(1, 4, 4);
        let views = [cls.view(), reg.view(), cls.view()];

        let err = detect_batch(&views, &config(0.5)).unwrap_err();
        assert!(matches!(err, Error::OddTensorCount(3)));
    }

    #[test]
    fn wrong_channel_counts_are_rejected() {
        let cls = Array4::<f32>::zeros((1, 3, 4, 4));
        let reg = Array4::<f32>::zeros((1, 4, 4, 4));

        let err = detect_batch(&[cls.view(), reg.view()], &config(0.5)).unwrap_err();
        assert!(matches!(
            err,
            Error::ChannelMismatch {
                level: 0,
                tensor: "classification",
                ..
            }
        ));

        let cls = Array4::<f32>::zeros((1, 2, 4, 4));
        let reg = Array4::<f32>::zeros((1, 5, 4, 4));

        let err = detect_batch(&[cls.view(), reg.view()], &config(0.5)).unwrap_err();
        assert!(matches!(
            err,
            Error::ChannelMismatch {
                level: 0,
                tensor: "regression",
                ..
            }
        ));
    }

    #[test]
    fn batch_size_mismatch_is_rejected() {
        let (cls0, reg0) = background_level(2, 8, 8);
        let (cls1, _) = background_level(2, 4, 4);
        let reg1 = Array4::<f32>::zeros((3, 4, 4, 4));

        let views = [cls0.view(), reg0.view(), cls1.view(), reg1.view()];
        let err = detect_batch(&views, &config(0.5)).unwrap_err();

        assert!(matches!(
            err,
            Error::BatchSizeMismatch {
                level: 1,
                expected: 2,
                got: 3,
            }
        ));
    }

    #[test]
    fn spatial_mismatch_between_pair_is_rejected() {
        let cls = Array4::<f32>::zeros((1, 2, 4, 4));
        let reg = Array4::<f32>::zeros((1, 4, 4, 5));

        let err = detect_batch(&[cls.view(), reg.view()], &config(0.5)).unwrap_err();
        assert!(matches!(err, Error::SpatialMismatch { level: 0, .. }));
    }

    #[test]
    fn empty_output_list_yields_empty_batch() {
        let out = detect_batch(&[], &config(0.5)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn all_background_image_gets_the_empty_marker() {
        let (cls, reg) = background_level(1, 4, 4);

        let out = detect_batch(&[cls.view(), reg.view()], &config(0.5)).unwrap();

        assert_eq!(out.len(), 1);
        assert!(out[0].is_none());
    }

    #[test]
    fn strides_are_positional() {
        // A hit at level 1 must decode against stride 8, not 4.
        let (cls0, reg0) = background_level(1, 8, 8);
        let (mut cls1, reg1) = background_level(1, 4, 4);
        cls1[[0, 0, 0, 0]] = 0.0;
        cls1[[0, 1, 0, 0]] = 6.0;

        let views = [cls0.view(), reg0.view(), cls1.view(), reg1.view()];
        let out = detect_batch(&views, &config(0.5)).unwrap();

        let dets = out[0].as_ref().expect("level 1 hit should survive");
        assert_eq!(dets.len(), 1);
        // Stride 8 anchor at cell (0, 0): center (4, 4), 32 on a side.
        assert_eq!(dets[0].bbox.left(), -12.0);
        assert_eq!(dets[0].bbox.right(), 20.0);
    }

    #[test]
    fn images_do_not_interact() {
        let (mut cls, reg) = background_level(3, 4, 4);
        // Face only in the middle image.
        cls[[1, 0, 2, 2]] = 0.0;
        cls[[1, 1, 2, 2]] = 6.0;

        let out = detect_batch(&[cls.view(), reg.view()], &config(0.5)).unwrap();

        assert_eq!(out.len(), 3);
        assert!(out[0].is_none());
        assert_eq!(out[1].as_ref().unwrap().len(), 1);
        assert!(out[2].is_none());
    }

    #[test]
    fn confidence_can_empty_a_processed_image() {
        let (mut cls, reg) = background_level(1, 4, 4);
        // Face probability ~0.5: past the pre-filter, below confidence.
        cls[[0, 0, 1, 1]] = 0.0;
        cls[[0, 1, 1, 1]] = 0.0;

        let mut cfg = config(0.9);
        cfg.nms_method = OverlapMethod::Iou;
        let out = detect_batch(&[cls.view(), reg.view()], &cfg).unwrap();

        // Candidates existed, so this is Some([]) rather than None.
        let dets = out[0].as_ref().expect("image was processed");
        assert!(dets.is_empty());
    }
}
