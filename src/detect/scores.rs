use ndarray::prelude::*;
use ndarray::Zip;

/// Recall pre-filter applied to the face-class probability before any
/// decoding happens. Intentionally loose; the user-facing confidence
/// threshold is applied later, around suppression.
pub const PREFILTER_THRESHOLD: f32 = 0.05;

/// A spatial cell that passed the face-probability pre-filter.
#[derive(Debug, Clone, Copy)]
pub struct CellScore {
    pub row: usize,
    pub col: usize,
    pub score: f32,
}

/// Compute the face-class softmax over one image's classification map.
///
/// ```text
///     Parameters
///     ----------
///     cls : array_like
///         A (2, H, W) slice of logits; channel 0 is background,
///         channel 1 is face.
///
///     Returns
///     -------
///     ndarray
///         An (H, W) matrix of face-class probabilities in [0, 1].
/// ```
///
/// Uses the log-sum-exp identity `softmax(x)_c = exp(x_c - logsumexp(x))`
/// so large logits cannot overflow the exponential.
pub fn face_probabilities(cls: ArrayView3<'_, f32>) -> Array2<f32> {
    debug_assert_eq!(cls.shape()[0], 2);

    let background = cls.index_axis(Axis(0), 0);
    let face = cls.index_axis(Axis(0), 1);

    let mut probs = Array2::zeros(face.raw_dim());

    Zip::from(&mut probs)
        .and(&background)
        .and(&face)
        .apply(|p, &bg, &fc| {
            let max = bg.max(fc);
            let logsumexp = max + ((bg - max).exp() + (fc - max).exp()).ln();
            *p = (fc - logsumexp).exp();
        });

    probs
}

/// Select every cell whose face probability exceeds `threshold`,
/// in row-major order.
pub fn candidate_cells(cls: ArrayView3<'_, f32>, threshold: f32) -> Vec<CellScore> {
    let probs = face_probabilities(cls);

    let mut cells = Vec::new();
    for ((row, col), &score) in probs.indexed_iter() {
        if score > threshold {
            cells.push(CellScore { row, col, score });
        }
    }

    cells
}
