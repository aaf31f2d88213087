use ndarray::prelude::*;

use crate::detect::{BBox, Corners};

///
/// A single face candidate in one image.
/// Parameters
///
/// bbox : BBox in corner form `(x1, y1, x2, y2)`, image-pixel coordinates.
/// score : f32 - Face-class probability in `[0, 1]`.
///
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: BBox<Corners>,
    pub score: f32,
}

impl Detection {
    #[inline]
    pub fn as_row(&self) -> [f32; 5] {
        [
            self.bbox.left(),
            self.bbox.top(),
            self.bbox.right(),
            self.bbox.bottom(),
            self.score,
        ]
    }
}

/// Pack detections into a `(num_retained, 5)` matrix with columns
/// `[x1, y1, x2, y2, score]`, the layout downstream extraction
/// stages consume.
pub fn detections_to_array(detections: &[Detection]) -> Array2<f32> {
    let mut out = Array2::zeros((detections.len(), 5));

    for (mut row, det) in out.genrows_mut().into_iter().zip(detections.iter()) {
        row.assign(&aview1(&det.as_row()));
    }

    out
}
