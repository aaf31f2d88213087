pub mod batch;
pub mod detection;
pub mod nms;
pub mod priors;
pub mod scores;

pub use batch::{detect_batch, DetectionBatch, FeatureLevel};
pub use detection::{detections_to_array, Detection};
pub use nms::{non_max_suppression, OverlapMethod};
pub use priors::{decode, prior_for_cell};
pub use scores::{candidate_cells, face_probabilities, CellScore, PREFILTER_THRESHOLD};

use core::marker::PhantomData;
use ndarray::prelude::*;

pub trait BBoxFormat: std::fmt::Debug {}

/// Center-offset form `(cx, cy, w, h)`. Priors and freshly decoded
/// boxes live in this form until the final corner conversion.
#[derive(Debug, Copy, Clone)]
pub struct CenterSize;
impl BBoxFormat for CenterSize {}

/// Corner form `(x1, y1, x2, y2)` in image-pixel coordinates.
#[derive(Debug, Copy, Clone)]
pub struct Corners;
impl BBoxFormat for Corners {}

#[derive(Debug, Clone)]
pub struct BBox<F: BBoxFormat>([f32; 4], PhantomData<F>);

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_view(&self) -> ArrayView1<'_, f32> {
        aview1(&self.0)
    }
}

impl BBox<CenterSize> {
    #[inline]
    pub fn center_size(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        BBox([cx, cy, width, height], Default::default())
    }

    #[inline(always)]
    pub fn cx(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn cy(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.0[3]
    }

    #[inline]
    pub fn as_corners(&self) -> BBox<Corners> {
        self.into()
    }
}

impl BBox<Corners> {
    #[inline]
    pub fn corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        BBox([x1, y1, x2, y2], Default::default())
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.0[3]
    }
}

impl<'a> From<&'a BBox<CenterSize>> for BBox<Corners> {
    // Corner-from-center goes through x1/y1 first so that float32
    // results stay reproducible against the reference decoder.
    #[inline]
    fn from(v: &'a BBox<CenterSize>) -> Self {
        let x1 = v.0[0] - v.0[2] / 2.0;
        let y1 = v.0[1] - v.0[3] / 2.0;

        Self([x1, y1, x1 + v.0[2], y1 + v.0[3]], Default::default())
    }
}
