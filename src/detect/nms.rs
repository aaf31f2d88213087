use std::cmp::Ordering;
use std::str::FromStr;

use crate::detect::{BBox, Corners, Detection};
use crate::error::Error;

/// Overlap measure used to decide whether two boxes describe the same
/// face. Selected once at configuration time; the suppression loop
/// never dispatches on strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapMethod {
    /// Intersection over union of the two areas.
    Iou,
    /// Intersection over the smaller of the two areas.
    Iom,
}

impl OverlapMethod {
    /// Overlap of `a` and `b` under this measure, in `[0, 1]`.
    /// Non-positive denominators from degenerate boxes count as zero
    /// overlap, so NaN never propagates into suppression decisions.
    pub fn overlap(self, a: &BBox<Corners>, b: &BBox<Corners>) -> f32 {
        let inter = intersection(a, b);
        if inter <= 0.0 {
            return 0.0;
        }

        let denom = match self {
            OverlapMethod::Iou => area(a) + area(b) - inter,
            OverlapMethod::Iom => area(a).min(area(b)),
        };

        if denom <= 0.0 {
            0.0
        } else {
            inter / denom
        }
    }
}

impl FromStr for OverlapMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "iou" => Ok(OverlapMethod::Iou),
            "iom" => Ok(OverlapMethod::Iom),
            other => Err(Error::UnknownOverlapMethod(other.to_string())),
        }
    }
}

// Pixel-inclusive area, matching the reference detector's geometry.
#[inline]
fn area(b: &BBox<Corners>) -> f32 {
    (b.right() - b.left() + 1.0) * (b.bottom() - b.top() + 1.0)
}

#[inline]
fn intersection(a: &BBox<Corners>, b: &BBox<Corners>) -> f32 {
    let w = (a.right().min(b.right()) - a.left().max(b.left()) + 1.0).max(0.0);
    let h = (a.bottom().min(b.bottom()) - a.top().max(b.top()) + 1.0).max(0.0);

    w * h
}

/// Greedy non-maximum suppression over one image's candidates.
///
/// ```text
///     Parameters
///     ----------
///     candidates : &[Detection]
///         Accumulated candidates across all pyramid levels.
///     threshold : f32
///         Overlap above which the lower-scored box is suppressed.
///     method : OverlapMethod
///         Overlap measure to suppress with.
///     confidence : f32
///         User-facing score threshold a box must meet to be retained.
///
///     Returns
///     -------
///     Vec<Detection>
///         Retained boxes, score-descending. No retained pair overlaps
///         above `threshold`, and every retained score is at least
///         `confidence`.
/// ```
///
/// Candidates are filtered by `confidence` before sorting, so a
/// sub-confidence box never suppresses anything. The sort is stable:
/// equal scores keep their accumulation order, which matters near
/// threshold boundaries where ties are common.
pub fn non_max_suppression(
    candidates: &[Detection],
    threshold: f32,
    method: OverlapMethod,
    confidence: f32,
) -> Vec<Detection> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..candidates.len())
        .filter(|&i| candidates[i].score >= confidence)
        .collect();
    order.sort_by(|&a, &b| {
        candidates[b]
            .score
            .partial_cmp(&candidates[a].score)
            .unwrap_or(Ordering::Equal)
    });

    let mut retained = Vec::new();
    while let Some(best) = order.first().copied() {
        let best_bbox = candidates[best].bbox.clone();
        retained.push(candidates[best].clone());

        let rest = order.split_off(1);
        order = rest
            .into_iter()
            .filter(|&i| method.overlap(&best_bbox, &candidates[i].bbox) <= threshold)
            .collect();
    }

    retained
}
