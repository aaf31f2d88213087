use crate::detect::{BBox, CenterSize, Corners};

/// Variances the regression targets were encoded with at train time;
/// index 0 scales the center offsets, index 1 the size offsets.
pub const VARIANCES: [f32; 2] = [0.1, 0.2];

/// Side length of the square anchor, as a multiple of the level stride.
pub const ANCHOR_SCALE: f32 = 4.0;

/// Prior box for a feature-map cell.
///
/// ```text
///     Parameters
///     ----------
///     row, col : usize
///         Cell position within the level's feature map.
///     stride : f32
///         Downsampling factor of the level relative to the input image.
///
///     Returns
///     -------
///     BBox<CenterSize>
///         Anchor centered on the cell, `stride * 4` pixels on a side.
/// ```
///
#[inline]
pub fn prior_for_cell(row: usize, col: usize, stride: f32) -> BBox<CenterSize> {
    let cx = stride / 2.0 + col as f32 * stride;
    let cy = stride / 2.0 + row as f32 * stride;
    let size = stride * ANCHOR_SCALE;

    BBox::center_size(cx, cy, size, size)
}

/// Decode one cell's regression offsets against its prior, undoing the
/// encoding applied at train time.
///
/// ```text
///     Parameters
///     ----------
///     loc : [f32; 4]
///         Regression output `(dx, dy, dw, dh)` for the cell.
///     prior : BBox<CenterSize>
///         The cell's anchor.
///
///     Returns
///     -------
///     BBox<Corners>
///         Absolute box in image-pixel coordinates.
/// ```
///
/// Center is decoded before size, and the corner conversion runs last;
/// this evaluation order is what makes results bit-reproducible at
/// float32 precision against the reference decoder.
pub fn decode(loc: [f32; 4], prior: &BBox<CenterSize>) -> BBox<Corners> {
    let bx = prior.cx() + loc[0] * VARIANCES[0] * prior.width();
    let by = prior.cy() + loc[1] * VARIANCES[0] * prior.height();

    let bw = prior.width() * (loc[2] * VARIANCES[1]).exp();
    let bh = prior.height() * (loc[3] * VARIANCES[1]).exp();

    BBox::center_size(bx, by, bw, bh).as_corners()
}
