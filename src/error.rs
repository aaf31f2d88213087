use err_derive::Error;

/// Precondition violations from the upstream inference collaborator.
/// None of these are retryable; a malformed batch means the
/// integration itself is wrong.
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        display = "expected an even number of network output tensors (classification/regression pairs), got {}",
        _0
    )]
    OddTensorCount(usize),

    #[error(
        display = "level {}: {} tensor must have {} channels, got {}",
        level,
        tensor,
        expected,
        got
    )]
    ChannelMismatch {
        level: usize,
        tensor: &'static str,
        expected: usize,
        got: usize,
    },

    #[error(
        display = "level {}: batch size {} does not match batch size {} of level 0",
        level,
        got,
        expected
    )]
    BatchSizeMismatch {
        level: usize,
        expected: usize,
        got: usize,
    },

    #[error(
        display = "level {}: classification map is {}x{} but regression map is {}x{}",
        level,
        cls_height,
        cls_width,
        reg_height,
        reg_width
    )]
    SpatialMismatch {
        level: usize,
        cls_height: usize,
        cls_width: usize,
        reg_height: usize,
        reg_width: usize,
    },

    #[error(display = "unknown overlap method '{}', expected 'iou' or 'iom'", _0)]
    UnknownOverlapMethod(String),
}
