/// Errors raised while resolving coordinate reference systems or transforming coordinates.
///
/// Degenerate (empty) geometries are not errors: they produce a [`Bbox::ZERO`](crate::Bbox::ZERO)
/// bounding box and are reported by the caller as a warning.
#[derive(thiserror::Error, Debug)]
pub enum ReprojectionError {
    #[error("Invalid CRS `{0}`: {1}")]
    InvalidCrs(String, String),

    #[error("Unable to transform ({x}, {y}) from {from} to {to}: {reason}")]
    TransformFailed {
        x: f64,
        y: f64,
        from: String,
        to: String,
        reason: String,
    },
}

pub type ReprojectionResult<T> = Result<T, ReprojectionError>;
