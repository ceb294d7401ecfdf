use glam::Vec3;

/// Errors returned for arguments that can never describe a valid query or tree.
///
/// Absence of an item is not an error; [`Tree::remove`](crate::Tree::remove) and friends report it with `false`/`None`.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum TreeError {
    /// Sphere radius was negative or not finite.
    #[error("invalid sphere radius: {0}")]
    InvalidRadius(f32),

    /// Box `min` is greater than `max` on at least one axis.
    #[error("invalid bounds: min {min} is greater than max {max}")]
    InvalidBounds { min: Vec3, max: Vec3 },

    /// A query point or bound contained NaN or infinity.
    #[error("non-finite vector: {0}")]
    NonFinite(Vec3),

    /// The tree configuration cannot produce a working tree.
    #[error("invalid tree config: {0}")]
    InvalidConfig(&'static str),
}

pub(crate) fn check_finite(v: Vec3) -> Result<Vec3, TreeError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TreeError::NonFinite(v))
    }
}
