//! Error type shared by the tree builder, the polygon buffer and the lights.

/// Things that can go wrong while building or running the geometry stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The polygon buffer has no free slot left. Nothing was inserted.
    #[error("polygon buffer full ({capacity} triangles)")]
    CapacityExceeded { capacity: usize },

    /// A split or clip could not produce a valid intersection.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),

    /// Light slot outside `0..MAX_LIGHTS`.
    #[error("light index {0} out of range")]
    InvalidLightIndex(usize),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = RenderError> = std::result::Result<T, E>;
