//! Crate-wide error taxonomy.

use std::fmt;

/// Every fallible operation in this crate returns `Result<T, CoreError>`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A configuration value violated one of the constraints in the config schema.
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// An internal box/grid invariant was violated. Indicates a programming error.
    #[error("geometry invariant violated: {0}")]
    Geometry(String),

    /// Fragments grouped under the same key disagreed on their logical box.
    #[error("brick fragments disagree on logical box: {0}")]
    AssemblyMismatch(String),

    /// A boundary-slab group did not contain exactly two members.
    #[error("boundary pairing mismatch: expected 2 slabs, got {found}")]
    BoundaryPairingMismatch { found: usize },

    /// A padding grid does not divide the brick's logical box.
    #[error("padding box exceeds logical box: {0}")]
    PaddingExceedsLogicalBox(String),

    /// A downsample factor did not evenly divide the block shape.
    #[error("downsample factor {factor:?} does not divide shape {shape:?}")]
    UnalignedDownsample { factor: [u32; 3], shape: [u32; 3] },

    /// A label map's domain contained duplicate entries.
    #[error("ambiguous label map: label {0} appears more than once in the domain")]
    AmbiguousLabelMap(u64),

    /// A retryable I/O failure against a `VoxelService`. Carries the attempt count already
    /// made and the originating backend error.
    #[error("transient I/O failure after {attempts} attempt(s): {source}")]
    Transient {
        attempts: u32,
        #[source]
        source: BackendError,
    },

    /// An out-of-bounds read/write was requested against a `VoxelService`.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    /// A requested scale is not available from a `VoxelService`.
    #[error("scale {0} is not available")]
    ScaleUnavailable(u8),
}

/// Opaque error from a `VoxelService` backend, boxed so the core stays backend-agnostic.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Wraps a plain string as a `BackendError`, for tests and simple backends.
#[derive(Debug)]
pub struct Msg(pub String);

impl fmt::Display for Msg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Msg {}

impl From<&str> for Msg {
    fn from(s: &str) -> Self {
        Msg(s.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
