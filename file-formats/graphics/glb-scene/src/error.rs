use std::io;
use thiserror::Error;

/// Error types for GLB loading and animation playback
#[derive(Error, Debug)]
pub enum GltfError {
    /// I/O Error during reading
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The JSON chunk is not a valid glTF document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid magic number in the file header
    #[error("Invalid magic number: expected '{expected}', got '{actual}'")]
    InvalidMagic { expected: String, actual: String },

    /// Unsupported container version
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u32),

    /// A chunk carries an unexpected type tag
    #[error("Invalid chunk type: expected 0x{expected:08X}, got 0x{actual:08X}")]
    InvalidChunkType { expected: u32, actual: u32 },

    /// The buffer ends before a header, chunk or declared length
    #[error("Truncated data: {0}")]
    Truncated(String),

    /// Buffer 0 is referenced but the container has no BIN chunk
    #[error("Missing binary chunk: {0}")]
    MissingBinaryChunk(String),

    /// Accessor component type code outside the supported set
    #[error("Unsupported accessor type: component type {0}")]
    UnsupportedComponentType(u32),

    /// Accessor structure type string outside the supported set
    #[error("Unsupported accessor type: structure type '{0}'")]
    UnsupportedStructureType(String),

    /// Primitive topology other than triangle lists
    #[error("Unsupported primitive topology: mode {0}")]
    UnsupportedTopology(u32),

    /// Any other format feature this loader does not handle
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Reference error: an index points outside its table
    #[error("Reference error: {0}")]
    ReferenceError(String),

    /// Error during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// No clip with the requested name exists
    #[error("Unknown animation clip: {0}")]
    UnknownClip(String),

    /// Playback was requested on an instance without animations
    #[error("No animation player has been constructed for this instance")]
    NoAnimationPlayer,
}

impl GltfError {
    /// Whether the error leaves the caller's state untouched and can be ignored
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownClip(_) | Self::NoAnimationPlayer)
    }
}

/// Result type using GltfError
pub type Result<T> = std::result::Result<T, GltfError>;
