/// Convenience alias used across the crate.
pub type AnvilResult<T> = Result<T, AnvilError>;

/// Errors surfaced by the engine.
#[derive(thiserror::Error, Debug)]
pub enum AnvilError {
    /// A strict accessor was handed a coordinate outside the buffer.
    #[error("out of bounds: ({x}, {y}) outside {width}x{height}")]
    OutOfBounds {
        /// Offending x coordinate.
        x: i32,
        /// Offending y coordinate.
        y: i32,
        /// Buffer width at the time of the call.
        width: u32,
        /// Buffer height at the time of the call.
        height: u32,
    },

    /// A raw byte payload does not match `width * height * 4`.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch {
        /// Byte length implied by the dimensions.
        expected: usize,
        /// Byte length actually supplied.
        actual: usize,
    },

    /// A partial-diff swap buffer does not match its bound box area.
    #[error("partial buffer size mismatch: bound box needs {expected} bytes, got {actual}")]
    PartialBufferSizeMismatch {
        /// Byte length implied by the bound box.
        expected: usize,
        /// Byte length actually supplied.
        actual: usize,
    },

    /// The codec could not decode an encoded payload.
    #[error("decode error: {0}")]
    Decode(String),

    /// A constructor or option was handed an invalid value.
    #[error("validation error: {0}")]
    Validation(String),

    /// Any other failure, preserved with its context chain.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnvilError {
    /// Shorthand for [`AnvilError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Shorthand for [`AnvilError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
