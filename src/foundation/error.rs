/// Convenience result type used across vgir.
pub type VgirResult<T> = Result<T, VgirError>;

/// Top-level error taxonomy used by assembler, canvas and linearizer APIs.
#[derive(thiserror::Error, Debug)]
pub enum VgirError {
    /// A null or unassociated heap object was referenced.
    #[error("null reference to heap object of type `{type_name}`")]
    NullReference {
        /// Heap type of the offending object.
        type_name: &'static str,
    },

    /// A heap object was used with an assembler that does not own it.
    #[error("ownership error: {0}")]
    Ownership(String),

    /// Reference-count table or handle allocator misuse.
    #[error("assembler error: {0}")]
    Assembler(String),

    /// Operation not allowed in the current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed arguments supplied by the caller.
    #[error("argument error: {0}")]
    Argument(String),

    /// Instruction or feature that has no implementation.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Buffer index that is out of range or not currently acquired.
    #[error("invalid buffer index {0} in pool")]
    InvalidIndex(usize),

    /// Malformed instruction stream or dump.
    #[error("decode error: {0}")]
    Decode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VgirError {
    /// Build a [`VgirError::NullReference`] value.
    pub fn null_reference(type_name: &'static str) -> Self {
        Self::NullReference { type_name }
    }

    /// Build a [`VgirError::Ownership`] value.
    pub fn ownership(msg: impl Into<String>) -> Self {
        Self::Ownership(msg.into())
    }

    /// Build a [`VgirError::Assembler`] value.
    pub fn assembler(msg: impl Into<String>) -> Self {
        Self::Assembler(msg.into())
    }

    /// Build a [`VgirError::InvalidState`] value.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Build a [`VgirError::Argument`] value.
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }

    /// Build a [`VgirError::NotImplemented`] value.
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::NotImplemented(msg.into())
    }

    /// Build a [`VgirError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
