//! Error type shared by every crate in the workspace.

/// Errors raised by storage access, view construction and numeric routines.
///
/// Argument, index and shape violations are raised before any mutation takes
/// place.
#[derive(Debug, thiserror::Error)]
pub enum StridedError {
    /// Invalid shape, size, range or parameter.
    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Operand shapes are incompatible for a linear-algebra or element-wise operation.
    #[error("non-conformant operands: {lhs:?} and {rhs:?}")]
    NonConformant { lhs: Vec<usize>, rhs: Vec<usize> },

    /// The operation is undefined for the current state (e.g. determinant of a non-square matrix).
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// Failure reported by an optimized native routine. Never retried.
    #[error("native computation failed with code {code}: {message}")]
    NativeComputation { code: i32, message: String },
}

impl StridedError {
    pub fn argument(msg: impl Into<String>) -> Self {
        StridedError::Argument(msg.into())
    }

    pub fn illegal_state(msg: impl Into<String>) -> Self {
        StridedError::IllegalState(msg.into())
    }

    pub fn non_conformant(lhs: &[usize], rhs: &[usize]) -> Self {
        StridedError::NonConformant {
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StridedError>;
