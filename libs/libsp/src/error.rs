use core::fmt;

use crate::descriptor::DescriptorError;

/// Secure partition runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The SPMC rejected the call.
    Ffa(ffa::Error),
    InvalidParameters,
    NotFound,
    /// Protocol inconsistency detected locally (e.g. a fragmented transaction).
    Internal,
    /// RX/TX buffers are not mapped, or already are.
    InvalidState,
    Descriptor(DescriptorError),
}

impl From<ffa::Error> for Error {
    fn from(error: ffa::Error) -> Self {
        Self::Ffa(error)
    }
}

impl From<DescriptorError> for Error {
    fn from(error: DescriptorError) -> Self {
        Self::Descriptor(error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ffa(error) => write!(f, "FF-A error: {error}"),
            Self::InvalidParameters => write!(f, "InvalidParameters"),
            Self::NotFound => write!(f, "NotFound"),
            Self::Internal => write!(f, "Internal"),
            Self::InvalidState => write!(f, "InvalidState"),
            Self::Descriptor(error) => write!(f, "descriptor error: {error}"),
        }
    }
}

impl core::error::Error for Error {}

pub type SpResult<T> = Result<T, Error>;
