use core::fmt;

/// Status codes reported by the SPMC in an FFA_ERROR result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    NotSupported,
    InvalidParameters,
    NoMemory,
    Busy,
    Interrupted,
    Denied,
    Retry,
    Aborted,
    Unknown(i32),
}

impl Error {
    pub const fn from_code(code: i32) -> Self {
        match code {
            -1 => Self::NotSupported,
            -2 => Self::InvalidParameters,
            -3 => Self::NoMemory,
            -4 => Self::Busy,
            -5 => Self::Interrupted,
            -6 => Self::Denied,
            -7 => Self::Retry,
            -8 => Self::Aborted,
            other => Self::Unknown(other),
        }
    }

    pub const fn code(&self) -> i32 {
        match self {
            Self::NotSupported => -1,
            Self::InvalidParameters => -2,
            Self::NoMemory => -3,
            Self::Busy => -4,
            Self::Interrupted => -5,
            Self::Denied => -6,
            Self::Retry => -7,
            Self::Aborted => -8,
            Self::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSupported => write!(f, "NotSupported"),
            Self::InvalidParameters => write!(f, "InvalidParameters"),
            Self::NoMemory => write!(f, "NoMemory"),
            Self::Busy => write!(f, "Busy"),
            Self::Interrupted => write!(f, "Interrupted"),
            Self::Denied => write!(f, "Denied"),
            Self::Retry => write!(f, "Retry"),
            Self::Aborted => write!(f, "Aborted"),
            Self::Unknown(code) => write!(f, "Unknown({code})"),
        }
    }
}

impl core::error::Error for Error {}
