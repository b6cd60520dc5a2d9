use core::fmt;

/// RPC layer status, carried in the response of every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum RpcStatus {
    Accepted = 0,
    EpDoesNotExist = -1,
    InvalidOpcode = -2,
    SerializationNotSupported = -3,
    InvalidReqBody = -4,
    InvalidRespBody = -5,
    ResourceFailure = -6,
    NotReady = -7,
    InvalidTransaction = -8,
    Internal = -9,
    InvalidParameter = -10,
    InterfaceDoesNotExist = -11,
}

impl RpcStatus {
    const ALL: [Self; 12] = [
        Self::Accepted,
        Self::EpDoesNotExist,
        Self::InvalidOpcode,
        Self::SerializationNotSupported,
        Self::InvalidReqBody,
        Self::InvalidRespBody,
        Self::ResourceFailure,
        Self::NotReady,
        Self::InvalidTransaction,
        Self::Internal,
        Self::InvalidParameter,
        Self::InterfaceDoesNotExist,
    ];

    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|status| *status as i32 == raw)
    }

    pub const fn to_raw(self) -> i32 {
        self as i32
    }

    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl fmt::Display for RpcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "Accepted"),
            Self::EpDoesNotExist => write!(f, "EpDoesNotExist"),
            Self::InvalidOpcode => write!(f, "InvalidOpcode"),
            Self::SerializationNotSupported => write!(f, "SerializationNotSupported"),
            Self::InvalidReqBody => write!(f, "InvalidReqBody"),
            Self::InvalidRespBody => write!(f, "InvalidRespBody"),
            Self::ResourceFailure => write!(f, "ResourceFailure"),
            Self::NotReady => write!(f, "NotReady"),
            Self::InvalidTransaction => write!(f, "InvalidTransaction"),
            Self::Internal => write!(f, "Internal"),
            Self::InvalidParameter => write!(f, "InvalidParameter"),
            Self::InterfaceDoesNotExist => write!(f, "InterfaceDoesNotExist"),
        }
    }
}

impl core::error::Error for RpcStatus {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values() {
        assert_eq!(RpcStatus::from_raw(0), Some(RpcStatus::Accepted));
        assert_eq!(RpcStatus::from_raw(-10), Some(RpcStatus::InvalidParameter));
        assert_eq!(RpcStatus::from_raw(-12), None);
        assert_eq!(RpcStatus::from_raw(1), None);
        assert_eq!(RpcStatus::InterfaceDoesNotExist.to_raw(), -11);
    }
}
