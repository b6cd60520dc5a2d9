use super::{FunctionId, PartitionId};

/// Arguments of a direct message. The width is fixed by the function id used to send it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectArgs {
    Args32([u32; 5]),
    Args64([u64; 5]),
}

impl DirectArgs {
    pub const fn is_64bit(&self) -> bool {
        matches!(self, Self::Args64(_))
    }

    /// Arguments widened to register size.
    pub fn to_words(&self) -> [u64; 5] {
        match self {
            Self::Args32(args) => args.map(u64::from),
            Self::Args64(args) => *args,
        }
    }
}

impl Default for DirectArgs {
    fn default() -> Self {
        Self::Args32([0; 5])
    }
}

/// Register-packed request or response exchanged with FFA_MSG_SEND_DIRECT_*
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectMessage {
    pub function_id: FunctionId,
    pub source_id: PartitionId,
    pub destination_id: PartitionId,
    pub args: DirectArgs,
}

impl DirectMessage {
    /// Message carried by a plain FFA_SUCCESS result: no ids, no payload.
    pub fn success(function_id: FunctionId) -> Self {
        Self {
            function_id,
            source_id: 0,
            destination_id: 0,
            args: DirectArgs::default(),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(
            self.function_id,
            FunctionId::Success32 | FunctionId::Success64
        )
    }

    /// Pack source and destination into the a1 layout.
    pub const fn endpoints_word(source_id: PartitionId, destination_id: PartitionId) -> u64 {
        ((source_id as u64) << 16) | destination_id as u64
    }

    /// Unpack (source, destination) from a1.
    pub const fn split_endpoints_word(word: u64) -> (PartitionId, PartitionId) {
        (((word >> 16) & 0xffff) as u16, (word & 0xffff) as u16)
    }
}
