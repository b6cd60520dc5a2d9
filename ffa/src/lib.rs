#![cfg_attr(not(test), no_std)]

mod direct;
mod error;
mod memory;
mod partition;
mod version;

pub use direct::*;
pub use error::*;
pub use memory::*;
pub use partition::*;
pub use version::*;

/// List of FF-A function identifiers.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionId {
    Error = 0x8400_0060,
    Success32 = 0x8400_0061,
    Success64 = 0xC400_0061,
    Interrupt = 0x8400_0062,
    Version = 0x8400_0063,
    Features = 0x8400_0064,
    RxRelease = 0x8400_0065,
    RxTxMap32 = 0x8400_0066,
    RxTxUnmap = 0x8400_0067,
    PartitionInfoGet = 0x8400_0068,
    IdGet = 0x8400_0069,
    MsgWait = 0x8400_006B,
    MsgSendDirectReq32 = 0x8400_006F,
    MsgSendDirectReq64 = 0xC400_006F,
    MsgSendDirectResp32 = 0x8400_0070,
    MsgSendDirectResp64 = 0xC400_0070,
    MemDonate32 = 0x8400_0071,
    MemLend32 = 0x8400_0072,
    MemShare32 = 0x8400_0073,
    MemRetrieveReq32 = 0x8400_0074,
    MemRetrieveResp = 0x8400_0075,
    MemRelinquish = 0x8400_0076,
    MemReclaim = 0x8400_0077,
    MemPermGet = 0x8400_0088,
    MemPermSet = 0x8400_0089,
    ConsoleLog32 = 0x8400_008A,
}

impl FunctionId {
    const ALL: [Self; 26] = [
        Self::Error,
        Self::Success32,
        Self::Success64,
        Self::Interrupt,
        Self::Version,
        Self::Features,
        Self::RxRelease,
        Self::RxTxMap32,
        Self::RxTxUnmap,
        Self::PartitionInfoGet,
        Self::IdGet,
        Self::MsgWait,
        Self::MsgSendDirectReq32,
        Self::MsgSendDirectReq64,
        Self::MsgSendDirectResp32,
        Self::MsgSendDirectResp64,
        Self::MemDonate32,
        Self::MemLend32,
        Self::MemShare32,
        Self::MemRetrieveReq32,
        Self::MemRetrieveResp,
        Self::MemRelinquish,
        Self::MemReclaim,
        Self::MemPermGet,
        Self::MemPermSet,
        Self::ConsoleLog32,
    ];

    /// Decode the primary word of a result. Only the low 32 bits are significant.
    pub fn from_raw(raw: u64) -> Option<Self> {
        let raw = raw as u32;
        Self::ALL.into_iter().find(|id| *id as u32 == raw)
    }

    /// SMC64 calling convention.
    pub const fn is_64bit(self) -> bool {
        (self as u32) & (1 << 30) != 0
    }
}

impl From<FunctionId> for u64 {
    fn from(id: FunctionId) -> Self {
        id as u32 as u64
    }
}

/// Partition or VM identifier.
pub type PartitionId = u16;

/// Mask applied to the id returned by FFA_ID_GET.
pub const ID_MASK: u64 = 0xffff;

/// Granule of every memory transaction.
pub const PAGE_SIZE: usize = 4096;

/// FEATURES property bit telling that a memory operation accepts a dynamically allocated buffer.
pub const FEATURES_MEM_DYNAMIC_BUFFER_SUPPORT: u32 = 1 << 0;
