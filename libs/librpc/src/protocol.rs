//! Layout of the RPC words carried by direct messages.
//!
//! ```text
//!           word 0               word 1       word 2       word 3
//! request:  iface << 16 | opcode request len  caller id    encoding
//! response: iface << 16 | opcode response len rpc status   op status
//! share:    0x1000 << 16 | 0     handle lo    handle hi    size
//! unshare:  0x1000 << 16 | 1     0            0            0
//! ```

use libsp::{MemoryHandle, SpMsgArgs};

use crate::{OpStatus, RpcStatus};

/// Interface id reserved for RPC session management.
pub const MANAGEMENT_INTERFACE_ID: u16 = 0x1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ManagementOpcode {
    ShareBuffer = 0,
    UnshareBuffer = 1,
}

impl ManagementOpcode {
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::ShareBuffer),
            1 => Some(Self::UnshareBuffer),
            _ => None,
        }
    }
}

pub(crate) const fn iface_opcode_word(interface_id: u16, opcode: u16) -> u32 {
    ((interface_id as u32) << 16) | opcode as u32
}

pub(crate) const fn split_iface_opcode_word(word: u32) -> (u16, u16) {
    ((word >> 16) as u16, word as u16)
}

pub(crate) fn request_args(
    interface_id: u16,
    opcode: u16,
    req_len: u32,
    caller_id: u32,
    encoding: u32,
) -> SpMsgArgs {
    SpMsgArgs::Args32([
        iface_opcode_word(interface_id, opcode),
        req_len,
        caller_id,
        encoding,
    ])
}

pub(crate) fn response_args(
    iface_opcode: u32,
    resp_len: u32,
    rpc_status: RpcStatus,
    op_status: OpStatus,
) -> SpMsgArgs {
    SpMsgArgs::Args32([
        iface_opcode,
        resp_len,
        rpc_status.to_raw() as u32,
        op_status as u32,
    ])
}

pub(crate) fn share_args(handle: MemoryHandle, size: u32) -> SpMsgArgs {
    SpMsgArgs::Args32([
        iface_opcode_word(MANAGEMENT_INTERFACE_ID, ManagementOpcode::ShareBuffer as u16),
        handle.lo(),
        handle.hi(),
        size,
    ])
}

pub(crate) fn unshare_args() -> SpMsgArgs {
    SpMsgArgs::Args32([
        iface_opcode_word(MANAGEMENT_INTERFACE_ID, ManagementOpcode::UnshareBuffer as u16),
        0,
        0,
        0,
    ])
}

/// Decoded response words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResponseWords {
    pub resp_len: u32,
    pub rpc_status: i32,
    pub op_status: OpStatus,
}

impl ResponseWords {
    pub fn decode(args: &SpMsgArgs) -> Self {
        let words = args.to_words();

        Self {
            resp_len: words[1] as u32,
            rpc_status: words[2] as u32 as i32,
            op_status: words[3] as u32 as i32,
        }
    }
}
