use libffa::{Conduit, DirectArgs, DirectMessage, InterruptHandler, PartitionId};
use log::warn;

use crate::{SpContext, SpResult};

/// Payload of an RPC message: the direct message arguments minus the
/// routing extension word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpMsgArgs {
    Args32([u32; 4]),
    Args64([u64; 4]),
}

impl SpMsgArgs {
    pub const fn is_64bit(&self) -> bool {
        matches!(self, Self::Args64(_))
    }

    /// Arguments widened to register size.
    pub fn to_words(&self) -> [u64; 4] {
        match self {
            Self::Args32(args) => args.map(u64::from),
            Self::Args64(args) => *args,
        }
    }

    fn to_direct(self) -> DirectArgs {
        match self {
            Self::Args32([a0, a1, a2, a3]) => DirectArgs::Args32([0, a0, a1, a2, a3]),
            Self::Args64([a0, a1, a2, a3]) => DirectArgs::Args64([0, a0, a1, a2, a3]),
        }
    }
}

impl Default for SpMsgArgs {
    fn default() -> Self {
        Self::Args32([0; 4])
    }
}

impl From<DirectArgs> for SpMsgArgs {
    fn from(args: DirectArgs) -> Self {
        match args {
            DirectArgs::Args32([_, a0, a1, a2, a3]) => Self::Args32([a0, a1, a2, a3]),
            DirectArgs::Args64([_, a0, a1, a2, a3]) => Self::Args64([a0, a1, a2, a3]),
        }
    }
}

/// Request or response exchanged between partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpMsg {
    pub source_id: PartitionId,
    pub destination_id: PartitionId,
    pub args: SpMsgArgs,
}

impl SpMsg {
    pub fn new(source_id: PartitionId, destination_id: PartitionId, args: SpMsgArgs) -> Self {
        Self {
            source_id,
            destination_id,
            args,
        }
    }

    /// Message going back to the sender of `self`.
    pub fn reply(&self, args: SpMsgArgs) -> Self {
        Self::new(self.destination_id, self.source_id, args)
    }
}

impl From<DirectMessage> for SpMsg {
    fn from(msg: DirectMessage) -> Self {
        // A plain FFA_SUCCESS carries no message
        if msg.is_success() {
            return Self::default();
        }

        Self::new(msg.source_id, msg.destination_id, msg.args.into())
    }
}

impl<'a, C: Conduit, H: InterruptHandler> SpContext<'a, C, H> {
    /// Block until a message arrives.
    pub fn msg_wait(&mut self) -> SpResult<SpMsg> {
        let msg = self
            .ffa
            .msg_wait()
            .inspect_err(|err| warn!("wait failed: {err}"))?;

        Ok(msg.into())
    }

    /// Send a request and block until its response. The argument width selects the ABI.
    pub fn msg_send_direct_req(&mut self, req: &SpMsg) -> SpResult<SpMsg> {
        let resp = match req.args.to_direct() {
            DirectArgs::Args32(args) => {
                self.ffa
                    .msg_send_direct_req_32(req.source_id, req.destination_id, args)
            }
            DirectArgs::Args64(args) => {
                self.ffa
                    .msg_send_direct_req_64(req.source_id, req.destination_id, args)
            }
        }
        .inspect_err(|err| warn!("request to {:#06x} failed: {err}", req.destination_id))?;

        Ok(resp.into())
    }

    /// Send a response and block until the next request.
    pub fn msg_send_direct_resp(&mut self, resp: &SpMsg) -> SpResult<SpMsg> {
        let req = match resp.args.to_direct() {
            DirectArgs::Args32(args) => {
                self.ffa
                    .msg_send_direct_resp_32(resp.source_id, resp.destination_id, args)
            }
            DirectArgs::Args64(args) => {
                self.ffa
                    .msg_send_direct_resp_64(resp.source_id, resp.destination_id, args)
            }
        }
        .inspect_err(|err| warn!("response to {:#06x} failed: {err}", resp.destination_id))?;

        Ok(req.into())
    }
}
