use core::slice;

use libsp::{
    DataAccess, InstructionAccess, MemoryAccessDescriptor, MemoryDescriptor, MemoryHandle,
    MemoryManagement, MemoryRegion, MemoryType, PartitionId, SpMsg, SpMsgArgs, TransactionFlags,
    TransactionType,
};
use log::{debug, error, warn};

use crate::protocol::{self, MANAGEMENT_INTERFACE_ID, ManagementOpcode};
use crate::{CallReq, OpStatus, RpcInterface, RpcStatus};

/// Shared buffer granted by one calling partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Session {
    source_id: PartitionId,
    address: usize,
    size: usize,
    handle: MemoryHandle,
}

/// Service side of the RPC protocol.
///
/// Decodes direct requests, keeps one shared buffer session per calling
/// partition in a table of `N` slots and forwards service calls to `iface`.
pub struct CallEndpoint<I: RpcInterface, const N: usize = 16> {
    iface: I,
    sessions: [Option<Session>; N],
}

impl<I: RpcInterface, const N: usize> CallEndpoint<I, N> {
    pub fn new(iface: I) -> Self {
        Self {
            iface,
            sessions: [None; N],
        }
    }

    pub fn iface(&self) -> &I {
        &self.iface
    }

    pub fn iface_mut(&mut self) -> &mut I {
        &mut self.iface
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.iter().flatten().count()
    }

    pub fn has_session(&self, source_id: PartitionId) -> bool {
        self.find_session(source_id).is_some()
    }

    /// Serve one direct request and build the response to send back.
    pub fn receive<S: MemoryManagement>(&mut self, sp: &mut S, req: &SpMsg) -> SpMsg {
        let words = match req.args {
            SpMsgArgs::Args32(words) => words,
            SpMsgArgs::Args64(_) => {
                warn!("64-bit request from {:#06x} rejected", req.source_id);
                return req.reply(SpMsgArgs::Args64([
                    0,
                    0,
                    RpcStatus::InvalidParameter.to_raw() as i64 as u64,
                    0,
                ]));
            }
        };

        let (interface_id, opcode) = protocol::split_iface_opcode_word(words[0]);

        let (resp_len, status, op_status) = if interface_id == MANAGEMENT_INTERFACE_ID {
            let status = match ManagementOpcode::from_raw(opcode) {
                Some(ManagementOpcode::ShareBuffer) => self.share_buffer(
                    sp,
                    req.source_id,
                    MemoryHandle::from_parts(words[1], words[2]),
                    words[3] as usize,
                ),
                Some(ManagementOpcode::UnshareBuffer) => self.unshare_buffer(sp, req.source_id),
                None => RpcStatus::InvalidOpcode,
            };

            (0, status, 0)
        } else {
            self.service_call(req.source_id, interface_id, opcode, &words)
        };

        req.reply(protocol::response_args(
            words[0], resp_len, status, op_status,
        ))
    }

    fn find_session(&self, source_id: PartitionId) -> Option<usize> {
        self.sessions
            .iter()
            .position(|session| matches!(session, Some(session) if session.source_id == source_id))
    }

    fn share_buffer<S: MemoryManagement>(
        &mut self,
        sp: &mut S,
        source_id: PartitionId,
        handle: MemoryHandle,
        size: usize,
    ) -> RpcStatus {
        if self.has_session(source_id) {
            warn!("{source_id:#06x} already shares a buffer");
            return RpcStatus::InvalidParameter;
        }

        let Some(slot) = self.sessions.iter().position(Option::is_none) else {
            error!("no free session for {source_id:#06x}");
            return RpcStatus::Internal;
        };

        let own_id = sp.own_id();
        let descriptor = MemoryDescriptor {
            sender_id: source_id,
            memory_type: MemoryType::NotSpecified,
            flags: TransactionFlags::of_type(TransactionType::Share),
            tag: 0,
        };
        let access = MemoryAccessDescriptor {
            receiver_id: own_id,
            instruction_access: InstructionAccess::NotSpecified,
            data_access: DataAccess::ReadWrite,
        };
        let mut regions = [MemoryRegion::default(); 1];

        let retrieved = match sp.memory_retrieve(&descriptor, &access, &[], handle, &mut regions)
        {
            Ok(retrieved) => retrieved,
            Err(err) => {
                warn!("retrieve of {handle:?} from {source_id:#06x} failed: {err}");
                return RpcStatus::Internal;
            }
        };

        let region = regions[0];
        if retrieved.region_count == 0 || size > region.size() {
            warn!(
                "{source_id:#06x} declared {size} bytes, {} retrieved",
                region.size()
            );

            if let Err(err) = sp.memory_relinquish(handle, &[own_id], &TransactionFlags::default())
            {
                error!("relinquish of {handle:?} failed: {err}");
            }

            return RpcStatus::InvalidParameter;
        }

        self.sessions[slot] = Some(Session {
            source_id,
            address: region.address,
            size,
            handle,
        });

        debug!("session {slot} open for {source_id:#06x}, {size} bytes");
        RpcStatus::Accepted
    }

    fn unshare_buffer<S: MemoryManagement>(
        &mut self,
        sp: &mut S,
        source_id: PartitionId,
    ) -> RpcStatus {
        let Some(slot) = self.find_session(source_id) else {
            warn!("{source_id:#06x} has no shared buffer");
            return RpcStatus::Internal;
        };

        let Some(session) = self.sessions[slot] else {
            return RpcStatus::Internal;
        };

        let own_id = sp.own_id();
        // The slot stays allocated on failure so the unshare can be retried
        if let Err(err) =
            sp.memory_relinquish(session.handle, &[own_id], &TransactionFlags::default())
        {
            error!("relinquish of {:?} failed: {err}", session.handle);
            return RpcStatus::Internal;
        }

        self.sessions[slot] = None;

        debug!("session {slot} closed for {source_id:#06x}");
        RpcStatus::Accepted
    }

    fn service_call(
        &mut self,
        source_id: PartitionId,
        interface_id: u16,
        opcode: u16,
        words: &[u32; 4],
    ) -> (u32, RpcStatus, OpStatus) {
        let req_len = words[1] as usize;
        let caller_id = match words[2] {
            0 => source_id as u32,
            caller_id => caller_id,
        };
        let encoding = words[3];

        let session = self
            .find_session(source_id)
            .and_then(|slot| self.sessions[slot]);

        let buffer: &mut [u8] = match session {
            Some(session) => {
                // SAFETY: the region was retrieved for this partition and covers `size`
                // bytes. It stays mapped until the session is removed by an unshare, which
                // cannot happen while `self` is mutably borrowed here.
                unsafe { slice::from_raw_parts_mut(session.address as *mut u8, session.size) }
            }
            None if req_len == 0 => &mut [],
            None => {
                warn!("{source_id:#06x} sent {req_len} bytes without a shared buffer");
                return (0, RpcStatus::InvalidParameter, 0);
            }
        };

        let Some(mut call_req) =
            CallReq::new(caller_id, interface_id, opcode, encoding, buffer, req_len)
        else {
            warn!("request of {req_len} bytes exceeds the buffer of {source_id:#06x}");
            return (0, RpcStatus::InvalidParameter, 0);
        };

        let status = self.iface.receive(&mut call_req);

        (
            call_req.response_len() as u32,
            status,
            call_req.op_status(),
        )
    }
}
