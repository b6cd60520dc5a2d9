use core::fmt;

use libsp::{
    Cacheability, DataAccess, Discovery, InstructionAccess, MemoryAccessDescriptor,
    MemoryDescriptor, MemoryHandle, MemoryManagement, MemoryRegion, MemoryType, Messaging,
    PAGE_SIZE, PartitionId, Shareability, SpMsg, TransactionFlags, TransactionType, Uuid,
};
use log::{debug, error, warn};

use crate::protocol::{self, ResponseWords};
use crate::{OpStatus, RpcStatus};

/// RPC caller error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerError {
    AlreadyOpen,
    NotOpen,
    /// The communication buffer size does not fit the share request.
    BufferTooLarge,
    /// The communication buffer is empty, not page aligned or not a whole number of pages.
    InvalidBuffer,
    Sp(libsp::Error),
    Rpc(RpcStatus),
}

impl From<libsp::Error> for CallerError {
    fn from(err: libsp::Error) -> Self {
        CallerError::Sp(err)
    }
}

impl fmt::Display for CallerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerError::AlreadyOpen => write!(f, "AlreadyOpen"),
            CallerError::NotOpen => write!(f, "NotOpen"),
            CallerError::BufferTooLarge => write!(f, "BufferTooLarge"),
            CallerError::InvalidBuffer => write!(f, "InvalidBuffer"),
            CallerError::Sp(err) => write!(f, "SpError: {}", err),
            CallerError::Rpc(status) => write!(f, "RpcStatus: {}", status),
        }
    }
}

impl core::error::Error for CallerError {}

/// Accepted response of a call.
#[derive(Debug, PartialEq, Eq)]
pub struct CallResponse<'a> {
    pub op_status: OpStatus,
    pub data: &'a [u8],
}

/// Client side of an RPC session with one interface of one partition.
///
/// The communication buffer is shared with the destination on open and
/// carries both the request and the response of every call.
#[derive(Debug)]
pub struct FfaRpcCaller<'b> {
    buffer: &'b mut [u8],
    encoding: u32,
    caller_id: u32,
    dest_partition_id: PartitionId,
    dest_iface_id: u16,
    shared_mem_handle: MemoryHandle,
    req_len: usize,
    is_call_in_progress: bool,
}

impl<'b> FfaRpcCaller<'b> {
    /// `buffer` must be page aligned and a whole number of pages, [`Self::open`] checks it.
    pub fn new(buffer: &'b mut [u8], encoding: u32) -> Self {
        Self {
            buffer,
            encoding,
            caller_id: 0,
            dest_partition_id: 0,
            dest_iface_id: 0,
            shared_mem_handle: MemoryHandle::UNUSED,
            req_len: 0,
            is_call_in_progress: false,
        }
    }

    /// Caller id placeholder sent with each request, overwritten by a more
    /// privileged layer when there is one.
    pub fn with_caller_id(mut self, caller_id: u32) -> Self {
        self.caller_id = caller_id;
        self
    }

    pub fn is_open(&self) -> bool {
        self.dest_partition_id != 0
    }

    pub fn destination(&self) -> Option<(PartitionId, u16)> {
        self.is_open()
            .then_some((self.dest_partition_id, self.dest_iface_id))
    }

    /// Ids of the partitions implementing `service_uuid`, up to the capacity of `ids`.
    pub fn discover<S: Discovery>(
        sp: &mut S,
        service_uuid: &Uuid,
        ids: &mut [PartitionId],
    ) -> Result<usize, CallerError> {
        Ok(sp.partition_ids_get(service_uuid, ids)?)
    }

    /// Share the communication buffer with `dest_partition_id` and open a
    /// session with its `dest_iface_id` interface.
    pub fn open<S: Messaging + MemoryManagement>(
        &mut self,
        sp: &mut S,
        dest_partition_id: PartitionId,
        dest_iface_id: u16,
    ) -> Result<(), CallerError> {
        if self.is_open() {
            return Err(CallerError::AlreadyOpen);
        }

        if self.buffer.is_empty()
            || self.buffer.len() % PAGE_SIZE != 0
            || self.buffer.as_ptr() as usize % PAGE_SIZE != 0
        {
            return Err(CallerError::InvalidBuffer);
        }

        let size = u32::try_from(self.buffer.len()).map_err(|_| CallerError::BufferTooLarge)?;
        let page_count = size / PAGE_SIZE as u32;

        let descriptor = MemoryDescriptor {
            sender_id: sp.own_id(),
            memory_type: MemoryType::Normal {
                cacheability: Cacheability::WriteBack,
                shareability: Shareability::InnerShareable,
            },
            flags: TransactionFlags::of_type(TransactionType::Share),
            tag: 0,
        };
        let access = MemoryAccessDescriptor {
            receiver_id: dest_partition_id,
            instruction_access: InstructionAccess::NotSpecified,
            data_access: DataAccess::ReadWrite,
        };
        let region = MemoryRegion {
            address: self.buffer.as_ptr() as usize,
            page_count,
        };

        let handle = sp.memory_share(&descriptor, &[access], &[region])?;

        let req = SpMsg::new(
            sp.own_id(),
            dest_partition_id,
            protocol::share_args(handle, size),
        );

        let status = match sp.msg_send_direct_req(&req) {
            Ok(resp) => match RpcStatus::from_raw(ResponseWords::decode(&resp.args).rpc_status) {
                Some(RpcStatus::Accepted) => Ok(()),
                Some(status) => Err(CallerError::Rpc(status)),
                None => Err(CallerError::Rpc(RpcStatus::Internal)),
            },
            Err(err) => Err(CallerError::Sp(err)),
        };

        if let Err(err) = status {
            warn!("buffer share with {dest_partition_id:#06x} refused: {err}");

            if let Err(reclaim_err) = sp.memory_reclaim(handle, 0) {
                error!("buffer {handle:?} leaked: {reclaim_err}");
            }

            return Err(err);
        }

        self.dest_partition_id = dest_partition_id;
        self.dest_iface_id = dest_iface_id;
        self.shared_mem_handle = handle;

        debug!("session open with {dest_partition_id:#06x}/{dest_iface_id:#06x}");
        Ok(())
    }

    /// Unshare and reclaim the communication buffer.
    pub fn close<S: Messaging + MemoryManagement>(
        &mut self,
        sp: &mut S,
    ) -> Result<(), CallerError> {
        if !self.is_open() {
            return Err(CallerError::NotOpen);
        }

        let req = SpMsg::new(sp.own_id(), self.dest_partition_id, protocol::unshare_args());

        // Reclaim regardless: if the callee still holds the buffer the reclaim fails too
        match sp.msg_send_direct_req(&req) {
            Ok(resp) => {
                let status = ResponseWords::decode(&resp.args).rpc_status;
                if status != RpcStatus::Accepted.to_raw() {
                    warn!("buffer unshare refused: {status}");
                }
            }
            Err(err) => warn!("buffer unshare failed: {err}"),
        }

        sp.memory_reclaim(self.shared_mem_handle, 0)?;

        debug!("session closed with {:#06x}", self.dest_partition_id);

        self.dest_partition_id = 0;
        self.dest_iface_id = 0;
        self.shared_mem_handle = MemoryHandle::UNUSED;
        self.call_end();

        Ok(())
    }

    /// Start a call. Returns the area to write the `req_len` bytes of request into.
    pub fn call_begin(&mut self, req_len: usize) -> Option<&mut [u8]> {
        if self.is_call_in_progress || !self.is_open() || req_len > self.buffer.len() {
            return None;
        }

        self.is_call_in_progress = true;
        self.req_len = req_len;

        Some(&mut self.buffer[..req_len])
    }

    /// Send the request started by [`Self::call_begin`] and wait for the response.
    pub fn call_invoke<S: Messaging>(
        &mut self,
        sp: &mut S,
        opcode: u16,
    ) -> Result<CallResponse<'_>, RpcStatus> {
        if !self.is_call_in_progress {
            return Err(RpcStatus::NotReady);
        }

        let req = SpMsg::new(
            sp.own_id(),
            self.dest_partition_id,
            protocol::request_args(
                self.dest_iface_id,
                opcode,
                self.req_len as u32,
                self.caller_id,
                self.encoding,
            ),
        );

        let resp = sp.msg_send_direct_req(&req).map_err(|err| {
            error!("call {opcode:#x} failed: {err}");
            RpcStatus::Internal
        })?;

        let words = ResponseWords::decode(&resp.args);

        let status = RpcStatus::from_raw(words.rpc_status).ok_or(RpcStatus::Internal)?;
        if !status.is_accepted() {
            return Err(status);
        }

        let data = self.buffer.get(..words.resp_len as usize).ok_or_else(|| {
            error!("response length {} exceeds the buffer", words.resp_len);
            RpcStatus::Internal
        })?;

        Ok(CallResponse {
            op_status: words.op_status,
            data,
        })
    }

    /// Finish the current call, successful or not.
    pub fn call_end(&mut self) {
        self.req_len = 0;
        self.is_call_in_progress = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeSp;
    use libsp::{Error as SpError, SpMsgArgs};

    const OWN_ID: PartitionId = 0x8001;
    const DEST_ID: PartitionId = 0x8002;
    const IFACE_ID: u16 = 3;
    const HANDLE: MemoryHandle = MemoryHandle::new(0x1_0000_0002);

    #[repr(C, align(4096))]
    struct Page([u8; PAGE_SIZE]);

    fn accepted() -> SpMsg {
        SpMsg::new(DEST_ID, OWN_ID, SpMsgArgs::Args32([0x1000_0000, 0, 0, 0]))
    }

    fn response(resp_len: u32, rpc_status: RpcStatus, op_status: OpStatus) -> SpMsg {
        SpMsg::new(
            DEST_ID,
            OWN_ID,
            protocol::response_args(0x0003_0007, resp_len, rpc_status, op_status),
        )
    }

    fn open(caller: &mut FfaRpcCaller, sp: &mut FakeSp) {
        sp.share_results.push_back(Ok(HANDLE));
        sp.responses.push_back(Ok(accepted()));
        caller.open(sp, DEST_ID, IFACE_ID).unwrap();
    }

    #[test]
    fn open_shares_buffer() {
        let mut page = Page([0; PAGE_SIZE]);
        let address = page.0.as_ptr() as usize;
        let mut caller = FfaRpcCaller::new(&mut page.0, 0);
        let mut sp = FakeSp::new(OWN_ID);

        open(&mut caller, &mut sp);
        assert!(caller.is_open());
        assert_eq!(caller.destination(), Some((DEST_ID, IFACE_ID)));

        let (descriptor, access, regions) = &sp.shares[0];
        assert_eq!(descriptor.sender_id, OWN_ID);
        assert_eq!(
            descriptor.memory_type,
            MemoryType::Normal {
                cacheability: Cacheability::WriteBack,
                shareability: Shareability::InnerShareable,
            }
        );
        assert_eq!(descriptor.flags.transaction_type, TransactionType::Share);
        assert_eq!(
            access[..],
            [MemoryAccessDescriptor {
                receiver_id: DEST_ID,
                instruction_access: InstructionAccess::NotSpecified,
                data_access: DataAccess::ReadWrite,
            }]
        );
        assert_eq!(
            regions[..],
            [MemoryRegion {
                address,
                page_count: 1
            }]
        );

        assert_eq!(
            sp.requests,
            [SpMsg::new(
                OWN_ID,
                DEST_ID,
                SpMsgArgs::Args32([0x1000_0000, 2, 1, 4096])
            )]
        );
    }

    #[test]
    fn open_twice_does_not_share_again() {
        let mut page = Page([0; PAGE_SIZE]);
        let mut caller = FfaRpcCaller::new(&mut page.0, 0);
        let mut sp = FakeSp::new(OWN_ID);

        open(&mut caller, &mut sp);
        assert_eq!(
            caller.open(&mut sp, DEST_ID, IFACE_ID),
            Err(CallerError::AlreadyOpen)
        );
        assert_eq!(sp.shares.len(), 1);
    }

    #[test]
    fn open_rejects_partial_pages() {
        #[repr(C, align(4096))]
        struct Pages([u8; 2 * PAGE_SIZE]);

        let mut pages = Pages([0; 2 * PAGE_SIZE]);
        let mut sp = FakeSp::new(OWN_ID);

        for range in [0..100, 0..PAGE_SIZE + 100, 1..PAGE_SIZE + 1, 0..0] {
            let mut caller = FfaRpcCaller::new(&mut pages.0[range], 0);
            assert_eq!(
                caller.open(&mut sp, DEST_ID, IFACE_ID),
                Err(CallerError::InvalidBuffer)
            );
            assert!(!caller.is_open());
        }

        assert!(sp.shares.is_empty());
        assert!(sp.requests.is_empty());
    }

    #[test]
    fn open_share_failure() {
        let mut page = Page([0; PAGE_SIZE]);
        let mut caller = FfaRpcCaller::new(&mut page.0, 0);
        let mut sp = FakeSp::new(OWN_ID);
        sp.share_results.push_back(Err(SpError::InvalidState));

        assert_eq!(
            caller.open(&mut sp, DEST_ID, IFACE_ID),
            Err(CallerError::Sp(SpError::InvalidState))
        );
        assert!(!caller.is_open());
        assert!(sp.requests.is_empty());
        assert!(sp.reclaims.is_empty());
    }

    #[test]
    fn open_refused_reclaims() {
        let mut page = Page([0; PAGE_SIZE]);
        let mut caller = FfaRpcCaller::new(&mut page.0, 0);
        let mut sp = FakeSp::new(OWN_ID);
        sp.share_results.push_back(Ok(HANDLE));
        sp.responses
            .push_back(Ok(response(0, RpcStatus::Internal, 0)));
        sp.reclaim_results.push_back(Ok(()));

        assert_eq!(
            caller.open(&mut sp, DEST_ID, IFACE_ID),
            Err(CallerError::Rpc(RpcStatus::Internal))
        );
        assert!(!caller.is_open());
        assert_eq!(sp.reclaims, [(HANDLE, 0)]);
    }

    #[test]
    fn open_transport_failure_reclaims() {
        let mut page = Page([0; PAGE_SIZE]);
        let mut caller = FfaRpcCaller::new(&mut page.0, 0);
        let mut sp = FakeSp::new(OWN_ID);
        sp.share_results.push_back(Ok(HANDLE));
        sp.responses.push_back(Err(SpError::InvalidParameters));
        sp.reclaim_results.push_back(Err(SpError::Internal));

        assert_eq!(
            caller.open(&mut sp, DEST_ID, IFACE_ID),
            Err(CallerError::Sp(SpError::InvalidParameters))
        );
        assert_eq!(sp.reclaims, [(HANDLE, 0)]);
    }

    #[test]
    fn close_unshares_and_reclaims() {
        let mut page = Page([0; PAGE_SIZE]);
        let mut caller = FfaRpcCaller::new(&mut page.0, 0);
        let mut sp = FakeSp::new(OWN_ID);
        open(&mut caller, &mut sp);

        sp.responses.push_back(Ok(accepted()));
        sp.reclaim_results.push_back(Ok(()));
        assert_eq!(caller.close(&mut sp), Ok(()));
        assert!(!caller.is_open());

        assert_eq!(
            sp.requests[1],
            SpMsg::new(OWN_ID, DEST_ID, SpMsgArgs::Args32([0x1000_0001, 0, 0, 0]))
        );
        assert_eq!(sp.reclaims, [(HANDLE, 0)]);
        assert_eq!(caller.close(&mut sp), Err(CallerError::NotOpen));
    }

    #[test]
    fn close_reclaims_after_failed_unshare() {
        let mut page = Page([0; PAGE_SIZE]);
        let mut caller = FfaRpcCaller::new(&mut page.0, 0);
        let mut sp = FakeSp::new(OWN_ID);
        open(&mut caller, &mut sp);

        sp.responses.push_back(Err(SpError::InvalidParameters));
        sp.reclaim_results.push_back(Err(SpError::Internal));
        assert_eq!(
            caller.close(&mut sp),
            Err(CallerError::Sp(SpError::Internal))
        );
        assert_eq!(sp.reclaims, [(HANDLE, 0)]);
        assert!(caller.is_open());
    }

    #[test]
    fn call_begin_rules() {
        let mut page = Page([0; PAGE_SIZE]);
        let mut caller = FfaRpcCaller::new(&mut page.0, 0);
        let mut sp = FakeSp::new(OWN_ID);

        assert!(caller.call_begin(0).is_none());

        open(&mut caller, &mut sp);
        assert!(caller.call_begin(PAGE_SIZE + 1).is_none());

        let request = caller.call_begin(10).unwrap();
        assert_eq!(request.len(), 10);
        request.copy_from_slice(b"0123456789");

        // Busy: the first transaction stays untouched
        assert!(caller.call_begin(5).is_none());
        assert_eq!(caller.req_len, 10);

        caller.call_end();
        assert!(caller.call_begin(0).unwrap().is_empty());
    }

    #[test]
    fn invoke_without_begin() {
        let mut page = Page([0; PAGE_SIZE]);
        let mut caller = FfaRpcCaller::new(&mut page.0, 0);
        let mut sp = FakeSp::new(OWN_ID);
        open(&mut caller, &mut sp);

        assert_eq!(caller.call_invoke(&mut sp, 7), Err(RpcStatus::NotReady));
        assert_eq!(sp.requests.len(), 1);
    }

    #[test]
    fn invoke_round_trip() {
        let mut page = Page([0; PAGE_SIZE]);
        let mut caller = FfaRpcCaller::new(&mut page.0, 0x55).with_caller_id(0x77);
        let mut sp = FakeSp::new(OWN_ID);
        open(&mut caller, &mut sp);

        caller
            .call_begin(3)
            .unwrap()
            .copy_from_slice(&[1, 2, 3]);
        sp.responses
            .push_back(Ok(response(2, RpcStatus::Accepted, -4)));

        assert_eq!(
            caller.call_invoke(&mut sp, 7),
            Ok(CallResponse {
                op_status: -4,
                data: &[1, 2],
            })
        );
        assert_eq!(
            sp.requests[1],
            SpMsg::new(
                OWN_ID,
                DEST_ID,
                SpMsgArgs::Args32([0x0003_0007, 3, 0x77, 0x55])
            )
        );
        caller.call_end();
    }

    #[test]
    fn invoke_errors() {
        let mut page = Page([0; PAGE_SIZE]);
        let mut caller = FfaRpcCaller::new(&mut page.0, 0);
        let mut sp = FakeSp::new(OWN_ID);
        open(&mut caller, &mut sp);
        caller.call_begin(0).unwrap();

        sp.responses
            .push_back(Ok(response(PAGE_SIZE as u32 + 1, RpcStatus::Accepted, 0)));
        assert_eq!(caller.call_invoke(&mut sp, 7), Err(RpcStatus::Internal));

        sp.responses
            .push_back(Ok(response(0, RpcStatus::InvalidOpcode, 0)));
        assert_eq!(caller.call_invoke(&mut sp, 7), Err(RpcStatus::InvalidOpcode));

        sp.responses.push_back(Err(SpError::InvalidState));
        assert_eq!(caller.call_invoke(&mut sp, 7), Err(RpcStatus::Internal));

        caller.call_end();
        assert!(caller.call_begin(1).is_some());
    }

    #[test]
    fn discover() {
        let mut sp = FakeSp::new(OWN_ID);
        sp.partition_ids = [0x8005, 0x8006].to_vec();

        let mut ids = [0; 1];
        assert_eq!(
            FfaRpcCaller::discover(&mut sp, &Uuid::from_u128(1), &mut ids),
            Ok(1)
        );
        assert_eq!(ids, [0x8005]);
    }
}
