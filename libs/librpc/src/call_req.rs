use libsp::PartitionId;

use crate::RpcStatus;

/// Service-defined status of one operation, passed through untouched by the RPC layer.
pub type OpStatus = i32;

/// Decoded service call.
///
/// The request and the response share one buffer: the response is written
/// over the request.
#[derive(Debug)]
pub struct CallReq<'a> {
    caller_id: u32,
    interface_id: u16,
    opcode: u16,
    encoding: u32,
    op_status: OpStatus,
    buffer: &'a mut [u8],
    req_len: usize,
    resp_len: usize,
}

impl<'a> CallReq<'a> {
    /// `req_len` must not exceed the buffer.
    pub fn new(
        caller_id: u32,
        interface_id: u16,
        opcode: u16,
        encoding: u32,
        buffer: &'a mut [u8],
        req_len: usize,
    ) -> Option<Self> {
        if req_len > buffer.len() {
            return None;
        }

        Some(Self {
            caller_id,
            interface_id,
            opcode,
            encoding,
            op_status: 0,
            buffer,
            req_len,
            resp_len: 0,
        })
    }

    pub fn caller_id(&self) -> u32 {
        self.caller_id
    }

    /// Caller as an FF-A partition id.
    pub fn caller_partition_id(&self) -> PartitionId {
        self.caller_id as PartitionId
    }

    pub fn interface_id(&self) -> u16 {
        self.interface_id
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    pub fn encoding(&self) -> u32 {
        self.encoding
    }

    pub fn op_status(&self) -> OpStatus {
        self.op_status
    }

    pub fn set_op_status(&mut self, op_status: OpStatus) {
        self.op_status = op_status;
    }

    /// Size of the shared buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn request(&self) -> &[u8] {
        &self.buffer[..self.req_len]
    }

    /// Whole buffer, to write the response into. Overwrites the request.
    pub fn response_buffer(&mut self) -> &mut [u8] {
        &mut *self.buffer
    }

    pub fn response(&self) -> &[u8] {
        &self.buffer[..self.resp_len]
    }

    pub fn response_len(&self) -> usize {
        self.resp_len
    }

    pub fn set_response_len(&mut self, len: usize) -> Result<(), RpcStatus> {
        if len > self.buffer.len() {
            return Err(RpcStatus::InvalidRespBody);
        }

        self.resp_len = len;
        Ok(())
    }

    /// Copy `response` into the buffer and set the response length.
    pub fn write_response(&mut self, response: &[u8]) -> Result<(), RpcStatus> {
        let dst = self
            .buffer
            .get_mut(..response.len())
            .ok_or(RpcStatus::InvalidRespBody)?;
        dst.copy_from_slice(response);

        self.resp_len = response.len();
        Ok(())
    }
}

/// Receive side of an RPC: anything able to serve a decoded call.
pub trait RpcInterface {
    fn receive(&mut self, req: &mut CallReq) -> RpcStatus;
}

impl<T: RpcInterface + ?Sized> RpcInterface for &mut T {
    fn receive(&mut self, req: &mut CallReq) -> RpcStatus {
        (**self).receive(req)
    }
}
