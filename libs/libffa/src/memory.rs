use super::{
    Conduit, Ffa, FfaResult, FunctionId, InterruptHandler, MemoryHandle, MemoryPermissions,
    Registers, check_error, expect_success, unexpected_result,
};

/// Where the transaction descriptor of a memory operation is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorBuffer {
    /// TX buffer of the mapped RX/TX pair.
    RxTx,
    /// Caller-owned page-aligned buffer.
    Dynamic { address: u64, page_count: u32 },
}

impl DescriptorBuffer {
    fn args(&self) -> (u64, u64) {
        match self {
            Self::RxTx => (0, 0),
            Self::Dynamic {
                address,
                page_count,
            } => (*address, *page_count as u64),
        }
    }
}

/// Lengths reported by FFA_MEM_RETRIEVE_RESP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieveResponse {
    pub total_length: u32,
    pub fragment_length: u32,
}

impl<C: Conduit, H: InterruptHandler> Ffa<C, H> {
    /// Transfer the ownership of a memory region to a single borrower.
    pub fn mem_donate(
        &mut self,
        total_length: u32,
        fragment_length: u32,
        buffer: DescriptorBuffer,
    ) -> FfaResult<MemoryHandle> {
        self.mem_transaction(FunctionId::MemDonate32, total_length, fragment_length, buffer)
    }

    /// Lend a memory region to one or more borrowers.
    pub fn mem_lend(
        &mut self,
        total_length: u32,
        fragment_length: u32,
        buffer: DescriptorBuffer,
    ) -> FfaResult<MemoryHandle> {
        self.mem_transaction(FunctionId::MemLend32, total_length, fragment_length, buffer)
    }

    /// Share a memory region with one or more borrowers.
    pub fn mem_share(
        &mut self,
        total_length: u32,
        fragment_length: u32,
        buffer: DescriptorBuffer,
    ) -> FfaResult<MemoryHandle> {
        self.mem_transaction(FunctionId::MemShare32, total_length, fragment_length, buffer)
    }

    /// Request the mapping of a donated, lent or shared region.
    pub fn mem_retrieve_req(
        &mut self,
        total_length: u32,
        fragment_length: u32,
        buffer: DescriptorBuffer,
    ) -> FfaResult<RetrieveResponse> {
        let (address, page_count) = buffer.args();
        let regs = self.call(
            FunctionId::MemRetrieveReq32,
            [
                total_length as u64,
                fragment_length as u64,
                address,
                page_count,
                0,
                0,
                0,
            ],
        );

        check_error(&regs)?;

        if FunctionId::from_raw(regs[0]) != Some(FunctionId::MemRetrieveResp) {
            unexpected_result(&regs);
        }

        Ok(RetrieveResponse {
            total_length: regs[1] as u32,
            fragment_length: regs[2] as u32,
        })
    }

    /// Give up access to a region. The relinquish descriptor is read from the TX buffer.
    pub fn mem_relinquish(&mut self) -> FfaResult<()> {
        let regs = self.call(FunctionId::MemRelinquish, [0; 7]);

        expect_success(&regs)
    }

    /// Restore exclusive access to a region once every borrower relinquished it.
    pub fn mem_reclaim(&mut self, handle: MemoryHandle, flags: u32) -> FfaResult<()> {
        let regs = self.call(
            FunctionId::MemReclaim,
            [
                handle.lo() as u64,
                handle.hi() as u64,
                flags as u64,
                0,
                0,
                0,
                0,
            ],
        );

        expect_success(&regs)
    }

    /// Get the permissions of the page at `base_address`.
    pub fn mem_perm_get(&mut self, base_address: u64) -> FfaResult<MemoryPermissions> {
        let regs = self.call(FunctionId::MemPermGet, [base_address, 0, 0, 0, 0, 0, 0]);

        expect_success(&regs)?;

        match MemoryPermissions::from_raw(regs[2] as u32) {
            Some(perms) => Ok(perms),
            None => unexpected_result(&regs),
        }
    }

    /// Set the permissions of `page_count` pages starting at `base_address`.
    pub fn mem_perm_set(
        &mut self,
        base_address: u64,
        page_count: u32,
        permissions: MemoryPermissions,
    ) -> FfaResult<()> {
        let regs = self.call(
            FunctionId::MemPermSet,
            [
                base_address,
                page_count as u64,
                permissions.to_raw() as u64,
                0,
                0,
                0,
                0,
            ],
        );

        expect_success(&regs)
    }

    fn mem_transaction(
        &mut self,
        function_id: FunctionId,
        total_length: u32,
        fragment_length: u32,
        buffer: DescriptorBuffer,
    ) -> FfaResult<MemoryHandle> {
        let (address, page_count) = buffer.args();
        let regs: Registers = self.call(
            function_id,
            [
                total_length as u64,
                fragment_length as u64,
                address,
                page_count,
                0,
                0,
                0,
            ],
        );

        expect_success(&regs)?;

        Ok(MemoryHandle::from_parts(regs[2] as u32, regs[3] as u32))
    }
}
