use libffa::{
    Conduit, DescriptorBuffer, FEATURES_MEM_DYNAMIC_BUFFER_SUPPORT, FunctionId, InterruptHandler,
    MemoryHandle, MemoryPermissions, PAGE_SIZE, PartitionId, TransactionFlags,
};
use log::{debug, error};

use crate::descriptor::{self, MemoryAccessDescriptor, MemoryDescriptor, MemoryRegion};
use crate::{Error, RxTxBuffers, SpContext, SpResult, TransactionBuffer};

/// Outcome of a retrieve request, as described by the SPMC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievedMemory {
    pub descriptor: MemoryDescriptor,
    pub access: MemoryAccessDescriptor,
    /// Number of regions written to the caller's slice.
    pub region_count: usize,
}

fn descriptor_length(used: usize) -> SpResult<u32> {
    u32::try_from(used).map_err(|_| Error::InvalidParameters)
}

fn dynamic_buffer(buffer: &TransactionBuffer) -> SpResult<DescriptorBuffer> {
    if !buffer.is_page_aligned() {
        return Err(Error::InvalidParameters);
    }

    Ok(DescriptorBuffer::Dynamic {
        address: buffer.address() as u64,
        page_count: u32::try_from(buffer.page_count()).map_err(|_| Error::InvalidParameters)?,
    })
}

fn check_transaction(access: &[MemoryAccessDescriptor], regions: &[MemoryRegion]) -> SpResult<()> {
    if access.is_empty() || regions.is_empty() {
        return Err(Error::InvalidParameters);
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Transaction {
    Donate,
    Lend,
    Share,
}

impl<'a, C: Conduit, H: InterruptHandler> SpContext<'a, C, H> {
    /// Donate memory to a single borrower, using the TX buffer.
    pub fn memory_donate(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &MemoryAccessDescriptor,
        regions: &[MemoryRegion],
    ) -> SpResult<MemoryHandle> {
        self.transaction_rxtx(
            Transaction::Donate,
            descriptor,
            core::slice::from_ref(access),
            regions,
        )
    }

    /// Donate memory to a single borrower, using a caller-owned descriptor buffer.
    pub fn memory_donate_dynamic(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &MemoryAccessDescriptor,
        regions: &[MemoryRegion],
        buffer: &mut TransactionBuffer,
    ) -> SpResult<MemoryHandle> {
        self.transaction_dynamic(
            Transaction::Donate,
            descriptor,
            core::slice::from_ref(access),
            regions,
            buffer,
        )
    }

    pub fn memory_donate_dynamic_is_supported(&mut self) -> SpResult<bool> {
        self.dynamic_is_supported(FunctionId::MemDonate32)
    }

    /// Lend memory to one or more borrowers, using the TX buffer.
    pub fn memory_lend(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &[MemoryAccessDescriptor],
        regions: &[MemoryRegion],
    ) -> SpResult<MemoryHandle> {
        self.transaction_rxtx(Transaction::Lend, descriptor, access, regions)
    }

    pub fn memory_lend_dynamic(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &[MemoryAccessDescriptor],
        regions: &[MemoryRegion],
        buffer: &mut TransactionBuffer,
    ) -> SpResult<MemoryHandle> {
        self.transaction_dynamic(Transaction::Lend, descriptor, access, regions, buffer)
    }

    pub fn memory_lend_dynamic_is_supported(&mut self) -> SpResult<bool> {
        self.dynamic_is_supported(FunctionId::MemLend32)
    }

    /// Share memory with one or more borrowers, using the TX buffer.
    pub fn memory_share(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &[MemoryAccessDescriptor],
        regions: &[MemoryRegion],
    ) -> SpResult<MemoryHandle> {
        self.transaction_rxtx(Transaction::Share, descriptor, access, regions)
    }

    pub fn memory_share_dynamic(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &[MemoryAccessDescriptor],
        regions: &[MemoryRegion],
        buffer: &mut TransactionBuffer,
    ) -> SpResult<MemoryHandle> {
        self.transaction_dynamic(Transaction::Share, descriptor, access, regions, buffer)
    }

    pub fn memory_share_dynamic_is_supported(&mut self) -> SpResult<bool> {
        self.dynamic_is_supported(FunctionId::MemShare32)
    }

    /// Retrieve the memory identified by `handle`, using the RX/TX pair.
    ///
    /// `regions` may be empty to let the SPMC choose where the memory is
    /// mapped. The regions actually mapped are written to `regions_out`. A
    /// response that fails the checks is relinquished before returning the error.
    pub fn memory_retrieve(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &MemoryAccessDescriptor,
        regions: &[MemoryRegion],
        handle: MemoryHandle,
        regions_out: &mut [MemoryRegion],
    ) -> SpResult<RetrievedMemory> {
        let RxTxBuffers { tx, rx } = self.rxtx.as_mut().ok_or(Error::InvalidState)?;

        let used = descriptor::build_transaction(
            tx,
            descriptor,
            core::slice::from_ref(access),
            regions,
            handle,
        )?;
        let length = descriptor_length(used)?;

        let response = self
            .ffa
            .mem_retrieve_req(length, length, DescriptorBuffer::RxTx)
            .inspect_err(|err| error!("retrieve of {handle:?} failed: {err}"))?;

        let result = rx
            .get(..response.total_length as usize)
            .ok_or(Error::Internal)
            .and_then(|bytes| retrieved(response, bytes, descriptor.tag, regions_out));

        result.inspect_err(|_| self.relinquish_rejected(handle))
    }

    /// Retrieve using a caller-owned buffer for both the request and the response.
    pub fn memory_retrieve_dynamic(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &MemoryAccessDescriptor,
        regions: &[MemoryRegion],
        handle: MemoryHandle,
        regions_out: &mut [MemoryRegion],
        buffer: &mut TransactionBuffer,
    ) -> SpResult<RetrievedMemory> {
        let target = dynamic_buffer(buffer)?;

        buffer.build_transaction(descriptor, core::slice::from_ref(access), regions, handle)?;
        let length = descriptor_length(buffer.used())?;

        let response = self
            .ffa
            .mem_retrieve_req(length, length, target)
            .inspect_err(|err| error!("retrieve of {handle:?} failed: {err}"))?;

        let result = buffer
            .set_used(response.total_length as usize)
            .map_err(|_| Error::Internal)
            .and_then(|()| retrieved(response, buffer.as_bytes(), descriptor.tag, regions_out));

        result.inspect_err(|_| self.relinquish_rejected(handle))
    }

    pub fn memory_retrieve_dynamic_is_supported(&mut self) -> SpResult<bool> {
        self.dynamic_is_supported(FunctionId::MemRetrieveReq32)
    }

    /// Give up access to a retrieved region.
    ///
    /// `endpoints` and `flags` must be the ones of the original transaction.
    pub fn memory_relinquish(
        &mut self,
        handle: MemoryHandle,
        endpoints: &[PartitionId],
        flags: &TransactionFlags,
    ) -> SpResult<()> {
        if endpoints.is_empty() {
            return Err(Error::InvalidParameters);
        }

        let RxTxBuffers { tx, .. } = self.rxtx.as_mut().ok_or(Error::InvalidState)?;
        descriptor::build_relinquish(tx, handle, flags, endpoints)?;

        self.ffa
            .mem_relinquish()
            .inspect_err(|err| error!("relinquish of {handle:?} failed: {err}"))?;

        debug!("relinquished {handle:?}");
        Ok(())
    }

    /// Take back a lent or shared region. A failure here leaks the memory.
    pub fn memory_reclaim(&mut self, handle: MemoryHandle, flags: u32) -> SpResult<()> {
        self.ffa
            .mem_reclaim(handle, flags)
            .inspect_err(|err| error!("reclaim of {handle:?} failed: {err}"))?;

        debug!("reclaimed {handle:?}");
        Ok(())
    }

    pub fn memory_permission_get(&mut self, address: usize) -> SpResult<MemoryPermissions> {
        if address % PAGE_SIZE != 0 {
            return Err(Error::InvalidParameters);
        }

        Ok(self.ffa.mem_perm_get(address as u64)?)
    }

    /// Set the permissions of `size` bytes of page-aligned memory.
    pub fn memory_permission_set(
        &mut self,
        address: usize,
        size: usize,
        permissions: MemoryPermissions,
    ) -> SpResult<()> {
        if address % PAGE_SIZE != 0 || size % PAGE_SIZE != 0 || size == 0 {
            return Err(Error::InvalidParameters);
        }

        let page_count = u32::try_from(size / PAGE_SIZE).map_err(|_| Error::InvalidParameters)?;

        Ok(self.ffa.mem_perm_set(address as u64, page_count, permissions)?)
    }

    /// The SPMC mapped the memory before answering: give it back when the answer is unusable.
    fn relinquish_rejected(&mut self, handle: MemoryHandle) {
        let own_id = self.own_id;

        if let Err(err) = self.memory_relinquish(handle, &[own_id], &TransactionFlags::default()) {
            error!("rejected retrieve of {handle:?} stays mapped: {err}");
        }
    }

    fn transaction_rxtx(
        &mut self,
        transaction: Transaction,
        descriptor: &MemoryDescriptor,
        access: &[MemoryAccessDescriptor],
        regions: &[MemoryRegion],
    ) -> SpResult<MemoryHandle> {
        check_transaction(access, regions)?;

        let RxTxBuffers { tx, .. } = self.rxtx.as_mut().ok_or(Error::InvalidState)?;
        let used =
            descriptor::build_transaction(tx, descriptor, access, regions, MemoryHandle::UNUSED)?;

        self.send_transaction(transaction, used, DescriptorBuffer::RxTx)
    }

    fn transaction_dynamic(
        &mut self,
        transaction: Transaction,
        descriptor: &MemoryDescriptor,
        access: &[MemoryAccessDescriptor],
        regions: &[MemoryRegion],
        buffer: &mut TransactionBuffer,
    ) -> SpResult<MemoryHandle> {
        check_transaction(access, regions)?;
        let target = dynamic_buffer(buffer)?;

        buffer.build_transaction(descriptor, access, regions, MemoryHandle::UNUSED)?;

        self.send_transaction(transaction, buffer.used(), target)
    }

    fn send_transaction(
        &mut self,
        transaction: Transaction,
        used: usize,
        target: DescriptorBuffer,
    ) -> SpResult<MemoryHandle> {
        let length = descriptor_length(used)?;

        let handle = match transaction {
            Transaction::Donate => self.ffa.mem_donate(length, length, target),
            Transaction::Lend => self.ffa.mem_lend(length, length, target),
            Transaction::Share => self.ffa.mem_share(length, length, target),
        }
        .inspect_err(|err| error!("memory {transaction:?} failed: {err}"))?;

        debug!("memory {transaction:?}: {handle:?}");
        Ok(handle)
    }

    fn dynamic_is_supported(&mut self, function_id: FunctionId) -> SpResult<bool> {
        let properties = self.ffa.features(function_id)?;

        Ok(properties[0] & FEATURES_MEM_DYNAMIC_BUFFER_SUPPORT != 0)
    }
}

fn retrieved(
    response: libffa::RetrieveResponse,
    bytes: &[u8],
    tag: u64,
    regions_out: &mut [MemoryRegion],
) -> SpResult<RetrievedMemory> {
    // Fragmented transactions are not supported
    if response.total_length != response.fragment_length {
        error!(
            "fragmented retrieve response ({} of {} bytes)",
            response.fragment_length, response.total_length
        );
        return Err(Error::Internal);
    }

    let mut access = [MemoryAccessDescriptor::default()];
    let parsed = descriptor::parse_transaction(bytes, tag, &mut access, regions_out)
        .inspect_err(|err| error!("malformed retrieve response: {err}"))?;

    Ok(RetrievedMemory {
        descriptor: parsed.descriptor,
        access: access[0],
        region_count: parsed.region_count,
    })
}
