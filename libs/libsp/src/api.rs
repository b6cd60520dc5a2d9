//! Traits the RPC layer is written against, implemented by [`SpContext`].
//!
//! Keeping the RPC layer generic over them lets it run against recording
//! fakes instead of a scripted conduit.

use libffa::{Conduit, InterruptHandler, MemoryHandle, PartitionId, TransactionFlags, Uuid};

use crate::{
    MemoryAccessDescriptor, MemoryDescriptor, MemoryRegion, RetrievedMemory, SpContext, SpMsg,
    SpResult,
};

pub trait Partition {
    fn own_id(&self) -> PartitionId;
}

pub trait Messaging: Partition {
    fn msg_send_direct_req(&mut self, req: &SpMsg) -> SpResult<SpMsg>;
}

pub trait MemoryManagement: Partition {
    fn memory_share(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &[MemoryAccessDescriptor],
        regions: &[MemoryRegion],
    ) -> SpResult<MemoryHandle>;

    fn memory_retrieve(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &MemoryAccessDescriptor,
        regions: &[MemoryRegion],
        handle: MemoryHandle,
        regions_out: &mut [MemoryRegion],
    ) -> SpResult<RetrievedMemory>;

    fn memory_relinquish(
        &mut self,
        handle: MemoryHandle,
        endpoints: &[PartitionId],
        flags: &TransactionFlags,
    ) -> SpResult<()>;

    fn memory_reclaim(&mut self, handle: MemoryHandle, flags: u32) -> SpResult<()>;
}

pub trait Discovery {
    fn partition_ids_get(&mut self, uuid: &Uuid, ids: &mut [PartitionId]) -> SpResult<usize>;
}

impl<C: Conduit, H: InterruptHandler> Partition for SpContext<'_, C, H> {
    fn own_id(&self) -> PartitionId {
        SpContext::own_id(self)
    }
}

impl<C: Conduit, H: InterruptHandler> Messaging for SpContext<'_, C, H> {
    fn msg_send_direct_req(&mut self, req: &SpMsg) -> SpResult<SpMsg> {
        SpContext::msg_send_direct_req(self, req)
    }
}

impl<C: Conduit, H: InterruptHandler> MemoryManagement for SpContext<'_, C, H> {
    fn memory_share(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &[MemoryAccessDescriptor],
        regions: &[MemoryRegion],
    ) -> SpResult<MemoryHandle> {
        SpContext::memory_share(self, descriptor, access, regions)
    }

    fn memory_retrieve(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &MemoryAccessDescriptor,
        regions: &[MemoryRegion],
        handle: MemoryHandle,
        regions_out: &mut [MemoryRegion],
    ) -> SpResult<RetrievedMemory> {
        SpContext::memory_retrieve(self, descriptor, access, regions, handle, regions_out)
    }

    fn memory_relinquish(
        &mut self,
        handle: MemoryHandle,
        endpoints: &[PartitionId],
        flags: &TransactionFlags,
    ) -> SpResult<()> {
        SpContext::memory_relinquish(self, handle, endpoints, flags)
    }

    fn memory_reclaim(&mut self, handle: MemoryHandle, flags: u32) -> SpResult<()> {
        SpContext::memory_reclaim(self, handle, flags)
    }
}

impl<C: Conduit, H: InterruptHandler> Discovery for SpContext<'_, C, H> {
    fn partition_ids_get(&mut self, uuid: &Uuid, ids: &mut [PartitionId]) -> SpResult<usize> {
        SpContext::partition_ids_get(self, uuid, ids)
    }
}
