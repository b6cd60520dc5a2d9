//! Recording implementation of the partition traits, driven by queued results

use std::collections::VecDeque;
use std::vec::Vec;

use libsp::{
    Discovery, Error, MemoryAccessDescriptor, MemoryDescriptor, MemoryHandle, MemoryManagement,
    MemoryRegion, Messaging, Partition, PartitionId, RetrievedMemory, SpMsg, SpResult,
    TransactionFlags, Uuid,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieve {
    pub descriptor: MemoryDescriptor,
    pub access: MemoryAccessDescriptor,
    pub regions_in: usize,
    pub regions_out: usize,
    pub handle: MemoryHandle,
}

#[derive(Debug, Default)]
pub struct FakeSp {
    pub own_id: PartitionId,
    pub partition_ids: Vec<PartitionId>,

    pub share_results: VecDeque<SpResult<MemoryHandle>>,
    pub retrieve_results: VecDeque<SpResult<MemoryRegion>>,
    pub relinquish_results: VecDeque<SpResult<()>>,
    pub reclaim_results: VecDeque<SpResult<()>>,
    pub responses: VecDeque<SpResult<SpMsg>>,

    pub shares: Vec<(MemoryDescriptor, Vec<MemoryAccessDescriptor>, Vec<MemoryRegion>)>,
    pub retrieves: Vec<Retrieve>,
    pub relinquishes: Vec<(MemoryHandle, Vec<PartitionId>, TransactionFlags)>,
    pub reclaims: Vec<(MemoryHandle, u32)>,
    pub requests: Vec<SpMsg>,
}

impl FakeSp {
    pub fn new(own_id: PartitionId) -> Self {
        Self {
            own_id,
            ..Default::default()
        }
    }
}

fn next<T>(queue: &mut VecDeque<SpResult<T>>, what: &str) -> SpResult<T> {
    queue
        .pop_front()
        .unwrap_or_else(|| panic!("unexpected {what}"))
}

impl Partition for FakeSp {
    fn own_id(&self) -> PartitionId {
        self.own_id
    }
}

impl Messaging for FakeSp {
    fn msg_send_direct_req(&mut self, req: &SpMsg) -> SpResult<SpMsg> {
        self.requests.push(*req);
        next(&mut self.responses, "direct request")
    }
}

impl MemoryManagement for FakeSp {
    fn memory_share(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &[MemoryAccessDescriptor],
        regions: &[MemoryRegion],
    ) -> SpResult<MemoryHandle> {
        self.shares
            .push((*descriptor, access.to_vec(), regions.to_vec()));
        next(&mut self.share_results, "memory share")
    }

    fn memory_retrieve(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &MemoryAccessDescriptor,
        regions: &[MemoryRegion],
        handle: MemoryHandle,
        regions_out: &mut [MemoryRegion],
    ) -> SpResult<RetrievedMemory> {
        self.retrieves.push(Retrieve {
            descriptor: *descriptor,
            access: *access,
            regions_in: regions.len(),
            regions_out: regions_out.len(),
            handle,
        });

        let region = next(&mut self.retrieve_results, "memory retrieve")?;
        let slot = regions_out.first_mut().ok_or(Error::InvalidParameters)?;
        *slot = region;

        Ok(RetrievedMemory {
            descriptor: *descriptor,
            access: *access,
            region_count: 1,
        })
    }

    fn memory_relinquish(
        &mut self,
        handle: MemoryHandle,
        endpoints: &[PartitionId],
        flags: &TransactionFlags,
    ) -> SpResult<()> {
        self.relinquishes.push((handle, endpoints.to_vec(), *flags));
        next(&mut self.relinquish_results, "memory relinquish")
    }

    fn memory_reclaim(&mut self, handle: MemoryHandle, flags: u32) -> SpResult<()> {
        self.reclaims.push((handle, flags));
        next(&mut self.reclaim_results, "memory reclaim")
    }
}

impl Discovery for FakeSp {
    fn partition_ids_get(&mut self, _uuid: &Uuid, ids: &mut [PartitionId]) -> SpResult<usize> {
        let count = self.partition_ids.len().min(ids.len());
        ids[..count].copy_from_slice(&self.partition_ids[..count]);
        Ok(count)
    }
}
