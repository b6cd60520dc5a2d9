use libffa::{Conduit, InterruptHandler, PartitionId, PartitionInformation, Uuid, Version};
use log::error;

use crate::{Error, SpContext, SpResult};

impl<'a, C: Conduit, H: InterruptHandler> SpContext<'a, C, H> {
    pub fn ffa_version(&mut self) -> SpResult<Version> {
        Ok(self.ffa.version()?)
    }

    /// Id of the first partition implementing `uuid`.
    pub fn partition_id_get(&mut self, uuid: &Uuid) -> SpResult<PartitionId> {
        Ok(self.partition_info_get(uuid)?.partition_id)
    }

    /// Information of the first partition implementing `uuid`.
    pub fn partition_info_get(&mut self, uuid: &Uuid) -> SpResult<PartitionInformation> {
        // The nil UUID selects every partition, see partition_info_get_all
        if uuid.is_nil() {
            return Err(Error::InvalidParameters);
        }

        let mut first = None;
        self.read_partition_info(uuid, |index, info| {
            if index == 0 {
                first = Some(info);
            }
        })?;

        first.ok_or(Error::NotFound)
    }

    /// Information of every partition, up to the capacity of `info`. Returns the number written.
    pub fn partition_info_get_all(&mut self, info: &mut [PartitionInformation]) -> SpResult<usize> {
        let count = self.read_partition_info(&Uuid::nil(), |index, record| {
            if let Some(slot) = info.get_mut(index) {
                *slot = record;
            }
        })?;

        Ok(count.min(info.len()))
    }

    /// Ids of the partitions implementing `uuid`, up to the capacity of `ids`.
    /// Returns the number written.
    pub fn partition_ids_get(&mut self, uuid: &Uuid, ids: &mut [PartitionId]) -> SpResult<usize> {
        if uuid.is_nil() {
            return Err(Error::InvalidParameters);
        }

        let count = self.read_partition_info(uuid, |index, record| {
            if let Some(slot) = ids.get_mut(index) {
                *slot = record.partition_id;
            }
        })?;

        Ok(count.min(ids.len()))
    }

    /// Run FFA_PARTITION_INFO_GET and visit each record, then release the RX buffer.
    fn read_partition_info(
        &mut self,
        uuid: &Uuid,
        mut visit: impl FnMut(usize, PartitionInformation),
    ) -> SpResult<usize> {
        let rx = &self.rxtx.as_ref().ok_or(Error::InvalidState)?.rx;

        let count = self.ffa.partition_info_get(uuid)? as usize;

        let records = count
            .checked_mul(PartitionInformation::SIZE)
            .and_then(|size| rx.get(..size));

        let Some(records) = records else {
            error!("{count} partition records do not fit the RX buffer");
            // The SPMC handed us the buffer, give it back regardless
            self.ffa.rx_release()?;
            return Err(Error::Internal);
        };

        for (index, record) in records
            .chunks_exact(PartitionInformation::SIZE)
            .enumerate()
        {
            let mut bytes = [0u8; PartitionInformation::SIZE];
            bytes.copy_from_slice(record);
            visit(index, PartitionInformation::from_bytes(&bytes));
        }

        self.ffa.rx_release()?;

        Ok(count)
    }
}
