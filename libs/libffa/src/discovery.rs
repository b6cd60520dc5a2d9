use ffa::{ID_MASK, uuid_to_words};

use super::{
    Conduit, Error, Ffa, FfaResult, FunctionId, InterruptHandler, PartitionId, Uuid, Version,
    expect_success,
};

impl<C: Conduit, H: InterruptHandler> Ffa<C, H> {
    /// Get the FF-A version implemented by the SPMC, announcing v1.0 as ours.
    pub fn version(&mut self) -> FfaResult<Version> {
        let regs = self.call(
            FunctionId::Version,
            [Version::V1_0.to_raw() as u64, 0, 0, 0, 0, 0, 0],
        );

        let raw = regs[0] as u32;
        if raw & Version::ERROR_BIT != 0 {
            return Err(Error::from_code(raw as i32));
        }

        Ok(Version::from_raw(raw))
    }

    /// Query the properties of an FF-A interface.
    pub fn features(&mut self, function_id: FunctionId) -> FfaResult<[u32; 2]> {
        let regs = self.call(
            FunctionId::Features,
            [u64::from(function_id), 0, 0, 0, 0, 0, 0],
        );

        expect_success(&regs)?;

        Ok([regs[2] as u32, regs[3] as u32])
    }

    /// Give the ownership of the RX buffer back to the SPMC.
    pub fn rx_release(&mut self) -> FfaResult<()> {
        let regs = self.call(FunctionId::RxRelease, [0; 7]);

        expect_success(&regs)
    }

    /// Map the RX/TX buffer pair of the caller.
    pub fn rxtx_map(&mut self, tx_buffer: u64, rx_buffer: u64, page_count: u32) -> FfaResult<()> {
        let regs = self.call(
            FunctionId::RxTxMap32,
            [tx_buffer, rx_buffer, page_count as u64, 0, 0, 0, 0],
        );

        expect_success(&regs)
    }

    /// Unmap the RX/TX buffer pair of `id`.
    pub fn rxtx_unmap(&mut self, id: PartitionId) -> FfaResult<()> {
        let regs = self.call(FunctionId::RxTxUnmap, [(id as u64) << 16, 0, 0, 0, 0, 0, 0]);

        expect_success(&regs)
    }

    /// Write the information of the partitions matching `uuid` into the RX buffer.
    ///
    /// Returns the number of records written. The nil UUID selects every partition.
    pub fn partition_info_get(&mut self, uuid: &Uuid) -> FfaResult<u32> {
        let words = uuid_to_words(uuid);
        let regs = self.call(
            FunctionId::PartitionInfoGet,
            [
                words[0] as u64,
                words[1] as u64,
                words[2] as u64,
                words[3] as u64,
                0,
                0,
                0,
            ],
        );

        expect_success(&regs)?;

        Ok(regs[2] as u32)
    }

    /// Get the id of the caller.
    pub fn id_get(&mut self) -> FfaResult<PartitionId> {
        let regs = self.call(FunctionId::IdGet, [0; 7]);

        expect_success(&regs)?;

        Ok((regs[2] & ID_MASK) as PartitionId)
    }
}
