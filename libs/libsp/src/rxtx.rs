use libffa::{Conduit, InterruptHandler, PAGE_SIZE};
use log::{debug, error};

use crate::{Error, SpContext, SpResult};

/// RX/TX buffer pair shared with the SPMC.
#[derive(Debug)]
pub struct RxTxBuffers<'a> {
    pub tx: &'a mut [u8],
    pub rx: &'a mut [u8],
}

fn is_page_aligned(buffer: &[u8]) -> bool {
    (buffer.as_ptr() as usize) % PAGE_SIZE == 0
}

impl<'a, C: Conduit, H: InterruptHandler> SpContext<'a, C, H> {
    /// Map the RX/TX pair. Both buffers must have the same page-multiple size.
    pub fn rxtx_map(&mut self, tx: &'a mut [u8], rx: &'a mut [u8]) -> SpResult<()> {
        if self.rxtx.is_some() {
            return Err(Error::InvalidState);
        }

        if tx.is_empty()
            || tx.len() != rx.len()
            || tx.len() % PAGE_SIZE != 0
            || !is_page_aligned(tx)
            || !is_page_aligned(rx)
        {
            return Err(Error::InvalidParameters);
        }

        let page_count =
            u32::try_from(tx.len() / PAGE_SIZE).map_err(|_| Error::InvalidParameters)?;

        self.ffa
            .rxtx_map(tx.as_ptr() as u64, rx.as_ptr() as u64, page_count)
            .inspect_err(|err| error!("RX/TX map failed: {err}"))?;

        debug!("RX/TX mapped, {page_count} page(s)");
        self.rxtx = Some(RxTxBuffers { tx, rx });

        Ok(())
    }

    /// Unmap the RX/TX pair and hand the buffers back.
    pub fn rxtx_unmap(&mut self) -> SpResult<RxTxBuffers<'a>> {
        if self.rxtx.is_none() {
            return Err(Error::InvalidState);
        }

        self.ffa.rxtx_unmap(self.own_id)?;

        self.rxtx.take().ok_or(Error::InvalidState)
    }

    pub fn is_rxtx_mapped(&self) -> bool {
        self.rxtx.is_some()
    }

    pub fn tx_buffer(&mut self) -> SpResult<&mut [u8]> {
        self.rxtx
            .as_mut()
            .map(|buffers| &mut *buffers.tx)
            .ok_or(Error::InvalidState)
    }

    pub fn rx_buffer(&self) -> SpResult<&[u8]> {
        self.rxtx
            .as_ref()
            .map(|buffers| &*buffers.rx)
            .ok_or(Error::InvalidState)
    }
}
