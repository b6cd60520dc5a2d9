use libffa::{Conduit, Ffa, InterruptHandler, PartitionId, UnhandledInterrupt};
use log::debug;

use crate::{RxTxBuffers, SpResult};

/// Runtime state of one secure partition.
///
/// Built once at partition start and passed to everything that talks to the SPMC.
#[derive(Debug)]
pub struct SpContext<'a, C: Conduit, H: InterruptHandler = UnhandledInterrupt> {
    pub(crate) ffa: Ffa<C, H>,
    pub(crate) own_id: PartitionId,
    pub(crate) rxtx: Option<RxTxBuffers<'a>>,
}

impl<'a, C: Conduit, H: InterruptHandler> SpContext<'a, C, H> {
    /// Query the partition id and build the context.
    pub fn init(mut ffa: Ffa<C, H>) -> SpResult<Self> {
        let own_id = ffa.id_get()?;
        debug!("partition id {own_id:#06x}");

        Ok(Self::with_own_id(ffa, own_id))
    }

    pub fn with_own_id(ffa: Ffa<C, H>, own_id: PartitionId) -> Self {
        Self {
            ffa,
            own_id,
            rxtx: None,
        }
    }

    pub fn own_id(&self) -> PartitionId {
        self.own_id
    }

    pub fn ffa(&self) -> &Ffa<C, H> {
        &self.ffa
    }

    pub fn ffa_mut(&mut self) -> &mut Ffa<C, H> {
        &mut self.ffa
    }

    pub fn into_ffa(self) -> Ffa<C, H> {
        self.ffa
    }
}
