use crate::{CallReq, RpcInterface, RpcStatus};

/// Routes calls to one of `N` interfaces, indexed by the interface id of the call.
pub struct RpcDemux<'a, const N: usize = 8> {
    outputs: [Option<&'a mut dyn RpcInterface>; N],
}

impl<'a, const N: usize> RpcDemux<'a, N> {
    pub fn new() -> Self {
        Self {
            outputs: [const { None }; N],
        }
    }

    /// Attach `output` as interface `iface_id`, replacing any previous one.
    pub fn attach(
        &mut self,
        iface_id: u16,
        output: &'a mut dyn RpcInterface,
    ) -> Result<(), RpcStatus> {
        let slot = self
            .outputs
            .get_mut(iface_id as usize)
            .ok_or(RpcStatus::InterfaceDoesNotExist)?;

        *slot = Some(output);
        Ok(())
    }

    pub fn detach(&mut self, iface_id: u16) -> Option<&'a mut dyn RpcInterface> {
        self.outputs.get_mut(iface_id as usize)?.take()
    }
}

impl<const N: usize> Default for RpcDemux<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RpcInterface for RpcDemux<'_, N> {
    fn receive(&mut self, req: &mut CallReq) -> RpcStatus {
        match self.outputs.get_mut(req.interface_id() as usize) {
            Some(Some(output)) => output.receive(req),
            _ => RpcStatus::InterfaceDoesNotExist,
        }
    }
}
