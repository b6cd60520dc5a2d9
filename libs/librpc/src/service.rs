use crate::{CallReq, RpcInterface, RpcStatus};

/// Binds an opcode to a method of the service context.
pub struct ServiceHandler<T> {
    pub opcode: u16,
    pub method: fn(&mut T, &mut CallReq) -> RpcStatus,
}

impl<T> ServiceHandler<T> {
    pub const fn new(opcode: u16, method: fn(&mut T, &mut CallReq) -> RpcStatus) -> Self {
        Self { opcode, method }
    }
}

/// Dispatches calls to a table of handlers by opcode.
///
/// Opcodes not found in the table are passed to the successor, if any. The
/// opcode range of the table is computed once so a provider that cannot
/// match is skipped without scanning it.
pub struct ServiceProvider<'a, T> {
    context: T,
    handlers: &'a [ServiceHandler<T>],
    opcode_range: Option<(u16, u16)>,
    successor: Option<&'a mut dyn RpcInterface>,
}

impl<'a, T> ServiceProvider<'a, T> {
    pub fn new(context: T, handlers: &'a [ServiceHandler<T>]) -> Self {
        let opcode_range = handlers.iter().fold(None, |range, handler| match range {
            None => Some((handler.opcode, handler.opcode)),
            Some((min, max)) => Some((handler.opcode.min(min), handler.opcode.max(max))),
        });

        Self {
            context,
            handlers,
            opcode_range,
            successor: None,
        }
    }

    /// Chain a provider that serves the opcodes this one does not.
    pub fn with_successor(mut self, successor: &'a mut dyn RpcInterface) -> Self {
        self.successor = Some(successor);
        self
    }

    pub fn context(&self) -> &T {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut T {
        &mut self.context
    }

    fn find_handler(&self, opcode: u16) -> Option<&ServiceHandler<T>> {
        let (min, max) = self.opcode_range?;
        if opcode < min || opcode > max {
            return None;
        }

        self.handlers.iter().find(|handler| handler.opcode == opcode)
    }
}

impl<T> RpcInterface for ServiceProvider<'_, T> {
    fn receive(&mut self, req: &mut CallReq) -> RpcStatus {
        if let Some(handler) = self.find_handler(req.opcode()) {
            let method = handler.method;
            return method(&mut self.context, req);
        }

        match &mut self.successor {
            Some(successor) => successor.receive(req),
            None => RpcStatus::InvalidOpcode,
        }
    }
}
