use log::warn;

use super::{
    Conduit, DirectArgs, DirectMessage, Ffa, FfaResult, FunctionId, PartitionId, Registers,
    error_code, unexpected_result,
};

/// Callback run when a blocking call is preempted by FFA_INTERRUPT.
///
/// It is invoked once per interrupt, before FFA_MSG_WAIT is re-issued. It must
/// not start a direct message exchange of its own.
pub trait InterruptHandler {
    fn handle_interrupt(&mut self, interrupt_id: u32);
}

impl<F: FnMut(u32)> InterruptHandler for F {
    fn handle_interrupt(&mut self, interrupt_id: u32) {
        self(interrupt_id)
    }
}

/// Default handler: interrupts are logged and dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnhandledInterrupt;

impl InterruptHandler for UnhandledInterrupt {
    fn handle_interrupt(&mut self, interrupt_id: u32) {
        warn!("unhandled interrupt {interrupt_id}");
    }
}

const DIRECT_REQUESTS: [FunctionId; 2] = [
    FunctionId::MsgSendDirectReq32,
    FunctionId::MsgSendDirectReq64,
];

const DIRECT_RESPONSES: [FunctionId; 2] = [
    FunctionId::MsgSendDirectResp32,
    FunctionId::MsgSendDirectResp64,
];

impl<C: Conduit, H: InterruptHandler> Ffa<C, H> {
    /// Block until a direct request arrives.
    pub fn msg_wait(&mut self) -> FfaResult<DirectMessage> {
        let regs = self.call(FunctionId::MsgWait, [0; 7]);

        self.complete_blocking_call(regs, DIRECT_REQUESTS)
    }

    /// Send a direct request with 32-bit arguments and block until the response.
    pub fn msg_send_direct_req_32(
        &mut self,
        source_id: PartitionId,
        destination_id: PartitionId,
        args: [u32; 5],
    ) -> FfaResult<DirectMessage> {
        let regs = self.send_direct(
            FunctionId::MsgSendDirectReq32,
            source_id,
            destination_id,
            DirectArgs::Args32(args),
        );

        self.complete_blocking_call(regs, DIRECT_RESPONSES)
    }

    /// Send a direct request with 64-bit arguments and block until the response.
    pub fn msg_send_direct_req_64(
        &mut self,
        source_id: PartitionId,
        destination_id: PartitionId,
        args: [u64; 5],
    ) -> FfaResult<DirectMessage> {
        let regs = self.send_direct(
            FunctionId::MsgSendDirectReq64,
            source_id,
            destination_id,
            DirectArgs::Args64(args),
        );

        self.complete_blocking_call(regs, DIRECT_RESPONSES)
    }

    /// Send a direct response with 32-bit arguments and block until the next request.
    pub fn msg_send_direct_resp_32(
        &mut self,
        source_id: PartitionId,
        destination_id: PartitionId,
        args: [u32; 5],
    ) -> FfaResult<DirectMessage> {
        let regs = self.send_direct(
            FunctionId::MsgSendDirectResp32,
            source_id,
            destination_id,
            DirectArgs::Args32(args),
        );

        self.complete_blocking_call(regs, DIRECT_REQUESTS)
    }

    /// Send a direct response with 64-bit arguments and block until the next request.
    pub fn msg_send_direct_resp_64(
        &mut self,
        source_id: PartitionId,
        destination_id: PartitionId,
        args: [u64; 5],
    ) -> FfaResult<DirectMessage> {
        let regs = self.send_direct(
            FunctionId::MsgSendDirectResp64,
            source_id,
            destination_id,
            DirectArgs::Args64(args),
        );

        self.complete_blocking_call(regs, DIRECT_REQUESTS)
    }

    fn send_direct(
        &mut self,
        function_id: FunctionId,
        source_id: PartitionId,
        destination_id: PartitionId,
        args: DirectArgs,
    ) -> Registers {
        let words = args.to_words();

        self.call(
            function_id,
            [
                DirectMessage::endpoints_word(source_id, destination_id),
                0,
                words[0],
                words[1],
                words[2],
                words[3],
                words[4],
            ],
        )
    }

    /// Service interrupts until the blocking call terminates, then decode the terminal result.
    fn complete_blocking_call(
        &mut self,
        mut regs: Registers,
        expected: [FunctionId; 2],
    ) -> FfaResult<DirectMessage> {
        loop {
            match FunctionId::from_raw(regs[0]) {
                Some(FunctionId::Interrupt) => {
                    self.interrupt_handler.handle_interrupt(regs[2] as u32);
                    regs = self.call(FunctionId::MsgWait, [0; 7]);
                }
                Some(FunctionId::Error) => return Err(error_code(&regs)),
                Some(id @ (FunctionId::Success32 | FunctionId::Success64)) => {
                    return Ok(DirectMessage::success(id));
                }
                Some(id) if expected.contains(&id) => return Ok(unpack_direct(id, &regs)),
                _ => unexpected_result(&regs),
            }
        }
    }
}

fn unpack_direct(function_id: FunctionId, regs: &Registers) -> DirectMessage {
    let (source_id, destination_id) = DirectMessage::split_endpoints_word(regs[1]);

    let args = if function_id.is_64bit() {
        DirectArgs::Args64([regs[3], regs[4], regs[5], regs[6], regs[7]])
    } else {
        DirectArgs::Args32([
            regs[3] as u32,
            regs[4] as u32,
            regs[5] as u32,
            regs[6] as u32,
            regs[7] as u32,
        ])
    };

    DirectMessage {
        function_id,
        source_id,
        destination_id,
        args,
    }
}
