use super::{Conduit, Ffa, FfaResult, FunctionId, InterruptHandler, expect_success};

/// Characters carried by one FFA_CONSOLE_LOG_32 call (six words of four).
pub const CONSOLE_LOG_MAX_CHARS: usize = 24;

impl<C: Conduit, H: InterruptHandler> Ffa<C, H> {
    /// Print to the SPMC console, splitting the message over as many calls as needed.
    pub fn console_log(&mut self, message: &[u8]) -> FfaResult<()> {
        for chunk in message.chunks(CONSOLE_LOG_MAX_CHARS) {
            let mut args = [0u64; 7];
            args[0] = chunk.len() as u64;

            for (word, chars) in args[1..].iter_mut().zip(chunk.chunks(4)) {
                let mut packed = [0u8; 4];
                packed[..chars.len()].copy_from_slice(chars);
                *word = u32::from_le_bytes(packed) as u64;
            }

            let regs = self.call(FunctionId::ConsoleLog32, args);
            expect_success(&regs)?;
        }

        Ok(())
    }
}
