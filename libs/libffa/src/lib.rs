#![cfg_attr(not(test), no_std)]

#[cfg(any(test, feature = "mock"))]
extern crate alloc;

mod conduit;
mod discovery;
mod logging;
mod memory;
mod messaging;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use conduit::*;
pub use logging::CONSOLE_LOG_MAX_CHARS;
pub use memory::{DescriptorBuffer, RetrieveResponse};
pub use messaging::{InterruptHandler, UnhandledInterrupt};

pub use ::ffa::{
    AccessPermissions, Cacheability, DataAccess, DeviceMemoryAttributes, DirectArgs,
    DirectMessage, Error, FEATURES_MEM_DYNAMIC_BUFFER_SUPPORT, FunctionId, InstructionAccess,
    MemoryHandle, MemoryPermissions, MemoryType, PAGE_SIZE, PartitionId, PartitionInformation,
    PartitionProperties, PermDataAccess, Shareability, TransactionFlags, TransactionType, Uuid,
    Version,
};

pub type FfaResult<T> = Result<T, Error>;

/// Raw register file of one FF-A call (x0..x7).
pub type Registers = [u64; 8];

/// Build the register file of a call: function id in x0, arguments in x1..x7.
pub fn registers(function_id: FunctionId, args: [u64; 7]) -> Registers {
    let mut regs = [0u64; 8];
    regs[0] = function_id.into();
    regs[1..].copy_from_slice(&args);
    regs
}

/// FF-A ABI bound to a conduit.
///
/// Every method performs exactly one call (the blocking messaging calls may
/// re-issue FFA_MSG_WAIT after an interrupt, see [`InterruptHandler`]).
#[derive(Debug)]
pub struct Ffa<C: Conduit, H: InterruptHandler = UnhandledInterrupt> {
    conduit: C,
    interrupt_handler: H,
}

impl<C: Conduit> Ffa<C> {
    pub const fn new(conduit: C) -> Self {
        Self {
            conduit,
            interrupt_handler: UnhandledInterrupt,
        }
    }
}

impl<C: Conduit, H: InterruptHandler> Ffa<C, H> {
    pub fn with_interrupt_handler(conduit: C, interrupt_handler: H) -> Self {
        Self {
            conduit,
            interrupt_handler,
        }
    }

    pub fn conduit(&self) -> &C {
        &self.conduit
    }

    pub fn conduit_mut(&mut self) -> &mut C {
        &mut self.conduit
    }

    pub fn into_conduit(self) -> C {
        self.conduit
    }

    fn call(&mut self, function_id: FunctionId, args: [u64; 7]) -> Registers {
        self.conduit.call(registers(function_id, args))
    }
}

fn error_code(regs: &Registers) -> Error {
    Error::from_code(regs[2] as u32 as i32)
}

fn check_error(regs: &Registers) -> FfaResult<()> {
    if regs[0] as u32 == FunctionId::Error as u32 {
        Err(error_code(regs))
    } else {
        Ok(())
    }
}

/// Accept FFA_SUCCESS_32/64 only. Anything but an error or a success is a protocol violation.
fn expect_success(regs: &Registers) -> FfaResult<()> {
    check_error(regs)?;

    match FunctionId::from_raw(regs[0]) {
        Some(FunctionId::Success32 | FunctionId::Success64) => Ok(()),
        _ => unexpected_result(regs),
    }
}

fn unexpected_result(regs: &Registers) -> ! {
    panic!("unexpected FF-A result {:#x}", regs[0]);
}
