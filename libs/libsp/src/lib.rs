#![cfg_attr(not(test), no_std)]

mod api;
mod context;
pub mod descriptor;
mod discovery;
mod error;
pub mod logging;
mod memory;
mod messaging;
mod rxtx;

pub use api::{Discovery, MemoryManagement, Messaging, Partition};
pub use context::SpContext;
pub use descriptor::{
    DescriptorError, MemoryAccessDescriptor, MemoryDescriptor, MemoryRegion, TransactionBuffer,
};
pub use error::{Error, SpResult};
pub use memory::RetrievedMemory;
pub use messaging::{SpMsg, SpMsgArgs};
pub use rxtx::RxTxBuffers;

pub use libffa::{
    Cacheability, Conduit, DataAccess, InstructionAccess, InterruptHandler, MemoryHandle,
    MemoryPermissions, MemoryType, PAGE_SIZE, PartitionId, PartitionInformation,
    PartitionProperties, PermDataAccess, Shareability, TransactionFlags, TransactionType,
    UnhandledInterrupt, Uuid, Version,
};
