#![cfg_attr(not(test), no_std)]

mod call_req;
mod caller;
mod demux;
mod endpoint;
#[cfg(test)]
mod fake;
mod protocol;
mod service;
mod status;

pub use call_req::{CallReq, OpStatus, RpcInterface};
pub use caller::{CallResponse, CallerError, FfaRpcCaller};
pub use demux::RpcDemux;
pub use endpoint::CallEndpoint;
pub use protocol::{MANAGEMENT_INTERFACE_ID, ManagementOpcode};
pub use service::{ServiceHandler, ServiceProvider};
pub use status::RpcStatus;
