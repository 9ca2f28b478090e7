//! Wires the Authorization Server, Protected-Resource middleware, and tool registry into
//! one multi-mount listener.

pub mod dispatcher;
pub mod rpc_handler;
pub mod sink;

pub use dispatcher::build_router;
