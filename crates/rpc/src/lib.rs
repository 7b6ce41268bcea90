//! HTTP control surface for a single node.
//!
//! One server per node, fronting that node's [`EngineHandle`]:
//!
//! - `GET /status` - liveness probe (200 `live`, 500 `faulty`)
//! - `GET /start` - kick the engine out of idle
//! - `GET /stop` - halt the engine; idempotent
//! - `GET /state` - JSON snapshot of the node's state
//! - `POST /message` - inbound consensus message delivery
//!
//! A faulty node still answers HTTP (the process is up) but refuses
//! everything except `/status` and `/state`, which report the fault.
//!
//! [`EngineHandle`]: benor_consensus::EngineHandle

mod handlers;
mod routes;
mod server;
mod types;

pub use routes::create_router;
pub use server::{serve_handles, RpcServer, RpcServerConfig, RpcServerError, RpcServerHandle};
pub use types::*;
