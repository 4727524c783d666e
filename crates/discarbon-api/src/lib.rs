//! discarbon-api: HTTP API layer for the disCarbon settlement desk
//!
//! Exposes quoting, settlement and ledger reads over JSON. A single
//! [`carbon::SettlementExecutor`] sits behind a mutex, so settlements are
//! applied one at a time.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::{AppState, RequestError};
