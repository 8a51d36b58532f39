//! Gateway backends for Torah Av.
//!
//! [`SupabaseGateway`] speaks to the hosted service over HTTP;
//! [`MemoryGateway`] keeps everything in process and records every call,
//! which makes it the backend of choice for tests.

pub mod config;
pub mod error;
pub mod memory;
pub mod supabase;

pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use memory::MemoryGateway;
pub use supabase::SupabaseGateway;

#[cfg(test)]
mod tests;
