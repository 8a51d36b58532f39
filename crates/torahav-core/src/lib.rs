//! Core types and trait definitions for Torah Av.
//!
//! This crate is deliberately free of HTTP and runtime dependencies. The
//! gateway implementations and the terminal client depend on it; it depends
//! on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod gateway;
pub mod likes;
pub mod mapper;
pub mod model;
pub mod route;
pub mod row;
pub mod session;
pub mod validation;

pub use error::{Error, Result};
