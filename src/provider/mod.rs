//! LLM Provider layer
//!
//! Resolves which backend to talk to (hosted APIs or local inference servers)
//! and exposes one generate/health-check client over their wire protocols.

mod client;
mod config;
mod env;
mod error;
pub mod global;
mod kind;

pub use client::*;
pub use config::*;
pub use env::*;
pub use error::*;
pub use kind::*;
