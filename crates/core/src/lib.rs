//! Core types shared across the trellis crates
//!
//! This crate provides the foundational pieces used everywhere else:
//! - The unified error type and `Result` alias
//! - Stable integer codes for the C ABI

pub mod error;

pub use error::{Error, Result};
