//! # enscope Core
//!
//! Core types, errors, and constants shared by the enscope crates.
//!
//! This crate provides the foundational building blocks used by the resolver
//! and CLI:
//!
//! - **Types**: the resolved profile model and lookup-input classification
//! - **Errors**: error types with context
//! - **Constants**: endpoint defaults, text record keys, retry budget

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{EnscopeError, Result};
pub use types::*;
