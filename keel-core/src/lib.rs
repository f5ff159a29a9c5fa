//! # KEEL Core
//!
//! Core types, errors, and host traits for the KEEL offline asset cache.
//!
//! This crate provides the foundational building blocks used by all other KEEL crates:
//!
//! - **Types**: Requests, responses, headers, match options and worker messages
//! - **Errors**: A single error enum with a crate-wide `Result` alias
//! - **Constants**: Default cache name, core assets and timeouts
//! - **Traits**: The host interfaces (cache storage, network fetch) a worker runs against
//!
//! ## Example
//!
//! ```rust
//! use keel_core::{Request, RequestMode};
//!
//! let req = Request::get("https://example.com/index.html?v=2").unwrap();
//! assert_eq!(req.mode, RequestMode::Cors);
//! assert_eq!(req.url.query(), Some("v=2"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{KeelError, Result};
pub use traits::*;
pub use types::*;
