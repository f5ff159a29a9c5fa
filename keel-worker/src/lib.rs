//! # KEEL Worker
//!
//! The cache coordinator of a site: pre-populates a named cache on install,
//! drops stale caches on activate and answers intercepted requests.
//!
//! ## Strategies
//!
//! | Request                                   | Strategy               |
//! |-------------------------------------------|------------------------|
//! | non-GET                                   | passthrough            |
//! | navigation or `Accept` includes HTML      | network-first (2.5 s)  |
//! | any other GET                             | stale-while-revalidate |
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use keel_worker::{Clients, Registration, Worker, WorkerConfig};
//!
//! let clients = Arc::new(Clients::new());
//! let registration = Registration::new(clients.clone());
//! let worker = Worker::new(WorkerConfig::for_scope("https://example.com/")?, storage, fetcher, clients)?;
//! registration.register(Arc::new(worker)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod clients;
pub mod config;
pub mod lifecycle;
pub mod registration;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use clients::Clients;
pub use config::WorkerConfig;
pub use lifecycle::WorkerState;
pub use registration::Registration;
pub use worker::{FetchOutcome, Worker};
