//! # kc-storage-memory
//!
//! In-memory implementation of the [`kc_storage`] provider traits.
//!
//! Suitable for tests, embedded use and single-node deployments where flow
//! definitions are seeded at startup.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod store;

pub use store::InMemoryAuthenticationStore;
