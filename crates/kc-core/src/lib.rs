//! # kc-core
//!
//! Core utilities, configuration, and error handling shared by the
//! authentication flow crates.
//!
//! - [`config`] - engine and management configuration loaded from the environment
//! - [`error`] - core error type
//! - [`event`] - audit events for authentication attempts and flow administration

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod event;

pub use config::{AdminConfig, Config, EngineConfig};
pub use error::{Error, Result};
