//! # kc-storage
//!
//! Storage abstraction traits for authentication flow definitions.
//!
//! This crate defines the provider interfaces that concrete storage
//! backends implement. The flow engine and the management API only ever
//! talk to these traits.
//!
//! ## Provider Traits
//!
//! - [`AuthenticationFlowProvider`] - flows and realm flow bindings
//! - [`AuthenticationExecutionProvider`] - executions, read back in sibling order
//! - [`AuthenticatorConfigProvider`] - authenticator configs and their bindings
//! - [`AuthenticationStore`] - all of the above
//!
//! ## Atomicity
//!
//! Every mutator is atomic with respect to its realm: a reader either sees
//! the whole change or none of it. Cascades (flow removal dropping its
//! executions, config removal unbinding executions) are part of the same
//! step.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod authenticator_config;
pub mod error;
pub mod execution;
pub mod flow;

pub use authenticator_config::AuthenticatorConfigProvider;
pub use error::{StorageError, StorageResult};
pub use execution::AuthenticationExecutionProvider;
pub use flow::AuthenticationFlowProvider;

/// A complete flow definition store.
///
/// Implemented automatically for any type providing all three provider traits.
pub trait AuthenticationStore:
    AuthenticationFlowProvider + AuthenticationExecutionProvider + AuthenticatorConfigProvider
{
}

impl<T> AuthenticationStore for T where
    T: AuthenticationFlowProvider + AuthenticationExecutionProvider + AuthenticatorConfigProvider
{
}
