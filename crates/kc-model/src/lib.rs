//! # kc-model
//!
//! Domain models for authentication flows.
//!
//! - [`AuthenticationFlow`] - a named, ordered policy tree
//! - [`AuthenticationExecution`] - one node of a flow (authenticator or sub-flow)
//! - [`AuthenticatorConfig`] - key-value settings bound to executions
//! - [`RealmFlowBindings`] - flows a realm designates per purpose

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod authenticator_config;
pub mod execution;
pub mod flow;
pub mod realm;

pub use authenticator_config::AuthenticatorConfig;
pub use execution::{AuthenticationExecution, ExecutionTarget, ParseRequirementError, Requirement};
pub use flow::{flow_types, AuthenticationFlow};
pub use realm::{FlowBinding, RealmFlowBindings};
