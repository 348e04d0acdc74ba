//! Data Transfer Objects (DTOs) for the Admin API.
//!
//! These types define the request and response formats for the API.
//! They are separate from domain models to allow API evolution
//! without affecting internal structures.

pub mod config;
pub mod execution;
pub mod flow;

pub use config::AuthenticatorConfigRepresentation;
pub use execution::{
    AuthenticationExecutionInfo, AuthenticationExecutionRepresentation, NewExecutionFlowRequest,
    NewExecutionRequest, UpdateExecutionRequest,
};
pub use flow::{
    AuthenticationFlowRepresentation, CopyFlowRequest, CreateFlowRequest, FlowBindingRequest,
    UpdateFlowRequest,
};
