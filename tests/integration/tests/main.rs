//! End-to-End Integration Tests
//!
//! These tests drive the flow engine and the management API together
//! against the in-memory store.

mod common;
mod admin_api;
mod auth_flows;
mod authenticator_config;
