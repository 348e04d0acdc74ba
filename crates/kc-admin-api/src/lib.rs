//! # kc-admin-api
//!
//! Authentication flow management for the admin REST API.
//!
//! The [`AuthenticationManagement`] service validates and applies changes
//! to flows, executions, authenticator configs and realm flow bindings.
//! [`authentication_router`] maps it onto HTTP.
//!
//! ## Modules
//!
//! - [`dto`] - Data Transfer Objects for API requests/responses
//! - [`error`] - Error types and HTTP error responses
//! - [`events`] - Admin event logging
//! - [`management`] - Transport-free management service
//! - [`router`] - Axum router and HTTP handlers
//! - [`state`] - Application state management
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use kc_admin_api::{authentication_router, ManagementState, TracingEventLogger};
//! use kc_auth::AuthenticatorRegistry;
//! use kc_core::Config;
//! use kc_storage_memory::InMemoryAuthenticationStore;
//!
//! let config = Config::from_env()?;
//! let state = ManagementState::from_parts(
//!     Arc::new(InMemoryAuthenticationStore::new()),
//!     Arc::new(AuthenticatorRegistry::with_builtins()),
//!     Arc::new(TracingEventLogger::new()),
//!     config.admin,
//! );
//!
//! let app = authentication_router().with_state(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! ## API Endpoints
//!
//! All paths are relative to `/admin/realms/{realm_id}/authentication`.
//!
//! ### Flows
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/flows` | List top-level flows |
//! | POST | `/flows` | Create a flow |
//! | GET | `/flows/{id}` | Get flow by ID |
//! | PUT | `/flows/{id}` | Update a flow |
//! | DELETE | `/flows/{id}` | Delete a flow |
//! | POST | `/flows/{id}/copy` | Copy a flow |
//! | GET | `/flows/{id}/executions` | List a flow's executions |
//! | POST | `/flows/{id}/executions/execution` | Add an authenticator execution |
//! | POST | `/flows/{id}/executions/flow` | Add a sub-flow |
//!
//! ### Executions
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/executions/{id}` | Get execution by ID |
//! | PUT | `/executions/{id}` | Change the requirement |
//! | DELETE | `/executions/{id}` | Remove an execution |
//! | POST | `/executions/{id}/raise-priority` | Move one place earlier |
//! | POST | `/executions/{id}/lower-priority` | Move one place later |
//! | POST | `/executions/{id}/config` | Create and bind a config |
//!
//! ### Configs, providers and bindings
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/config/{id}` | Get config by ID |
//! | PUT | `/config/{id}` | Replace alias and settings |
//! | DELETE | `/config/{id}` | Delete a config |
//! | GET | `/authenticator-providers` | List authenticators |
//! | GET | `/flow-providers` | List flow types |
//! | GET | `/bindings` | Get realm flow bindings |
//! | PUT | `/bindings` | Bind or unbind a flow |

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod dto;
pub mod error;
pub mod events;
pub mod management;
pub mod router;
pub mod state;

pub use error::{AdminError, AdminResult, ErrorResponse};
pub use events::{AdminEventLogger, EventLogError, InMemoryEventLogger, TracingEventLogger};
pub use management::AuthenticationManagement;
pub use router::authentication_router;
pub use state::ManagementState;
