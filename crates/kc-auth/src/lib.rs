//! # kc-auth
//!
//! Authentication flow engine for Keycloak Rust.
//!
//! This crate resolves stored flow trees into authentication verdicts.
//!
//! ## Features
//!
//! - Pluggable authenticators registered by provider ID
//! - Recursive REQUIRED / ALTERNATIVE / OPTIONAL resolution with
//!   short-circuiting
//! - Resumable challenges through a serializable cursor
//! - Misconfigured flows reported as errors, never as failed logins
//!
//! ## NIST 800-53 Rev5 Controls
//!
//! - IA-2: Identification and Authentication
//! - AC-7: Unsuccessful Logon Attempts (failure verdicts are audited)
//!
//! ## Example
//!
//! ```ignore
//! use kc_auth::{AuthContext, AuthenticatorRegistry, FlowEngine};
//!
//! let registry = Arc::new(AuthenticatorRegistry::with_builtins());
//! let engine = FlowEngine::new(store, registry);
//!
//! let mut context = AuthContext::new(realm_id);
//! let result = engine.evaluate_flow(realm_id, browser_flow, &mut context).await?;
//! if let Some(cursor) = result.resume_cursor {
//!     let result = engine.resume(&cursor, form_data).await?;
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod authenticator;
pub mod builtin;
pub mod cursor;
pub mod error;
pub mod flow;
pub mod registry;

pub use authenticator::{AuthContext, Authenticator, Challenge, Outcome};
pub use cursor::{ExecutionStatus, FlowFrame, ResumeCursor};
pub use error::{AuthError, AuthResult};
pub use flow::{EngineResult, FlowEngine, Verdict};
pub use registry::{AuthenticatorRegistry, ProviderDescriptor, RegistryError};
