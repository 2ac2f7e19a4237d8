//! # ModKit - Module System
//!
//! Small toolkit for building a server out of explicitly registered modules.
//!
//! ## Features
//!
//! - **Explicit wiring**: the composition root registers every module with a [`RegistryBuilder`]
//! - **Capabilities**: a module opts into DB migrations, REST routes, REST hosting or a
//!   background lifecycle by implementing the matching trait
//! - **Phase-based lifecycle**: init → DB → REST → start → stop
//! - **Problem responses**: RFC 9457 error bodies shared by all REST modules
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use modkit::{RegistryBuilder, RunOptions, DbOptions, ShutdownOptions};
//!
//! let users = Arc::new(users_info::UsersInfo::default());
//! let mut b = RegistryBuilder::default();
//! b.register_core("users_info", users.clone());
//! b.register_db("users_info", users.clone());
//! b.register_rest("users_info", users);
//! let registry = b.build()?;
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

// Module system exports
pub use crate::contracts::*;
pub mod context;
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};

pub mod registry;
pub use registry::{ModuleRegistry, RegistryBuilder, RegistryError};

// Core module contracts and traits
pub mod contracts;

// REST helpers: problem details and OpenAPI aggregation
pub mod api;
pub use api::openapi::{OpenApiCollector, OpenApiRegistry};
pub use api::problem::{
    bad_request, conflict, internal_error, not_found, Problem, ProblemResponse, ValidationError,
};

// HTTP utilities
pub mod http;
pub use http::sse::SseBroadcaster;

pub mod runtime;
pub use runtime::{run, DbOptions, RunOptions, ShutdownOptions};
