//! # shopdesk-core
//!
//! Core library for the shop administration backend: HTTP client, session
//! persistence, resource lists with filtering and pagination, mutation
//! actions, form validation and the shared application context.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shopdesk_core::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> shopdesk_core::Result<()> {
//!     let config = Config::load(None)?;
//!     let session = Session::in_memory();
//!     let client = ApiClient::new(config.resolve_api_url(None), session)?;
//!
//!     let ctx = Arc::new(AppContext::new());
//!     let list: ResourceList<Products> =
//!         ResourceList::new(client, ProductFilters::default(), ctx);
//!     let state = list.settled().await;
//!     println!("{} products", state.total_items);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture (4-Layer)
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │           API Layer                 │  HTTP client, envelope, wire models
//! ├─────────────────────────────────────┤
//! │          Core Layer                 │  Lists, actions, auth, forms, context
//! ├─────────────────────────────────────┤
//! │        Storage Layer                │  Configuration, session persistence
//! ├─────────────────────────────────────┤
//! │         Utils Layer                 │  Validation, text, error conversion
//! └─────────────────────────────────────┘
//! ```

pub use error::AppError;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use shopdesk_core::prelude::*;
/// ```
pub mod prelude {
    // Error handling
    pub use crate::Result;
    pub use crate::error::{ApiError, AppError};

    // API client and models
    pub use crate::api::client::{ApiClient, Navigator};
    pub use crate::api::models::{AppConfigs, OrderStatus, PaymentStatus, ProductStatus, User};

    // Core
    pub use crate::core::actions::{AppConfigActions, ResourceActions};
    pub use crate::core::app_context::AppContext;
    pub use crate::core::auth::AuthContext;
    pub use crate::core::debounce::Debounced;
    pub use crate::core::feedback::Feedback;
    pub use crate::core::list::{ListState, ResourceList};
    pub use crate::core::resource::{
        Categories, CategoryFilters, OrderFilters, Orders, ProductFilters, Products, Resource,
    };

    // Storage
    pub use crate::storage::config::Config;
    pub use crate::storage::session::Session;

    // Display utilities
    pub use crate::display::TableDisplay;
}

/// Business logic layer.
///
/// - [`core::list`]: generation-guarded resource lists
/// - [`core::actions`]: create/update/delete with feedback
/// - [`core::auth`]: login lockout and password flows
/// - [`core::app_context`]: layout, theme, notifications
pub mod core;

/// Storage layer - configuration and session persistence.
pub mod storage;

/// Utilities layer - shared helpers and common functionality.
pub mod utils;

/// API layer - HTTP client, response envelope and data models.
pub mod api;

/// Display layer - table rendering for terminal output.
pub mod display;

/// Error handling - hierarchical error system.
///
/// Domain-specific error variants with severity levels and troubleshooting
/// hints for common issues.
pub mod error;

/// Convenient Result type alias using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
