//! List models for the cashpoint client.
//!
//! This crate holds the data layer behind the client's lists of banks, cash
//! points and towns:
//!
//! - **Model layer**: [`model`] defines indices, roles, the [`ItemModel`](model::ItemModel)
//!   trait and the in-memory row store
//! - **Filtering**: [`filter`] turns user search text into SQL `LIKE` patterns
//!   and decodes filter options
//! - **List model**: [`ListSqlModel`] dispatches filters through the event
//!   loop to a [`RowQuery`](api::RowQuery) and exposes the synthetic roles
//! - **Configuration**: [`config`] and [`settings`]
//!
//! Collaborators that reach outside the process (server, icons) are traits in
//! [`api`]; the application supplies the implementations.

pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod list_sql_model;
pub mod model;
pub mod settings;

pub use config::ListModelConfig;
pub use error::{ApiError, ConfigError, ModelError, Result};
pub use list_sql_model::{FilterRequest, ListCollaborators, ListSqlModel, SELECTED_ROLE};
pub use settings::{Settings, SharedSettings};
