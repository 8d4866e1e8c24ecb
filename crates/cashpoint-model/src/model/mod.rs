//! Model layer shared by the cashpoint list models.
//!
//! # Core Types
//!
//! - `ModelIndex`: identifies a cell by row and column
//! - `ItemRole`: selects which piece of a cell's data to access
//! - `ItemData`: type-erased container for cell data
//! - `RoleNames`: names the UI binding layer uses for each role
//! - `ItemModel`: the trait models implement
//! - `ModelSignals`: change notifications
//! - `StandardItemModel`: editable in-memory row store
//!
//! # Example
//!
//! ```
//! use cashpoint_model::model::{cell, ItemData, ItemModel, ItemRole, ModelIndex, StandardItemModel};
//!
//! let store = StandardItemModel::new(1);
//! store.append_row(vec![cell([(ItemRole::Display, ItemData::from("Alfa-Bank"))])]);
//!
//! let first = store.index(0, 0, &ModelIndex::invalid());
//! assert_eq!(store.display_text(&first).as_deref(), Some("Alfa-Bank"));
//! ```

mod index;
mod role;
mod standard_model;
mod traits;

pub use index::ModelIndex;
pub use role::{ItemData, ItemRole, RoleNames};
pub use standard_model::{ItemCell, StandardItemModel, cell};
pub use traits::{ItemFlags, ItemModel, ModelSignals};
