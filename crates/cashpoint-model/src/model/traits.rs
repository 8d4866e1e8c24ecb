//! The [`ItemModel`] trait and the change notifications list models emit.
//!
//! Bank, cash point and town lists are all flat: a single root with rows
//! hanging directly off it. Bindings read cells by role and follow row
//! changes through [`ModelSignals`].

use cashpoint_core::Signal;

use super::index::ModelIndex;
use super::role::{ItemData, ItemRole, RoleNames};

/// What a binding may do with a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemFlags {
    pub selectable: bool,
    pub editable: bool,
    pub enabled: bool,
}

impl ItemFlags {
    /// A cell that can be selected but not written.
    pub fn read_only() -> Self {
        Self {
            selectable: true,
            editable: false,
            enabled: true,
        }
    }

    /// A cell that also accepts `set_data`.
    pub fn editable() -> Self {
        Self {
            editable: true,
            ..Self::read_only()
        }
    }
}

/// Read access to a flat list of role-addressed cells.
///
/// Only the root (an invalid [`ModelIndex`]) has children. Writes are
/// refused unless the model overrides [`set_data`](ItemModel::set_data).
pub trait ItemModel: Send + Sync {
    /// Rows under `parent`; zero for any valid parent.
    fn row_count(&self, parent: &ModelIndex) -> usize;

    fn column_count(&self, parent: &ModelIndex) -> usize;

    /// Cell value for `role`, or `ItemData::None` when the index is invalid
    /// or nothing is stored.
    fn data(&self, index: &ModelIndex, role: ItemRole) -> ItemData;

    /// Index at `row`, `column`; invalid when out of range.
    fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex;

    fn signals(&self) -> &ModelSignals;

    fn parent(&self, _index: &ModelIndex) -> ModelIndex {
        ModelIndex::invalid()
    }

    /// Stores `value` under `role`. Returns whether anything was written.
    fn set_data(&self, _index: &ModelIndex, _value: ItemData, _role: ItemRole) -> bool {
        false
    }

    fn flags(&self, _index: &ModelIndex) -> ItemFlags {
        ItemFlags::read_only()
    }

    /// Names the binding layer uses to address roles.
    fn role_names(&self) -> RoleNames {
        RoleNames::with_standard_roles()
    }

    fn display_text(&self, index: &ModelIndex) -> Option<String> {
        self.data(index, ItemRole::Display).into_string()
    }
}

/// Notifications a list model sends while its rows change.
///
/// Row ranges are inclusive `(first, last)` pairs. Every mutation is
/// bracketed by an "about to" signal and a completion signal.
pub struct ModelSignals {
    pub rows_about_to_be_inserted: Signal<(usize, usize)>,
    pub rows_inserted: Signal<(usize, usize)>,
    pub rows_about_to_be_removed: Signal<(usize, usize)>,
    pub rows_removed: Signal<(usize, usize)>,
    /// `(top_left, bottom_right, roles)` of the cells that changed.
    pub data_changed: Signal<(ModelIndex, ModelIndex, Vec<ItemRole>)>,
    pub model_about_to_reset: Signal<()>,
    pub model_reset: Signal<()>,
}

impl Default for ModelSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelSignals {
    pub fn new() -> Self {
        Self {
            rows_about_to_be_inserted: Signal::new(),
            rows_inserted: Signal::new(),
            rows_about_to_be_removed: Signal::new(),
            rows_removed: Signal::new(),
            data_changed: Signal::new(),
            model_about_to_reset: Signal::new(),
            model_reset: Signal::new(),
        }
    }

    /// Runs `insert` between the two insertion signals for `first..=last`.
    pub fn emit_rows_inserted(&self, first: usize, last: usize, insert: impl FnOnce()) {
        self.rows_about_to_be_inserted.emit((first, last));
        insert();
        self.rows_inserted.emit((first, last));
    }

    /// Runs `remove` between the two removal signals for `first..=last`.
    pub fn emit_rows_removed(&self, first: usize, last: usize, remove: impl FnOnce()) {
        self.rows_about_to_be_removed.emit((first, last));
        remove();
        self.rows_removed.emit((first, last));
    }

    pub fn emit_cell_changed(&self, index: ModelIndex, roles: Vec<ItemRole>) {
        self.data_changed.emit((index, index, roles));
    }

    /// Runs `reset` between the two reset signals.
    pub fn emit_reset(&self, reset: impl FnOnce()) {
        self.model_about_to_reset.emit(());
        reset();
        self.model_reset.emit(());
    }
}
