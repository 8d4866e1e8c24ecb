//! In-memory row store.
//!
//! [`StandardItemModel`] keeps every cell as a role → data map, so a model
//! can hold any number of roles per cell without declaring them up front.
//! It is the storage component list models build on.

use std::collections::HashMap;

use cashpoint_core::logging::targets;
use parking_lot::{ReentrantMutex, RwLock};

use super::index::ModelIndex;
use super::role::{ItemData, ItemRole};
use super::traits::{ItemFlags, ItemModel, ModelSignals};

/// Data for one cell, keyed by role.
pub type ItemCell = HashMap<ItemRole, ItemData>;

/// Builds a cell from `(role, data)` pairs.
pub fn cell<I>(entries: I) -> ItemCell
where
    I: IntoIterator<Item = (ItemRole, ItemData)>,
{
    entries.into_iter().collect()
}

/// An editable, flat table of role maps.
///
/// Rows shorter than the column count are padded with empty cells and longer
/// rows are truncated, so every row always has exactly `column_count` cells.
///
/// Structural edits hold `edits` from the bounds check through the closing
/// signal, so two threads cannot both claim the same row. The lock is
/// reentrant: a slot may edit the model from inside a row signal.
pub struct StandardItemModel {
    rows: RwLock<Vec<Vec<ItemCell>>>,
    edits: ReentrantMutex<()>,
    column_count: usize,
    signals: ModelSignals,
}

impl Default for StandardItemModel {
    fn default() -> Self {
        Self::new(1)
    }
}

impl StandardItemModel {
    /// Creates an empty model with the given column count.
    pub fn new(column_count: usize) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            edits: ReentrantMutex::new(()),
            column_count,
            signals: ModelSignals::new(),
        }
    }

    fn normalize(&self, mut cells: Vec<ItemCell>) -> Vec<ItemCell> {
        cells.resize_with(self.column_count, ItemCell::new);
        cells
    }

    /// Returns the number of rows.
    pub fn row_count_value(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns `true` if the model has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Returns a copy of the row at `row`.
    pub fn row(&self, row: usize) -> Option<Vec<ItemCell>> {
        self.rows.read().get(row).cloned()
    }

    /// Appends a row to the end of the model.
    pub fn append_row(&self, cells: Vec<ItemCell>) {
        let cells = self.normalize(cells);
        let _edit = self.edits.lock();
        let row = self.rows.read().len();
        self.signals.emit_rows_inserted(row, row, || {
            self.rows.write().push(cells);
        });
    }

    /// Inserts a row before `row`.
    ///
    /// Returns `false` if `row` is past the end.
    pub fn insert_row(&self, row: usize, cells: Vec<ItemCell>) -> bool {
        let cells = self.normalize(cells);
        let _edit = self.edits.lock();
        if row > self.rows.read().len() {
            return false;
        }
        self.signals.emit_rows_inserted(row, row, || {
            let mut rows = self.rows.write();
            // A slot may have shrunk the store during the leading signal.
            let at = row.min(rows.len());
            rows.insert(at, cells);
        });
        true
    }

    /// Removes and returns the row at `row`.
    pub fn remove_row(&self, row: usize) -> Option<Vec<ItemCell>> {
        let _edit = self.edits.lock();
        if row >= self.rows.read().len() {
            return None;
        }
        let mut removed = None;
        self.signals.emit_rows_removed(row, row, || {
            let mut rows = self.rows.write();
            if row < rows.len() {
                removed = Some(rows.remove(row));
            }
        });
        removed
    }

    /// Replaces every row, emitting a model reset.
    pub fn set_rows(&self, rows: Vec<Vec<ItemCell>>) {
        let rows: Vec<_> = rows.into_iter().map(|r| self.normalize(r)).collect();
        tracing::debug!(target: targets::ROW_STORE, rows = rows.len(), "row store reset");
        let _edit = self.edits.lock();
        self.signals.emit_reset(|| {
            *self.rows.write() = rows;
        });
    }

    /// Removes all rows.
    pub fn clear(&self) {
        self.set_rows(Vec::new());
    }
}

impl ItemModel for StandardItemModel {
    fn row_count(&self, parent: &ModelIndex) -> usize {
        if parent.is_valid() {
            0
        } else {
            self.rows.read().len()
        }
    }

    fn column_count(&self, _parent: &ModelIndex) -> usize {
        self.column_count
    }

    fn data(&self, index: &ModelIndex, role: ItemRole) -> ItemData {
        if !index.is_valid() {
            return ItemData::None;
        }
        self.rows
            .read()
            .get(index.row())
            .and_then(|row| row.get(index.column()))
            .and_then(|cell| cell.get(&role))
            .cloned()
            .unwrap_or_default()
    }

    fn set_data(&self, index: &ModelIndex, value: ItemData, role: ItemRole) -> bool {
        if !index.is_valid() {
            return false;
        }
        {
            let mut rows = self.rows.write();
            let Some(cell) = rows
                .get_mut(index.row())
                .and_then(|row| row.get_mut(index.column()))
            else {
                return false;
            };
            cell.insert(role, value);
        }
        self.signals.emit_cell_changed(*index, vec![role]);
        true
    }

    fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex {
        if parent.is_valid() || row >= self.rows.read().len() || column >= self.column_count {
            return ModelIndex::invalid();
        }
        ModelIndex::new(row, column)
    }

    fn signals(&self) -> &ModelSignals {
        &self.signals
    }

    fn flags(&self, index: &ModelIndex) -> ItemFlags {
        if index.is_valid() {
            ItemFlags::editable()
        } else {
            ItemFlags::default()
        }
    }
}
