//! Model index for addressing cells in flat list and table models.

/// A position within an [`ItemModel`](super::ItemModel).
///
/// List and table models in this crate are flat, so an index is just a row
/// and a column plus a validity flag. The invalid index doubles as the root
/// parent when asking a model for its top-level rows.
///
/// Indices are cheap to copy but should not be stored across row insertions
/// or removals: the row they name may have moved.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelIndex {
    row: usize,
    column: usize,
    valid: bool,
}

impl Default for ModelIndex {
    fn default() -> Self {
        Self::invalid()
    }
}

impl ModelIndex {
    /// Creates an invalid (null) model index.
    #[inline]
    pub const fn invalid() -> Self {
        Self {
            row: 0,
            column: 0,
            valid: false,
        }
    }

    /// Creates a valid index at `row`, `column`.
    ///
    /// Models create indices through [`ItemModel::index`](super::ItemModel::index),
    /// which also bounds-checks the position.
    #[inline]
    pub const fn new(row: usize, column: usize) -> Self {
        Self {
            row,
            column,
            valid: true,
        }
    }

    /// Returns `true` if this is a valid index.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns the row, or 0 for invalid indices.
    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    /// Returns the column, or 0 for invalid indices.
    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Creates a sibling index at the given row and column.
    ///
    /// Returns an invalid index if this index is invalid. The result is not
    /// validated against any model.
    #[inline]
    pub fn sibling(&self, row: usize, column: usize) -> ModelIndex {
        if !self.is_valid() {
            return ModelIndex::invalid();
        }
        ModelIndex::new(row, column)
    }

    /// Creates a sibling at the same column but a different row.
    #[inline]
    pub fn sibling_at_row(&self, row: usize) -> ModelIndex {
        self.sibling(row, self.column)
    }
}

impl std::fmt::Debug for ModelIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            f.debug_struct("ModelIndex")
                .field("row", &self.row)
                .field("column", &self.column)
                .finish()
        } else {
            write!(f, "ModelIndex(invalid)")
        }
    }
}

impl PartialOrd for ModelIndex {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModelIndex {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Invalid indices sort before valid ones, then row-major order.
        self.valid
            .cmp(&other.valid)
            .then(self.row.cmp(&other.row))
            .then(self.column.cmp(&other.column))
    }
}
