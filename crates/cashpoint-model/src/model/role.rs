//! Data roles for item models.
//!
//! Roles define what kind of data is being requested from or written to a
//! model cell. A single cell carries data for several roles at once, and the
//! UI binding layer addresses each role through the name registered for it
//! in [`RoleNames`].

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Standard and application-defined roles.
///
/// Standard roles occupy the values 0-255. Application roles are
/// `ItemRole::User(n)` with numeric value `256 + n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRole {
    /// Primary text to display.
    Display,
    /// Icon or decoration reference.
    Decoration,
    /// Value for editing (may be richer than display text).
    Edit,
    /// Tooltip text shown on hover.
    ToolTip,
    /// Application-specific role.
    User(u32),
}

impl ItemRole {
    /// Numeric value of the first user role.
    pub const USER_BASE: u32 = 256;

    /// Returns the numeric value of this role.
    ///
    /// Widened to `u64` so every `User(n)` has a distinct value.
    pub fn value(&self) -> u64 {
        match self {
            ItemRole::Display => 0,
            ItemRole::Decoration => 1,
            ItemRole::Edit => 2,
            ItemRole::ToolTip => 3,
            ItemRole::User(n) => u64::from(Self::USER_BASE) + u64::from(*n),
        }
    }

    /// Creates an ItemRole from a numeric value.
    ///
    /// Returns `None` for reserved standard values (4-255) and for values
    /// past the last user role.
    pub fn from_value(value: u64) -> Option<Self> {
        match value {
            0 => Some(ItemRole::Display),
            1 => Some(ItemRole::Decoration),
            2 => Some(ItemRole::Edit),
            3 => Some(ItemRole::ToolTip),
            4..=255 => None,
            n => u32::try_from(n - u64::from(Self::USER_BASE))
                .ok()
                .map(ItemRole::User),
        }
    }
}

impl PartialOrd for ItemRole {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ItemRole {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value().cmp(&other.value())
    }
}

/// Type-erased container for cell data.
#[derive(Debug, Clone, Default)]
pub enum ItemData {
    /// No data.
    #[default]
    None,
    /// String data.
    String(String),
    /// Integer data.
    Int(i64),
    /// Floating point data.
    Float(f64),
    /// Boolean data.
    Bool(bool),
    /// Structured JSON data (arrays and objects from server payloads).
    Json(serde_json::Value),
    /// Custom data, shared rather than deep-copied on clone.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl PartialEq for ItemData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ItemData::None, ItemData::None) => true,
            (ItemData::String(a), ItemData::String(b)) => a == b,
            (ItemData::Int(a), ItemData::Int(b)) => a == b,
            (ItemData::Float(a), ItemData::Float(b)) => a == b,
            (ItemData::Bool(a), ItemData::Bool(b)) => a == b,
            (ItemData::Json(a), ItemData::Json(b)) => a == b,
            (ItemData::Custom(a), ItemData::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl ItemData {
    /// Creates new custom data from any type.
    pub fn new<T: Any + Send + Sync + 'static>(value: T) -> Self {
        ItemData::Custom(Arc::new(value))
    }

    /// Converts a JSON value into cell data.
    ///
    /// Scalars map onto the matching variant; numbers that do not fit an
    /// `i64` become floats. Arrays and objects are kept as JSON.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ItemData::None,
            serde_json::Value::Bool(b) => ItemData::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ItemData::Int(i)
                } else if let Some(f) = n.as_f64() {
                    ItemData::Float(f)
                } else {
                    ItemData::None
                }
            }
            serde_json::Value::String(s) => ItemData::String(s),
            other => ItemData::Json(other),
        }
    }

    /// Returns `true` if this is `ItemData::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, ItemData::None)
    }

    /// Returns `true` if this contains some data.
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Attempts to get the data as a string slice.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            ItemData::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Attempts to get the data as an owned string.
    pub fn into_string(self) -> Option<String> {
        match self {
            ItemData::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get the data as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ItemData::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to get the data as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ItemData::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to get the data as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ItemData::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get the data as JSON.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ItemData::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Attempts to downcast custom data to the specified type.
    pub fn downcast<T: Any>(&self) -> Option<&T> {
        match self {
            ItemData::Custom(data) => data.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<String> for ItemData {
    fn from(s: String) -> Self {
        ItemData::String(s)
    }
}

impl From<&str> for ItemData {
    fn from(s: &str) -> Self {
        ItemData::String(s.to_string())
    }
}

impl From<i64> for ItemData {
    fn from(n: i64) -> Self {
        ItemData::Int(n)
    }
}

impl From<i32> for ItemData {
    fn from(n: i32) -> Self {
        ItemData::Int(n as i64)
    }
}

impl From<usize> for ItemData {
    fn from(n: usize) -> Self {
        ItemData::Int(n as i64)
    }
}

impl From<f64> for ItemData {
    fn from(n: f64) -> Self {
        ItemData::Float(n)
    }
}

impl From<bool> for ItemData {
    fn from(b: bool) -> Self {
        ItemData::Bool(b)
    }
}

impl From<serde_json::Value> for ItemData {
    fn from(value: serde_json::Value) -> Self {
        ItemData::from_json(value)
    }
}

/// Registry of the names the UI binding layer uses for each role.
///
/// Names are registered once, up front, by the model that owns the registry.
/// Lookups never mutate it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleNames {
    names: BTreeMap<ItemRole, String>,
}

impl RoleNames {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-filled with names for the standard roles.
    pub fn with_standard_roles() -> Self {
        let mut names = Self::new();
        names.insert(ItemRole::Display, "display");
        names.insert(ItemRole::Decoration, "decoration");
        names.insert(ItemRole::Edit, "edit");
        names.insert(ItemRole::ToolTip, "toolTip");
        names
    }

    /// Registers `name` for `role` if the role has no name yet.
    ///
    /// Returns `false` and keeps the existing name otherwise.
    pub fn insert(&mut self, role: ItemRole, name: impl Into<String>) -> bool {
        match self.names.entry(role) {
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(name.into());
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Returns the name registered for `role`.
    pub fn name(&self, role: ItemRole) -> Option<&str> {
        self.names.get(&role).map(String::as_str)
    }

    /// Returns the role registered under `name`.
    pub fn role(&self, name: &str) -> Option<ItemRole> {
        self.names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(role, _)| *role)
    }

    /// Returns `true` if `role` has a name.
    pub fn contains(&self, role: ItemRole) -> bool {
        self.names.contains_key(&role)
    }

    /// Iterates over `(role, name)` pairs in role order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemRole, &str)> {
        self.names.iter().map(|(role, name)| (*role, name.as_str()))
    }

    /// Number of registered roles.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no roles are registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
