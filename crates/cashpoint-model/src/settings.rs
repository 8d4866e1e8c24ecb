//! Shared application settings.
//!
//! [`Settings`] is an in-memory, hierarchical key-value store shared by the
//! list models of one application. Keys are paths whose segments are
//! separated by `.` or `/`, so `"list_model.attempts_count"` and
//! `"list_model/attempts_count"` name the same entry.
//!
//! Every write emits [`Settings::changed`] with the path that was written.
//!
//! ```
//! use cashpoint_model::settings::Settings;
//!
//! let settings = Settings::new();
//! settings.set("list_model.attempts_count", 5);
//! settings.set("map/city", "Moscow");
//!
//! assert_eq!(settings.get::<i64>("list_model/attempts_count"), Some(5));
//! assert_eq!(settings.get_or("map.zoom", 12), 12);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use cashpoint_core::Signal;
use cashpoint_core::logging::targets;
use parking_lot::RwLock;

use crate::error::ConfigError;

/// A value held by [`Settings`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SettingsValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<SettingsValue>),
    Object(HashMap<String, SettingsValue>),
}

impl SettingsValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[SettingsValue]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    fn from_toml(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Self::String(s),
            toml::Value::Integer(i) => Self::Integer(i),
            toml::Value::Float(f) => Self::Float(f),
            toml::Value::Boolean(b) => Self::Bool(b),
            toml::Value::Datetime(dt) => Self::String(dt.to_string()),
            toml::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from_toml).collect())
            }
            toml::Value::Table(table) => Self::Object(
                table
                    .into_iter()
                    .map(|(key, value)| (key, Self::from_toml(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for SettingsValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for SettingsValue {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<i64> for SettingsValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<u32> for SettingsValue {
    fn from(v: u32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<f64> for SettingsValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for SettingsValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for SettingsValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl<T: Into<SettingsValue>> From<Vec<T>> for SettingsValue {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

/// Conversion out of a stored [`SettingsValue`].
pub trait FromSettingsValue: Sized {
    /// Returns `None` when the stored value has a different type.
    fn from_settings_value(value: &SettingsValue) -> Option<Self>;
}

impl FromSettingsValue for bool {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromSettingsValue for i64 {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_integer()
    }
}

impl FromSettingsValue for i32 {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_integer().and_then(|v| i32::try_from(v).ok())
    }
}

impl FromSettingsValue for u32 {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_integer().and_then(|v| u32::try_from(v).ok())
    }
}

impl FromSettingsValue for usize {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_integer().and_then(|v| usize::try_from(v).ok())
    }
}

impl FromSettingsValue for f64 {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_float()
    }
}

impl FromSettingsValue for String {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl<T: FromSettingsValue> FromSettingsValue for Vec<T> {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value
            .as_array()
            .and_then(|items| items.iter().map(T::from_settings_value).collect())
    }
}

impl FromSettingsValue for SettingsValue {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        Some(value.clone())
    }
}

/// Hierarchical in-memory settings store.
pub struct Settings {
    data: RwLock<HashMap<String, SettingsValue>>,
    changed: Signal<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("keys", &self.keys())
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::from_data(HashMap::new())
    }

    /// Creates a store seeded with `data`.
    pub fn from_data(data: HashMap<String, SettingsValue>) -> Self {
        Self {
            data: RwLock::new(data),
            changed: Signal::new(),
        }
    }

    /// Creates a store seeded from a TOML document.
    ///
    /// Tables become nested groups.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(source)?;
        let data = table
            .into_iter()
            .map(|(key, value)| (key, SettingsValue::from_toml(value)))
            .collect();
        Ok(Self::from_data(data))
    }

    /// Emitted with the written path after every `set`, successful
    /// `remove`, and `clear` (with an empty path).
    pub fn changed(&self) -> &Signal<String> {
        &self.changed
    }

    /// Stores `value` at `path`, creating intermediate groups.
    ///
    /// A scalar standing where a group is needed is replaced by the group.
    /// Empty paths are ignored.
    pub fn set<V: Into<SettingsValue>>(&self, path: &str, value: V) {
        let parts = split_path(path);
        if parts.is_empty() {
            return;
        }
        set_nested(&mut self.data.write(), &parts, value.into());
        tracing::trace!(target: targets::SETTINGS, path, "setting written");
        self.changed.emit(path.to_owned());
    }

    /// Reads the value at `path` as `T`.
    pub fn get<T: FromSettingsValue>(&self, path: &str) -> Option<T> {
        let data = self.data.read();
        get_nested(&data, &split_path(path)).and_then(T::from_settings_value)
    }

    /// Reads the value at `path`, falling back to `default` when it is
    /// missing or has another type.
    pub fn get_or<T: FromSettingsValue>(&self, path: &str, default: T) -> T {
        self.get(path).unwrap_or(default)
    }

    pub fn contains(&self, path: &str) -> bool {
        get_nested(&self.data.read(), &split_path(path)).is_some()
    }

    /// Removes and returns the value at `path`.
    pub fn remove(&self, path: &str) -> Option<SettingsValue> {
        let parts = split_path(path);
        if parts.is_empty() {
            return None;
        }
        let removed = remove_nested(&mut self.data.write(), &parts);
        if removed.is_some() {
            self.changed.emit(path.to_owned());
        }
        removed
    }

    pub fn clear(&self) {
        self.data.write().clear();
        self.changed.emit(String::new());
    }

    /// Top-level keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    /// Keys directly under the group at `path`; empty if `path` is not a group.
    pub fn group_keys(&self, path: &str) -> Vec<String> {
        let data = self.data.read();
        match get_nested(&data, &split_path(path)) {
            Some(SettingsValue::Object(group)) => group.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

/// Settings shared between models.
pub type SharedSettings = Arc<Settings>;

fn split_path(path: &str) -> Vec<&str> {
    path.split(['.', '/']).filter(|s| !s.is_empty()).collect()
}

fn get_nested<'a>(
    data: &'a HashMap<String, SettingsValue>,
    parts: &[&str],
) -> Option<&'a SettingsValue> {
    let (first, rest) = parts.split_first()?;
    let value = data.get(*first)?;
    if rest.is_empty() {
        return Some(value);
    }
    match value {
        SettingsValue::Object(group) => get_nested(group, rest),
        _ => None,
    }
}

fn set_nested(data: &mut HashMap<String, SettingsValue>, parts: &[&str], value: SettingsValue) {
    let Some((first, rest)) = parts.split_first() else {
        return;
    };
    if rest.is_empty() {
        data.insert((*first).to_owned(), value);
        return;
    }
    let entry = data
        .entry((*first).to_owned())
        .or_insert_with(|| SettingsValue::Object(HashMap::new()));
    if !matches!(entry, SettingsValue::Object(_)) {
        *entry = SettingsValue::Object(HashMap::new());
    }
    if let SettingsValue::Object(group) = entry {
        set_nested(group, rest, value);
    }
}

fn remove_nested(
    data: &mut HashMap<String, SettingsValue>,
    parts: &[&str],
) -> Option<SettingsValue> {
    let (first, rest) = parts.split_first()?;
    if rest.is_empty() {
        return data.remove(*first);
    }
    match data.get_mut(*first)? {
        SettingsValue::Object(group) => remove_nested(group, rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_get_set() {
        let settings = Settings::new();
        settings.set("city", "Moscow");
        settings.set("attempts", 3);
        settings.set("radius_km", 2.5);
        settings.set("rub_only", true);

        assert_eq!(settings.get::<String>("city").as_deref(), Some("Moscow"));
        assert_eq!(settings.get::<i64>("attempts"), Some(3));
        assert_eq!(settings.get::<f64>("radius_km"), Some(2.5));
        assert_eq!(settings.get::<bool>("rub_only"), Some(true));
        assert_eq!(settings.get::<bool>("city"), None);
    }

    #[test]
    fn test_path_separators_are_equivalent() {
        let settings = Settings::new();
        settings.set("list_model.attempts_count", 7);
        settings.set("list_model/request_batch_size", 64);

        assert_eq!(settings.get::<u32>("list_model/attempts_count"), Some(7));
        assert_eq!(settings.get::<usize>("list_model.request_batch_size"), Some(64));

        let mut keys = settings.group_keys("list_model");
        keys.sort();
        assert_eq!(keys, vec!["attempts_count", "request_batch_size"]);
    }

    #[test]
    fn test_scalar_replaced_by_group() {
        let settings = Settings::new();
        settings.set("map", 1);
        settings.set("map.zoom", 12);

        assert_eq!(settings.get::<i64>("map.zoom"), Some(12));
        assert!(settings.get::<i64>("map").is_none());
    }

    #[test]
    fn test_negative_integers_do_not_convert_to_unsigned() {
        let settings = Settings::new();
        settings.set("count", -1);
        assert_eq!(settings.get::<u32>("count"), None);
        assert_eq!(settings.get_or::<usize>("count", 256), 256);
    }

    #[test]
    fn test_remove_and_clear() {
        let settings = Settings::new();
        settings.set("a.b", "x");
        settings.set("c", 1);

        assert_eq!(settings.remove("a.b"), Some(SettingsValue::from("x")));
        assert_eq!(settings.remove("a.b"), None);
        assert!(settings.contains("a"));

        settings.clear();
        assert!(settings.is_empty());
    }

    #[test]
    fn test_changed_signal() {
        let settings = Settings::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        settings.changed().connect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        settings.set("a", 1);
        settings.set("", 2);
        settings.remove("missing");
        settings.remove("a");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_from_toml_str() {
        let settings = Settings::from_toml_str(
            r#"
            city = "Kazan"

            [list_model]
            attempts_count = 4
            banks = ["alfa", "vtb"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.get::<String>("city").as_deref(), Some("Kazan"));
        assert_eq!(settings.get::<u32>("list_model.attempts_count"), Some(4));
        assert_eq!(
            settings.get::<Vec<String>>("list_model.banks"),
            Some(vec!["alfa".to_string(), "vtb".to_string()])
        );

        assert!(matches!(
            Settings::from_toml_str("not = = toml"),
            Err(ConfigError::Toml(_))
        ));
    }
}
