//! Collaborators a [`ListSqlModel`] consumes.
//!
//! The model does not talk to the network, decode icons, or build SQL
//! itself. Those jobs belong to the implementations of these traits, which
//! the application wires in when it creates the model.

use cashpoint_core::logging::targets;
use serde_json::Value;

use crate::error::ApiError;
use crate::filter::FilterOptions;
use crate::list_sql_model::ListSqlModel;

/// Request/response access to the cash point server.
pub trait ServerApi: Send + Sync {
    /// Sends `payload` to `endpoint` and returns the decoded response.
    fn request(&self, endpoint: &str, payload: Value) -> Result<Value, ApiError>;
}

/// Source of the bank and cash point icons shown next to rows.
pub trait IconProvider: Send + Sync {
    /// Identifier the UI uses to address this provider.
    fn provider_id(&self) -> &str;

    /// Returns `true` if an icon is available for `key`.
    fn has_icon(&self, key: &str) -> bool;

    /// URL the UI binding layer loads the icon for `key` from.
    fn icon_url(&self, key: &str) -> String {
        format!("image://{}/{}", self.provider_id(), key)
    }
}

/// The query a concrete list model runs against its row store.
///
/// Each list (banks, cash points, towns) supplies one of these. Its role
/// names are registered after the selection role, so the first query role
/// is `User(1)`.
pub trait RowQuery: Send + Sync {
    /// Binding names for the query's roles, in role order.
    fn role_names(&self) -> Vec<String>;

    /// Re-runs the query with a new filter.
    ///
    /// `filter` is already in its final form: a LIKE pattern when escaping
    /// is enabled, the raw text otherwise.
    fn apply_filter(&self, model: &ListSqlModel, filter: &str, options: &FilterOptions);

    /// Pulls fresh rows from the server, trying up to `attempts` times.
    fn update_from_server(&self, model: &ListSqlModel, attempts: u32) {
        tracing::debug!(
            target: targets::LIST_MODEL,
            connection = model.db_connection_name(),
            attempts,
            "row query has no server update"
        );
    }
}

/// Sends a request, repeating it on transient failures.
///
/// At most `attempts` requests are made; `0` is treated as `1`. The last
/// error is returned once attempts run out, and non-transient errors are
/// returned immediately.
pub fn request_with_attempts(
    api: &dyn ServerApi,
    endpoint: &str,
    payload: &Value,
    attempts: u32,
) -> Result<Value, ApiError> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match api.request(endpoint, payload.clone()) {
            Ok(response) => return Ok(response),
            Err(err) if err.is_transient() && attempt < attempts => {
                tracing::warn!(
                    target: targets::LIST_MODEL,
                    endpoint,
                    attempt,
                    attempts,
                    "server request failed, retrying: {err}"
                );
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
