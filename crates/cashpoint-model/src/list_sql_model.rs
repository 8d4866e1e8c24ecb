//! List model backed by a local row store and a server.
//!
//! [`ListSqlModel`] is the model behind every list in the cash point client
//! (banks, cash points, towns). It owns a [`StandardItemModel`] holding the
//! rows, shares its collaborators with sibling models, and adds two things
//! on top of the row store:
//!
//! - **Deferred filtering.** [`ListSqlModel::set_filter`] only emits
//!   `filter_request`. That signal is connected to the model itself with a
//!   queued connection, so the [`RowQuery`] sees the filter on a later turn
//!   of the event loop, never inside the caller's stack. Each request
//!   carries a generation number so the model can tell when a filter it is
//!   applying has already been superseded.
//! - **Synthetic roles.** `User(0)` is the selection flag and the role after
//!   the query's own roles reports the row number.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use cashpoint_core::EventLoop;
//! use cashpoint_model::api::{IconProvider, RowQuery, ServerApi};
//! use cashpoint_model::config::ListModelConfig;
//! use cashpoint_model::error::ApiError;
//! use cashpoint_model::filter::FilterOptions;
//! use cashpoint_model::settings::Settings;
//! use cashpoint_model::{ListCollaborators, ListSqlModel};
//! use parking_lot::Mutex;
//! use serde_json::Value;
//!
//! struct Offline;
//! impl ServerApi for Offline {
//!     fn request(&self, endpoint: &str, _payload: Value) -> Result<Value, ApiError> {
//!         Err(ApiError::Request { endpoint: endpoint.into(), message: "offline".into() })
//!     }
//! }
//!
//! struct NoIcons;
//! impl IconProvider for NoIcons {
//!     fn provider_id(&self) -> &str { "ico" }
//!     fn has_icon(&self, _key: &str) -> bool { false }
//! }
//!
//! #[derive(Default)]
//! struct Banks { last_filter: Mutex<Option<String>> }
//! impl RowQuery for Banks {
//!     fn role_names(&self) -> Vec<String> { vec!["name".into()] }
//!     fn apply_filter(&self, _model: &ListSqlModel, filter: &str, _options: &FilterOptions) {
//!         *self.last_filter.lock() = Some(filter.to_owned());
//!     }
//! }
//!
//! let event_loop = EventLoop::new();
//! let banks = Arc::new(Banks::default());
//! let model = ListSqlModel::new(
//!     "banks",
//!     ListCollaborators {
//!         server_api: Arc::new(Offline),
//!         icon_provider: Arc::new(NoIcons),
//!         settings: Arc::new(Settings::new()),
//!         event_loop: event_loop.clone(),
//!     },
//!     banks.clone(),
//!     ListModelConfig::default(),
//! );
//!
//! model.set_filter("alfa*", "{}");
//! assert!(banks.last_filter.lock().is_none());
//!
//! event_loop.process_pending();
//! assert_eq!(banks.last_filter.lock().as_deref(), Some("%alfa%"));
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use cashpoint_core::logging::targets;
use cashpoint_core::{ConnectionId, CoreError, EventLoop, PerfSpan, Signal};

use crate::api::{IconProvider, RowQuery, ServerApi};
use crate::config::{DEFAULT_ATTEMPTS_COUNT, DEFAULT_REQUEST_BATCH_SIZE, ListModelConfig};
use crate::filter::{escape_filter, options_or_empty};
use crate::model::{
    ItemData, ItemFlags, ItemModel, ItemRole, ModelIndex, ModelSignals, RoleNames,
    StandardItemModel,
};
use crate::settings::SharedSettings;

/// Handles shared by every list model of an application.
#[derive(Clone)]
pub struct ListCollaborators {
    pub server_api: Arc<dyn ServerApi>,
    pub icon_provider: Arc<dyn IconProvider>,
    pub settings: SharedSettings,
    /// Loop that filter requests are deferred onto.
    pub event_loop: EventLoop,
}

impl std::fmt::Debug for ListCollaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListCollaborators")
            .field("icon_provider", &self.icon_provider.provider_id())
            .field("event_loop", &self.event_loop)
            .finish_non_exhaustive()
    }
}

/// A filter request as carried by `filter_request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    /// Position of the request among the model's requests, starting at 1.
    pub generation: u64,
    /// The filter in its final form.
    pub filter: String,
    /// Raw JSON options.
    pub options: String,
}

/// Role holding the per-row selection flag.
pub const SELECTED_ROLE: ItemRole = ItemRole::User(0);

/// List model composing a row store, a row query and shared collaborators.
pub struct ListSqlModel {
    connection_name: String,
    collaborators: ListCollaborators,
    query: Arc<dyn RowQuery>,
    store: StandardItemModel,
    role_names: RoleNames,
    last_role: ItemRole,

    attempts_count: AtomicU32,
    request_batch_size: AtomicUsize,
    escape_enabled: AtomicBool,

    expected_upload_count: AtomicUsize,
    uploaded_count: AtomicUsize,

    filter_request: Signal<FilterRequest>,
    dispatch_connection: ConnectionId,
    next_generation: AtomicU64,
    /// Newest generation that was actually queued for dispatch.
    latest_queued: AtomicU64,
}

impl std::fmt::Debug for ListSqlModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListSqlModel")
            .field("connection_name", &self.connection_name)
            .field("rows", &self.store.row_count_value())
            .field("last_role", &self.last_role)
            .finish_non_exhaustive()
    }
}

impl ListSqlModel {
    /// Creates a model and connects its deferred filter dispatch.
    ///
    /// Role names are registered here: `"selected"` for [`SELECTED_ROLE`],
    /// the query's names from `User(1)` on, and `"index"` for
    /// [`last_role`](Self::last_role).
    pub fn new(
        connection_name: impl Into<String>,
        collaborators: ListCollaborators,
        query: Arc<dyn RowQuery>,
        config: ListModelConfig,
    ) -> Arc<Self> {
        let connection_name = connection_name.into();
        let (role_names, last_role) = build_role_names(query.as_ref());
        let column_count = 1;

        let model = Arc::new_cyclic(|weak: &Weak<Self>| {
            let filter_request = Signal::new();
            let weak = weak.clone();
            let dispatch_connection = filter_request.connect_queued(
                &collaborators.event_loop,
                move |request: &FilterRequest| match weak.upgrade() {
                    Some(model) => model.on_filter_dispatched(request),
                    None => tracing::trace!(
                        target: targets::LIST_MODEL,
                        "filter request outlived its model"
                    ),
                },
            );

            Self {
                connection_name,
                collaborators,
                query,
                store: StandardItemModel::new(column_count),
                role_names,
                last_role,
                attempts_count: AtomicU32::new(config.attempts_count),
                request_batch_size: AtomicUsize::new(config.request_batch_size),
                escape_enabled: AtomicBool::new(config.escape_filter),
                expected_upload_count: AtomicUsize::new(0),
                uploaded_count: AtomicUsize::new(0),
                filter_request,
                dispatch_connection,
                next_generation: AtomicU64::new(0),
                latest_queued: AtomicU64::new(0),
            }
        });

        tracing::debug!(
            target: targets::LIST_MODEL,
            connection = %model.connection_name,
            roles = model.role_names.len(),
            "list model created"
        );
        model
    }

    /// Creates a model whose tunables come from the `group` section of the
    /// shared settings.
    ///
    /// Fails when a key in the group holds a value of the wrong type or an
    /// out-of-range value.
    pub fn from_settings(
        connection_name: impl Into<String>,
        collaborators: ListCollaborators,
        query: Arc<dyn RowQuery>,
        group: &str,
    ) -> crate::Result<Arc<Self>> {
        let config = ListModelConfig::from_settings(&collaborators.settings, group)?;
        Ok(Self::new(connection_name, collaborators, query, config))
    }

    /// Creates a model for another query that shares `sibling`'s connection
    /// name and collaborators.
    ///
    /// Attempts count and batch size start from their defaults, and the new
    /// model has its own rows and its own filter dispatch.
    pub fn submodel(sibling: &ListSqlModel, query: Arc<dyn RowQuery>) -> Arc<Self> {
        let config = ListModelConfig {
            attempts_count: DEFAULT_ATTEMPTS_COUNT,
            request_batch_size: DEFAULT_REQUEST_BATCH_SIZE,
            escape_filter: sibling.escape_enabled(),
        };
        Self::new(
            sibling.connection_name.clone(),
            sibling.collaborators.clone(),
            query,
            config,
        )
    }

    pub fn db_connection_name(&self) -> &str {
        &self.connection_name
    }

    pub fn server_api(&self) -> &Arc<dyn ServerApi> {
        &self.collaborators.server_api
    }

    pub fn icon_provider(&self) -> &Arc<dyn IconProvider> {
        &self.collaborators.icon_provider
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.collaborators.settings
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.collaborators.event_loop
    }

    /// The underlying row store. Row queries fill it.
    pub fn row_store(&self) -> &StandardItemModel {
        &self.store
    }

    pub fn attempts_count(&self) -> u32 {
        self.attempts_count.load(Ordering::Relaxed)
    }

    pub fn set_attempts_count(&self, attempts: u32) {
        self.attempts_count.store(attempts, Ordering::Relaxed);
    }

    pub fn request_batch_size(&self) -> usize {
        self.request_batch_size.load(Ordering::Relaxed)
    }

    pub fn set_request_batch_size(&self, batch_size: usize) {
        self.request_batch_size.store(batch_size, Ordering::Relaxed);
    }

    /// Whether [`set_filter`](Self::set_filter) rewrites filters into LIKE
    /// patterns.
    pub fn escape_enabled(&self) -> bool {
        self.escape_enabled.load(Ordering::Relaxed)
    }

    pub fn set_escape_enabled(&self, enabled: bool) {
        self.escape_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Signal carrying every filter request. The model's own dispatch is
    /// connected to it with a queued connection.
    pub fn filter_request(&self) -> &Signal<FilterRequest> {
        &self.filter_request
    }

    /// Requests a new filter.
    ///
    /// Returns at once. The row query receives the filter on a later turn of
    /// the event loop. Requests are delivered in the order they were made and
    /// none is dropped in favour of a newer one. A request that cannot be
    /// queued is dropped with a warning.
    pub fn set_filter(&self, filter: &str, options: &str) {
        if let Err(err) = self.try_set_filter(filter, options) {
            tracing::warn!(
                target: targets::LIST_MODEL,
                connection = %self.connection_name,
                "filter request dropped: {err}"
            );
        }
    }

    /// Like [`set_filter`](Self::set_filter), but reports a request that
    /// could not be posted to the event loop.
    ///
    /// A blocked `filter_request` or a severed self-connection is not an
    /// error; the request simply never reaches the row query.
    pub fn try_set_filter(&self, filter: &str, options: &str) -> crate::Result<()> {
        let filter = if self.escape_enabled() {
            escape_filter(filter)
        } else {
            filter.to_owned()
        };
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let will_dispatch = !self.filter_request.is_blocked()
            && self.filter_request.is_connected(self.dispatch_connection);
        tracing::debug!(
            target: targets::LIST_MODEL,
            connection = %self.connection_name,
            filter = %filter,
            generation,
            will_dispatch,
            "filter requested"
        );

        self.filter_request
            .try_emit(FilterRequest {
                generation,
                filter,
                options: options.to_owned(),
            })
            .map_err(CoreError::from)?;
        if will_dispatch {
            self.latest_queued.fetch_max(generation, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Applies a filter request.
    ///
    /// Runs from the event loop. Options that are not a JSON object are
    /// logged and replaced with empty options. A request older than the
    /// newest queued one is still applied, and logged at debug level.
    pub fn on_filter_dispatched(&self, request: &FilterRequest) {
        let latest = self.latest_queued.load(Ordering::SeqCst);
        if request.generation < latest {
            tracing::debug!(
                target: targets::LIST_MODEL,
                connection = %self.connection_name,
                filter = %request.filter,
                generation = request.generation,
                latest,
                "applying filter that newer requests will replace"
            );
        }

        let options = options_or_empty(&request.options);
        let _span = PerfSpan::new("apply_filter");
        self.query.apply_filter(self, &request.filter, &options);
    }

    /// Asks the row query to refresh from the server with the configured
    /// attempts count.
    pub fn update_from_server(&self) {
        let attempts = self.attempts_count();
        tracing::debug!(
            target: targets::LIST_MODEL,
            connection = %self.connection_name,
            attempts,
            "updating from server"
        );
        let _span = PerfSpan::new("update_from_server");
        self.query.update_from_server(self, attempts);
    }

    pub fn set_expected_upload_count(&self, count: usize) {
        self.expected_upload_count.store(count, Ordering::Relaxed);
    }

    pub fn expected_upload_count(&self) -> usize {
        self.expected_upload_count.load(Ordering::Relaxed)
    }

    /// Records `count` more uploaded rows and returns the new total.
    pub fn add_uploaded(&self, count: usize) -> usize {
        self.uploaded_count.fetch_add(count, Ordering::Relaxed) + count
    }

    pub fn uploaded_count(&self) -> usize {
        self.uploaded_count.load(Ordering::Relaxed)
    }

    pub fn reset_upload_counters(&self) {
        self.expected_upload_count.store(0, Ordering::Relaxed);
        self.uploaded_count.store(0, Ordering::Relaxed);
    }

    /// `true` once at least the expected number of rows was uploaded.
    pub fn is_upload_complete(&self) -> bool {
        self.uploaded_count() >= self.expected_upload_count()
    }

    pub fn selected_role(&self) -> ItemRole {
        SELECTED_ROLE
    }

    /// The synthetic role reporting each row's number.
    pub fn last_role(&self) -> ItemRole {
        self.last_role
    }

    /// Returns the selection flag of `row`; rows never selected are not.
    pub fn is_selected(&self, row: usize) -> bool {
        let index = self.store.index(row, 0, &ModelIndex::invalid());
        self.store
            .data(&index, SELECTED_ROLE)
            .as_bool()
            .unwrap_or(false)
    }

    /// Sets the selection flag of `row`. Returns `false` if there is no such row.
    pub fn set_selected(&self, row: usize, selected: bool) -> bool {
        let index = self.store.index(row, 0, &ModelIndex::invalid());
        self.store
            .set_data(&index, ItemData::Bool(selected), SELECTED_ROLE)
    }
}

impl ItemModel for ListSqlModel {
    fn row_count(&self, parent: &ModelIndex) -> usize {
        self.store.row_count(parent)
    }

    fn column_count(&self, parent: &ModelIndex) -> usize {
        self.store.column_count(parent)
    }

    fn data(&self, index: &ModelIndex, role: ItemRole) -> ItemData {
        if role == self.last_role {
            return if index.is_valid() {
                ItemData::from(index.row())
            } else {
                ItemData::None
            };
        }
        self.store.data(index, role)
    }

    fn set_data(&self, index: &ModelIndex, value: ItemData, role: ItemRole) -> bool {
        self.store.set_data(index, value, role)
    }

    fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex {
        self.store.index(row, column, parent)
    }

    fn signals(&self) -> &ModelSignals {
        self.store.signals()
    }

    fn flags(&self, index: &ModelIndex) -> ItemFlags {
        self.store.flags(index)
    }

    fn role_names(&self) -> RoleNames {
        self.role_names.clone()
    }
}

fn build_role_names(query: &dyn RowQuery) -> (RoleNames, ItemRole) {
    let mut names = RoleNames::with_standard_roles();
    names.insert(SELECTED_ROLE, "selected");

    let mut next = 1;
    for name in query.role_names() {
        names.insert(ItemRole::User(next), name);
        next += 1;
    }

    let last_role = ItemRole::User(next);
    names.insert(last_role, "index");
    (names, last_role)
}
