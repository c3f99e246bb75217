//! Named database-handle instances and their process-wide registry.
//!
//! # Responsibility
//! - Build instances (context, database name, version, handler) through a
//!   one-shot builder, optionally persisting them under a name.
//! - Look up, copy and destroy persisted instances.
//! - Construct query builders bound to an instance's database or resolver.
//!
//! # Invariants
//! - At most one persisted instance per name; persisting a new one destroys
//!   the previous holder of that name.
//! - A destroyed instance keeps no context, handler or database settings, and
//!   every factory on it fails with `InstanceDestroyed`.
//! - An instance only ever removes its own registry entry.

use crate::context::Context;
use crate::db::{open_database, schema};
use crate::error::{InquiryError, InquiryResult};
use crate::handler::Handler;
use crate::model::record::Record;
use crate::query::{Delete, Insert, Query, QuerySource, QueryTarget, Select, Update};
use crate::uri::ContentUri;
use log::{debug, info};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use uuid::Uuid;

/// Database name used when a builder receives none.
pub const DEFAULT_DATABASE_NAME: &str = "default_db";
/// Version used when a builder is not given one.
pub const DEFAULT_DATABASE_VERSION: u32 = 1;

static INSTANCES: Lazy<Mutex<HashMap<String, Inquiry>>> = Lazy::new(Default::default);

fn registry() -> MutexGuard<'static, HashMap<String, Inquiry>> {
    INSTANCES.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Serializable snapshot of a live instance's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub id: Uuid,
    pub instance_name: String,
    pub context_name: String,
    pub database_name: String,
    pub database_version: u32,
    pub database_path: PathBuf,
    pub handler_name: String,
}

struct InstanceState {
    context: Context,
    handler: Handler,
    database_name: String,
    database_version: u32,
    instance_name: String,
}

struct Shared {
    id: Uuid,
    state: RwLock<Option<InstanceState>>,
}

/// Handle to one named database configuration.
///
/// Clones share state: destroying one clone destroys them all.
#[derive(Clone)]
pub struct Inquiry {
    shared: Arc<Shared>,
}

/// One-shot builder returned by [`Inquiry::new_instance`].
pub struct InquiryBuilder {
    context: Context,
    database_name: String,
    database_version: u32,
    instance_name: Option<String>,
    handler: Option<Handler>,
}

impl InquiryBuilder {
    fn new(context: Context, database_name: Option<&str>) -> Self {
        let database_name = match database_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                debug!("Using default database name: {DEFAULT_DATABASE_NAME}");
                DEFAULT_DATABASE_NAME.to_string()
            }
        };
        Self {
            context,
            database_name,
            database_version: DEFAULT_DATABASE_VERSION,
            instance_name: None,
            handler: None,
        }
    }

    /// Registry key; `None` or blank falls back to the context's instance name.
    pub fn instance_name(mut self, name: Option<String>) -> Self {
        self.instance_name = name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        self
    }

    /// Must be at least 1; checked in `build`.
    pub fn database_version(mut self, version: u32) -> Self {
        self.database_version = version;
        self
    }

    /// Dispatch handle for async callbacks; a new one is spawned when `None`.
    pub fn handler(mut self, handler: Option<Handler>) -> Self {
        self.handler = handler;
        self
    }

    /// Builds and persists the instance.
    pub fn build(self) -> InquiryResult<Inquiry> {
        self.build_with(true)
    }

    /// Builds the instance, registering it under its name when `persist` is set.
    ///
    /// # Errors
    /// - `InvalidDatabaseVersion` for version 0.
    /// - `Dispatch` when a default handler cannot be spawned.
    pub fn build_with(self, persist: bool) -> InquiryResult<Inquiry> {
        if self.database_version < 1 {
            return Err(InquiryError::InvalidDatabaseVersion(self.database_version));
        }

        let handler = match self.handler {
            Some(handler) => handler,
            None => Handler::new()?,
        };
        let instance_name = self
            .instance_name
            .unwrap_or_else(|| self.context.instance_name());

        let instance = Inquiry {
            shared: Arc::new(Shared {
                id: Uuid::new_v4(),
                state: RwLock::new(Some(InstanceState {
                    context: self.context,
                    handler,
                    database_name: self.database_name,
                    database_version: self.database_version,
                    instance_name: instance_name.clone(),
                })),
            }),
        };

        if persist {
            let previous = registry().insert(instance_name.clone(), instance.clone());
            if let Some(previous) = previous {
                previous.clear_state();
                info!(
                    "event=instance_replace module=instance status=ok instance={instance_name}"
                );
            }
        }

        info!(
            "event=instance_build module=instance status=ok instance={instance_name} persist={persist}"
        );
        debug!("Built instance {instance_name}");
        Ok(instance)
    }
}

impl Inquiry {
    /// Starts building an instance for `context`.
    ///
    /// A missing or blank `database_name` becomes [`DEFAULT_DATABASE_NAME`].
    pub fn new_instance(context: Context, database_name: Option<&str>) -> InquiryBuilder {
        InquiryBuilder::new(context, database_name)
    }

    /// Returns the persisted instance registered as `instance_name`.
    pub fn get(instance_name: &str) -> InquiryResult<Inquiry> {
        registry()
            .get(instance_name)
            .cloned()
            .ok_or_else(|| InquiryError::InstanceNotFound(instance_name.to_string()))
    }

    /// Returns the persisted instance registered under `context`'s name.
    pub fn get_for_context(context: &Context) -> InquiryResult<Inquiry> {
        Self::get(&context.instance_name())
    }

    /// Sorted names of all persisted instances.
    pub fn instance_names() -> Vec<String> {
        let mut names = registry().keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Builds a copy of `instance` under `new_instance_name`.
    ///
    /// Context, database name, version and handler are shared with the source.
    pub fn copy(
        instance: &Inquiry,
        new_instance_name: &str,
        persist: bool,
    ) -> InquiryResult<Inquiry> {
        let (context, database_name, database_version, handler) =
            instance.with_state(|state| {
                (
                    state.context.clone(),
                    state.database_name.clone(),
                    state.database_version,
                    state.handler.clone(),
                )
            })?;

        Inquiry::new_instance(context, Some(&database_name))
            .handler(Some(handler))
            .database_version(database_version)
            .instance_name(Some(new_instance_name.to_string()))
            .build_with(persist)
    }

    /// Builds a copy of `instance` owned by `new_context`, named after it.
    pub fn copy_for_context(
        instance: &Inquiry,
        new_context: &Context,
        persist: bool,
    ) -> InquiryResult<Inquiry> {
        let (database_name, database_version, handler) = instance.with_state(|state| {
            (
                state.database_name.clone(),
                state.database_version,
                state.handler.clone(),
            )
        })?;

        Inquiry::new_instance(new_context.clone(), Some(&database_name))
            .handler(Some(handler))
            .database_version(database_version)
            .instance_name(Some(new_context.instance_name()))
            .build_with(persist)
    }

    /// Destroys and unregisters the instance named `instance_name`.
    ///
    /// Missing names are logged and ignored.
    pub fn destroy(instance_name: &str) {
        let removed = registry().remove(instance_name);
        match removed {
            Some(instance) => {
                instance.clear_state();
                info!(
                    "event=instance_destroy module=instance status=ok instance={instance_name}"
                );
            }
            None => debug!("No instances found to destroy by name {instance_name}."),
        }
    }

    /// Destroys the instance registered under `context`'s name.
    pub fn destroy_context(context: &Context) {
        Self::destroy(&context.instance_name());
    }

    /// Clears this instance and removes its registry entry if it owns it.
    ///
    /// Calling this more than once is a no-op.
    pub fn destroy_instance(&self) {
        let Some(state) = self.clear_state() else {
            return;
        };

        let mut instances = registry();
        let owns_entry = instances
            .get(&state.instance_name)
            .is_some_and(|registered| registered.same_instance(self));
        if owns_entry {
            instances.remove(&state.instance_name);
        }
        drop(instances);

        info!(
            "event=instance_destroy module=instance status=ok instance={} unregistered={owns_entry}",
            state.instance_name
        );
    }

    /// Drops `table` from this instance's database if it exists.
    pub fn drop_table(&self, table: &str) -> InquiryResult<()> {
        schema::validate_identifier(table)?;
        let (path, version) = self.database_location()?;
        let conn = open_database(&path, version)?;
        schema::drop_table(&conn, table)?;
        info!("event=table_drop module=instance status=ok table={table}");
        Ok(())
    }

    pub fn select_from<T: Record>(&self, table: &str) -> InquiryResult<Query<T, Select>> {
        Ok(Query::new(self.table_source(table)?))
    }

    pub fn select_from_uri<T: Record>(&self, uri: &ContentUri) -> InquiryResult<Query<T, Select>> {
        Ok(Query::new(self.provider_source(uri)?))
    }

    pub fn insert_into<T: Record>(&self, table: &str) -> InquiryResult<Query<T, Insert>> {
        Ok(Query::new(self.table_source(table)?))
    }

    pub fn insert_into_uri<T: Record>(&self, uri: &ContentUri) -> InquiryResult<Query<T, Insert>> {
        Ok(Query::new(self.provider_source(uri)?))
    }

    pub fn update<T: Record>(&self, table: &str) -> InquiryResult<Query<T, Update>> {
        Ok(Query::new(self.table_source(table)?))
    }

    pub fn update_uri<T: Record>(&self, uri: &ContentUri) -> InquiryResult<Query<T, Update>> {
        Ok(Query::new(self.provider_source(uri)?))
    }

    pub fn delete_from<T: Record>(&self, table: &str) -> InquiryResult<Query<T, Delete>> {
        Ok(Query::new(self.table_source(table)?))
    }

    pub fn delete_from_uri<T: Record>(&self, uri: &ContentUri) -> InquiryResult<Query<T, Delete>> {
        Ok(Query::new(self.provider_source(uri)?))
    }

    /// Stable identity, kept after destruction.
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.read_state().is_none()
    }

    pub fn instance_name(&self) -> Option<String> {
        self.with_state(|state| state.instance_name.clone()).ok()
    }

    pub fn database_name(&self) -> Option<String> {
        self.with_state(|state| state.database_name.clone()).ok()
    }

    /// Configured version, or 0 once destroyed.
    pub fn database_version(&self) -> u32 {
        self.with_state(|state| state.database_version).unwrap_or(0)
    }

    pub fn context(&self) -> Option<Context> {
        self.with_state(|state| state.context.clone()).ok()
    }

    pub fn handler(&self) -> Option<Handler> {
        self.with_state(|state| state.handler.clone()).ok()
    }

    /// File backing this instance's database.
    pub fn database_path(&self) -> InquiryResult<PathBuf> {
        self.with_state(|state| state.context.database_path(&state.database_name))
    }

    pub fn info(&self) -> Option<InstanceInfo> {
        let id = self.shared.id;
        self.with_state(|state| InstanceInfo {
            id,
            instance_name: state.instance_name.clone(),
            context_name: state.context.name().to_string(),
            database_name: state.database_name.clone(),
            database_version: state.database_version,
            database_path: state.context.database_path(&state.database_name),
            handler_name: state.handler.name().to_string(),
        })
        .ok()
    }

    fn same_instance(&self, other: &Inquiry) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, Option<InstanceState>> {
        self.shared.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_state<R>(&self, read: impl FnOnce(&InstanceState) -> R) -> InquiryResult<R> {
        self.read_state()
            .as_ref()
            .map(read)
            .ok_or(InquiryError::InstanceDestroyed)
    }

    fn clear_state(&self) -> Option<InstanceState> {
        self.shared
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn database_location(&self) -> InquiryResult<(PathBuf, u32)> {
        self.with_state(|state| {
            (
                state.context.database_path(&state.database_name),
                state.database_version,
            )
        })
    }

    fn table_source(&self, table: &str) -> InquiryResult<QuerySource> {
        schema::validate_identifier(table)?;
        self.source(QueryTarget::Table(table.to_string()))
    }

    fn provider_source(&self, uri: &ContentUri) -> InquiryResult<QuerySource> {
        self.source(QueryTarget::Provider(uri.clone()))
    }

    fn source(&self, target: QueryTarget) -> InquiryResult<QuerySource> {
        self.with_state(|state| QuerySource {
            target,
            database_path: state.context.database_path(&state.database_name),
            database_version: state.database_version,
            resolver: Arc::clone(state.context.resolver()),
            handler: state.handler.clone(),
        })
    }
}

impl Debug for Inquiry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inquiry")
            .field("id", &self.shared.id)
            .field("instance_name", &self.instance_name())
            .field("database_name", &self.database_name())
            .field("database_version", &self.database_version())
            .finish()
    }
}
