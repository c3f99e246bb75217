//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose instance lifecycle calls to Dart via FRB.
//! - Flatten core errors into string messages inside response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - All instances opened here share one context rooted at the FFI data dir.

use inquiry_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Context, Inquiry, InquiryResult,
};
use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;

const FFI_CONTEXT_NAME: &str = "inquiry_ffi";
const DATA_DIR_ENV: &str = "INQUIRY_DATA_DIR";
const DATA_DIR_FALLBACK: &str = "inquiry";
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Result envelope for instance lifecycle calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Registered instance name, when one applies.
    pub instance_name: Option<String>,
    /// Database file backing the instance.
    pub database_path: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl InstanceResponse {
    fn success(message: impl Into<String>, instance: &Inquiry) -> Self {
        Self {
            ok: true,
            instance_name: instance.instance_name(),
            database_path: instance
                .database_path()
                .ok()
                .map(|path| path.display().to_string()),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            instance_name: None,
            database_path: None,
            message: message.into(),
        }
    }
}

/// Builds and persists an instance, replacing any instance of the same name.
///
/// Input semantics:
/// - `database_name`: `None` or blank selects the default database.
/// - `database_version`: must be >= 1.
#[flutter_rust_bridge::frb(sync)]
pub fn instance_open(
    instance_name: String,
    database_name: Option<String>,
    database_version: u32,
) -> InstanceResponse {
    let opened = ffi_context().and_then(|context| {
        Inquiry::new_instance(context, database_name.as_deref())
            .instance_name(Some(instance_name))
            .database_version(database_version)
            .build()
    });
    match opened {
        Ok(instance) => InstanceResponse::success("Instance opened.", &instance),
        Err(err) => InstanceResponse::failure(format!("instance_open failed: {err}")),
    }
}

/// Destroys a persisted instance by name.
#[flutter_rust_bridge::frb(sync)]
pub fn instance_destroy(instance_name: String) -> InstanceResponse {
    match Inquiry::get(instance_name.trim()) {
        Ok(instance) => {
            let response = InstanceResponse::success("Instance destroyed.", &instance);
            Inquiry::destroy(instance_name.trim());
            response
        }
        Err(err) => InstanceResponse::failure(format!("instance_destroy failed: {err}")),
    }
}

/// Lists persisted instance names in sorted order.
#[flutter_rust_bridge::frb(sync)]
pub fn instance_list() -> Vec<String> {
    Inquiry::instance_names()
}

/// Drops `table` from a persisted instance's database.
#[flutter_rust_bridge::frb(sync)]
pub fn instance_drop_table(instance_name: String, table: String) -> InstanceResponse {
    let dropped = Inquiry::get(instance_name.trim()).and_then(|instance| {
        instance.drop_table(table.trim())?;
        Ok(instance)
    });
    match dropped {
        Ok(instance) => InstanceResponse::success("Table dropped.", &instance),
        Err(err) => InstanceResponse::failure(format!("instance_drop_table failed: {err}")),
    }
}

fn ffi_context() -> InquiryResult<Context> {
    Context::new(FFI_CONTEXT_NAME, resolve_data_dir())
}

fn resolve_data_dir() -> PathBuf {
    DATA_DIR
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DATA_DIR_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
                warn!("event=ffi_config module=ffi status=error error_code=blank_data_dir");
            }
            std::env::temp_dir().join(DATA_DIR_FALLBACK)
        })
        .clone()
}
