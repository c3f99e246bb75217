//! Row model shared by local tables and content providers.
//!
//! # Responsibility
//! - Describe how a row type maps onto table columns (`Record`).
//! - Carry column/value pairs between queries and providers (`ContentValues`).
//! - Carry filter predicates with their bound arguments (`Selection`).
//!
//! # Invariants
//! - Column names are plain identifiers; validation happens before SQL is built.

pub mod record;
pub mod selection;
pub mod values;
