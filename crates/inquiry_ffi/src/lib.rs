//! Mobile host bindings for the Inquiry core.

pub mod api;
