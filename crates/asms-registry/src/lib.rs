//! # asms-registry
//!
//! The name→unit lookup table and the resource URI resolver. Both are
//! owned exclusively by whatever constructs them (the Gateway, in
//! practice).

pub mod registry;
pub mod resources;

pub use registry::{Registry, RegistryBuilder};
pub use resources::{compile_uri_template, ResourceRegistry};
