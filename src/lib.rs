//! zincite - a module-hosting bot runtime with a typed command router
//!
//! Modules are loaded from shared-library bundles at startup and register
//! commands (with typed positional arguments) and callback listeners with
//! the host's router.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod modules;
pub mod host;

pub use host::Zincite;
