//! Bundle loading for the module system
//!
//! A bundle is a dynamically loaded shared library exporting the module entry point.

pub mod loader;

pub use loader::{BundleOpener, DylibOpener, LoadedBundle};
