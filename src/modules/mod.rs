//! Module system for zincite
//!
//! Modules are loaded from shared-library bundles or registered by the host.
//! Each bundle exports an API version and an entry point via `export_modules!`.

pub mod manager;
pub mod trait_def;

pub use manager::ModuleManager;
pub use trait_def::{
    Module, ModuleContext, ModuleEntryFn, ModuleRegistrar, API_VERSION_SYMBOL, ENTRY_SYMBOL,
    MODULE_API_VERSION,
};
