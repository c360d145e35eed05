//! Bundle loader - Opens module bundles from shared libraries

use std::path::{Path, PathBuf};
use std::sync::Arc;
use libloading::{Library, Symbol};
use crate::application::errors::ModuleError;
use crate::modules::{Module, ModuleEntryFn, ModuleRegistrar, API_VERSION_SYMBOL, ENTRY_SYMBOL, MODULE_API_VERSION};

/// Modules instantiated from one bundle
pub struct LoadedBundle {
    path: PathBuf,
    modules: Vec<Arc<dyn Module>>,
    library: Option<Library>,
}

impl LoadedBundle {
    /// Bundle whose code is already part of the process
    pub fn in_process(path: impl Into<PathBuf>, modules: Vec<Arc<dyn Module>>) -> Self {
        Self {
            path: path.into(),
            modules,
            library: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Split into the module instances and the library backing their code
    pub fn into_parts(self) -> (Vec<Arc<dyn Module>>, Option<Library>) {
        (self.modules, self.library)
    }
}

/// Turns a bundle file into module instances
pub trait BundleOpener: Send + Sync {
    /// Whether a directory entry should be treated as a bundle
    fn is_bundle(&self, path: &Path) -> bool;

    fn open(&self, path: &Path) -> Result<LoadedBundle, ModuleError>;
}

/// Opens platform shared libraries (`.so`, `.dylib`, `.dll`)
#[derive(Debug, Default, Clone, Copy)]
pub struct DylibOpener;

impl DylibOpener {
    fn load_error(path: &Path, reason: impl Into<String>) -> ModuleError {
        ModuleError::Load {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl BundleOpener for DylibOpener {
    fn is_bundle(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(std::env::consts::DLL_EXTENSION))
            .unwrap_or(false)
    }

    fn open(&self, path: &Path) -> Result<LoadedBundle, ModuleError> {
        // Load the library
        let library = unsafe {
            Library::new(path)
                .map_err(|e| Self::load_error(path, format!("Failed to load library: {}", e)))?
        };

        let version = unsafe {
            let symbol: Symbol<*const u32> = library
                .get(API_VERSION_SYMBOL)
                .map_err(|e| Self::load_error(path, format!("Missing module API version: {}", e)))?;
            **symbol
        };
        if version != MODULE_API_VERSION {
            return Err(ModuleError::AbiMismatch {
                path: path.to_path_buf(),
                expected: MODULE_API_VERSION,
                found: version,
            });
        }

        // Get the entry point
        let entry: ModuleEntryFn = unsafe {
            let symbol: Symbol<ModuleEntryFn> = library
                .get(ENTRY_SYMBOL)
                .map_err(|e| Self::load_error(path, format!("Failed to find entry point: {}", e)))?;
            *symbol
        };

        let mut registrar = ModuleRegistrar::new();
        entry(&mut registrar).map_err(|source| ModuleError::Entry {
            path: path.to_path_buf(),
            source,
        })?;

        if registrar.is_empty() {
            tracing::warn!("Bundle {} registered no modules", path.display());
        }

        Ok(LoadedBundle {
            path: path.to_path_buf(),
            modules: registrar.into_modules(),
            library: Some(library),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_extension() {
        let opener = DylibOpener;
        let name = format!("libgreeter.{}", std::env::consts::DLL_EXTENSION);
        assert!(opener.is_bundle(Path::new(&name)));
        assert!(!opener.is_bundle(Path::new("notes.txt")));
        assert!(!opener.is_bundle(Path::new("modules")));
    }

    #[test]
    fn test_garbage_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("broken.{}", std::env::consts::DLL_EXTENSION));
        std::fs::write(&path, b"definitely not a shared library").unwrap();

        match DylibOpener.open(&path) {
            Err(ModuleError::Load { path: failed, .. }) => assert_eq!(failed, path),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("garbage bundle opened"),
        }
    }
}
