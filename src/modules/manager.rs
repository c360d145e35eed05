//! Module manager - discovers bundles and drives module lifecycle

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use libloading::Library;
use tracing::{error, info, warn};

use crate::application::errors::ModuleError;
use crate::domain::entities::{Chat, IncomingMessage, User};
use crate::infrastructure::plugins::{BundleOpener, DylibOpener};
use super::trait_def::{Module, ModuleContext};

#[derive(Default)]
struct ModuleList {
    modules: Vec<Arc<dyn Module>>,
    // modules[..loaded] have received on_load
    loaded: usize,
}

/// Owns every active module
pub struct ModuleManager {
    // Declared before `libraries`: module code must be dropped while still mapped
    list: RwLock<ModuleList>,
    libraries: Mutex<Vec<Library>>,
    modules_dir: PathBuf,
    opener: Box<dyn BundleOpener>,
    closed: AtomicBool,
}

impl ModuleManager {
    /// Manager loading shared-library bundles from `modules_dir`
    pub fn new(modules_dir: impl Into<PathBuf>) -> Self {
        Self::with_opener(modules_dir, DylibOpener)
    }

    pub fn with_opener<O: BundleOpener + 'static>(modules_dir: impl Into<PathBuf>, opener: O) -> Self {
        Self {
            list: RwLock::new(ModuleList::default()),
            libraries: Mutex::new(Vec::new()),
            modules_dir: modules_dir.into(),
            opener: Box::new(opener),
            closed: AtomicBool::new(false),
        }
    }

    pub fn modules_dir(&self) -> &Path {
        &self.modules_dir
    }

    /// Add a module built into the host; it is loaded with the next `load` call
    pub fn register_module(&self, module: Arc<dyn Module>) {
        info!("Registering module: {}", module.name());
        self.list.write().unwrap_or_else(PoisonError::into_inner).modules.push(module);
    }

    /// Discover bundles, instantiate their modules, then run `on_load` on every new module
    ///
    /// Bundles are opened in file-name order. The first bundle that fails to open
    /// aborts the call: modules from earlier bundles stay registered but are not loaded.
    pub fn load(&self, host: &ModuleContext) -> Result<usize, ModuleError> {
        info!("Loading modules from {}...", self.modules_dir.display());

        if let Err(e) = std::fs::create_dir_all(&self.modules_dir) {
            warn!("Could not create modules directory {}: {}", self.modules_dir.display(), e);
        }

        for path in self.bundle_files() {
            let bundle = self.opener.open(&path)?;
            let (modules, library) = bundle.into_parts();
            info!(bundle = %path.display(), modules = modules.len(), "Bundle opened");

            if let Some(library) = library {
                self.libraries.lock().unwrap_or_else(PoisonError::into_inner).push(library);
            }
            self.list.write().unwrap_or_else(PoisonError::into_inner).modules.extend(modules);
        }

        let pending: Vec<Arc<dyn Module>> = {
            let mut list = self.list.write().unwrap_or_else(PoisonError::into_inner);
            let pending = list.modules[list.loaded..].to_vec();
            list.loaded = list.modules.len();
            pending
        };

        for module in &pending {
            match module.on_load(host) {
                Ok(()) => info!("Loaded module: {}", module.name()),
                Err(e) => error!("Module {} failed to load: {}", module.name(), e),
            }
        }

        info!("Modules loaded.");
        Ok(pending.len())
    }

    fn bundle_files(&self) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(&self.modules_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read modules directory {}: {}", self.modules_dir.display(), e);
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(e) => Some(e.path()),
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file() && self.opener.is_bundle(path))
            .collect();
        files.sort();
        files
    }

    /// Case-insensitive lookup by module name
    pub fn get_module(&self, name: &str) -> Option<Arc<dyn Module>> {
        let name = name.to_lowercase();
        self.list
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .modules
            .iter()
            .find(|m| m.name().to_lowercase() == name)
            .cloned()
    }

    /// Snapshot of all modules in registration order
    pub fn modules(&self) -> Vec<Arc<dyn Module>> {
        self.list.read().unwrap_or_else(PoisonError::into_inner).modules.clone()
    }

    /// Whether this exact instance is held by the manager
    pub fn is_enabled(&self, module: &Arc<dyn Module>) -> bool {
        self.list
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .modules
            .iter()
            .any(|m| std::ptr::addr_eq(Arc::as_ptr(m), Arc::as_ptr(module)))
    }

    /// Call `on_close` on every module in registration order; later calls do nothing
    pub fn close_all(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Closing modules...");
        for module in self.modules() {
            module.on_close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn for_each_active(&self, f: impl Fn(&dyn Module)) {
        if self.is_closed() {
            return;
        }
        for module in self.modules() {
            f(module.as_ref());
        }
    }

    pub fn notify_post_command(&self, message: &IncomingMessage, success: bool) {
        self.for_each_active(|m| m.on_post_command(message, success));
    }

    pub fn notify_new_chat_members(&self, chat: &Chat, members: &[User]) {
        self.for_each_active(|m| m.on_new_chat_members(chat, members));
    }

    pub fn notify_left_chat_member(&self, chat: &Chat, member: &User) {
        self.for_each_active(|m| m.on_left_chat_member(chat, member));
    }

    pub fn len(&self) -> usize {
        self.list.read().unwrap_or_else(PoisonError::into_inner).modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
