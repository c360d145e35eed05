//! Module Loader Integration Tests
//! Run with: cargo test --test module_loader_test

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use zincite::application::errors::{BoxError, ModuleError};
use zincite::application::messaging::{CommandRouter, FnCommand};
use zincite::domain::entities::CommandDescriptor;
use zincite::infrastructure::config::ZinciteConfig;
use zincite::infrastructure::plugins::{BundleOpener, LoadedBundle};
use zincite::modules::{Module, ModuleContext, ModuleManager};

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

struct EchoModule {
    name: &'static str,
    fail_on_load: bool,
    loads: AtomicUsize,
}

impl EchoModule {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            fail_on_load: false,
            loads: AtomicUsize::new(0),
        }
    }

    fn failing(name: &'static str) -> Self {
        Self {
            fail_on_load: true,
            ..Self::new(name)
        }
    }
}

impl Module for EchoModule {
    fn name(&self) -> &str {
        self.name
    }

    fn on_load(&self, host: &ModuleContext) -> Result<(), BoxError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_load {
            return Err("database unavailable".into());
        }

        let descriptor = CommandDescriptor::new(format!("/{}", self.name.to_lowercase()))
            .with_description("Echo the arguments")
            .with_module(self.name);
        host.register_command(Arc::new(FnCommand::new(descriptor, |_, ctx| {
            Ok(Some(ctx.tokens().join(" ")))
        })))?;
        Ok(())
    }
}

/// Treats `*.bundle` files as bundles; names containing "broken" fail to open
struct FakeOpener;

impl BundleOpener for FakeOpener {
    fn is_bundle(&self, path: &Path) -> bool {
        path.extension().and_then(|ext| ext.to_str()) == Some("bundle")
    }

    fn open(&self, path: &Path) -> Result<LoadedBundle, ModuleError> {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if stem.contains("broken") {
            return Err(ModuleError::Load {
                path: path.to_path_buf(),
                reason: "not a module bundle".to_string(),
            });
        }
        let modules: Vec<Arc<dyn Module>> = vec![
            Arc::new(EchoModule::new("Alpha")),
            Arc::new(EchoModule::new("Beta")),
        ];
        Ok(LoadedBundle::in_process(path, modules))
    }
}

fn host() -> (Arc<CommandRouter>, ModuleContext) {
    let router = Arc::new(CommandRouter::new());
    let host = ModuleContext::new(Arc::clone(&router), Arc::new(ZinciteConfig::default()));
    (router, host)
}

fn touch(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), b"").unwrap();
}

#[test]
fn test_valid_bundle_registers_commands() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "echo.bundle");
    touch(dir.path(), "README.txt");

    let manager = ModuleManager::with_opener(dir.path(), FakeOpener);
    let (router, host) = host();

    assert_eq!(manager.load(&host).unwrap(), 2);
    assert_eq!(manager.len(), 2);
    assert!(router.resolve("/alpha").is_some());
    assert!(router.resolve("/BETA").is_some());
    assert!(manager.get_module("beta").is_some());
}

#[test]
fn test_broken_bundle_first_stops_loading() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a_broken.bundle");
    touch(dir.path(), "b_valid.bundle");

    let manager = ModuleManager::with_opener(dir.path(), FakeOpener);
    let (router, host) = host();

    match manager.load(&host) {
        Err(ModuleError::Load { path, .. }) => assert!(path.ends_with("a_broken.bundle")),
        other => panic!("expected load error, got {:?}", other.map(|n| n.to_string())),
    }
    assert!(manager.is_empty());
    assert!(router.is_empty());
}

#[test]
fn test_modules_before_failure_stay_registered_unloaded() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a_valid.bundle");
    touch(dir.path(), "b_broken.bundle");

    let manager = ModuleManager::with_opener(dir.path(), FakeOpener);
    let (router, host) = host();

    assert!(manager.load(&host).is_err());
    assert_eq!(manager.len(), 2);
    assert!(manager.get_module("alpha").is_some());
    // on_load never ran, so nothing was registered
    assert!(router.is_empty());
}

#[test]
fn test_on_load_failure_does_not_stop_other_modules() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    let manager = ModuleManager::with_opener(dir.path(), FakeOpener);
    let failing = Arc::new(EchoModule::failing("Broken"));
    let healthy = Arc::new(EchoModule::new("Healthy"));
    manager.register_module(failing.clone());
    manager.register_module(healthy.clone());

    let (router, host) = host();
    assert_eq!(manager.load(&host).unwrap(), 2);

    assert_eq!(failing.loads.load(Ordering::SeqCst), 1);
    assert_eq!(healthy.loads.load(Ordering::SeqCst), 1);
    assert!(router.resolve("/healthy").is_some());
    assert!(router.resolve("/broken").is_none());
}

#[test]
fn test_garbage_shared_library_is_load_error() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    let name = format!("garbage.{}", std::env::consts::DLL_EXTENSION);
    std::fs::write(dir.path().join(&name), b"this is not machine code").unwrap();

    let manager = ModuleManager::new(dir.path());
    let (_router, host) = host();

    assert!(matches!(manager.load(&host), Err(ModuleError::Load { .. })));
    assert!(manager.is_empty());
}
