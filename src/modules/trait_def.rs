//! Module trait definitions and the bundle entry-point contract

use std::sync::Arc;

use crate::application::errors::{BoxError, CommandError};
use crate::application::messaging::{ArgumentTypes, BotCommand, CallbackListener, CommandRouter};
use crate::domain::entities::{Chat, IncomingMessage, User};
use crate::infrastructure::config::ZinciteConfig;

/// Version of the bundle contract. Bundles built against another version are rejected.
pub const MODULE_API_VERSION: u32 = 1;

/// Exported `u32` static holding the bundle's [`MODULE_API_VERSION`]
pub const API_VERSION_SYMBOL: &[u8] = b"ZINCITE_MODULE_API_VERSION";

/// Exported [`ModuleEntryFn`]
pub const ENTRY_SYMBOL: &[u8] = b"zincite_register_modules";

/// Signature of the bundle entry point
pub type ModuleEntryFn = fn(&mut ModuleRegistrar) -> Result<(), BoxError>;

/// Core trait every module implements
pub trait Module: Send + Sync {
    /// Unique identifier, compared case-insensitively
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str {
        ""
    }

    /// Called once after instantiation; register commands and listeners here
    fn on_load(&self, _host: &ModuleContext) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called once at host shutdown
    fn on_close(&self) {}

    fn on_new_chat_members(&self, _chat: &Chat, _members: &[User]) {}

    fn on_left_chat_member(&self, _chat: &Chat, _member: &User) {}

    /// Called after every command dispatch with whether the handler succeeded
    fn on_post_command(&self, _message: &IncomingMessage, _success: bool) {}
}

/// Host handle given to modules while they load
#[derive(Clone)]
pub struct ModuleContext {
    commands: Arc<CommandRouter>,
    config: Arc<ZinciteConfig>,
}

impl ModuleContext {
    pub fn new(commands: Arc<CommandRouter>, config: Arc<ZinciteConfig>) -> Self {
        Self { commands, config }
    }

    pub fn register_command(&self, command: Arc<dyn BotCommand>) -> Result<(), CommandError> {
        self.commands.register(command)
    }

    pub fn register_callback_listener<L: CallbackListener>(&self, listener: Arc<L>) {
        self.commands.register_callback_listener(listener)
    }

    /// Registry to add parsers for new argument types
    pub fn argument_types(&self) -> &Arc<ArgumentTypes> {
        self.commands.argument_types()
    }

    pub fn config(&self) -> &ZinciteConfig {
        &self.config
    }
}

/// Collects the modules a bundle provides
#[derive(Default)]
pub struct ModuleRegistrar {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M: Module + 'static>(&mut self, module: M) {
        self.modules.push(Arc::new(module));
    }

    pub fn into_modules(self) -> Vec<Arc<dyn Module>> {
        self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Export the API version and entry point of a module bundle
///
/// ```ignore
/// zincite::export_modules!(GreeterModule::new(), DiceModule::default());
/// ```
#[macro_export]
macro_rules! export_modules {
    ($($module:expr),+ $(,)?) => {
        #[no_mangle]
        pub static ZINCITE_MODULE_API_VERSION: u32 = $crate::modules::MODULE_API_VERSION;

        #[no_mangle]
        pub fn zincite_register_modules(
            registrar: &mut $crate::modules::ModuleRegistrar,
        ) -> ::std::result::Result<(), $crate::application::errors::BoxError> {
            $( registrar.register($module); )+
            Ok(())
        }
    };
}
