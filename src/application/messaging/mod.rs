//! Message handling - Command routing and typed arguments

pub mod args;
pub mod callback;
pub mod command;
pub mod context;
pub mod dispatcher;
pub mod parser;

pub use args::ArgumentTypes;
pub use callback::{CallbackBinding, CallbackFn, CallbackListener, CallbackResult, CallbackTable};
pub use command::{BotCommand, CommandHandler, CommandResult, FnCommand};
pub use context::CommandContext;
pub use dispatcher::{CallbackOutcome, CommandRouter, Dispatched, RegisteredCommand, MISSING_DESCRIPTION};
pub use parser::{CommandLine, MessageParser};
