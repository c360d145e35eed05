//! Command handlers

use std::sync::Arc;

use crate::application::errors::CommandError;
use crate::domain::entities::{CommandDescriptor, IncomingMessage};
use super::callback::CallbackBinding;
use super::context::CommandContext;

/// Handler result: an optional reply for the sender
pub type CommandResult = Result<Option<String>, CommandError>;

/// Closure handler type
pub type CommandHandler = Box<dyn Fn(&IncomingMessage, &CommandContext) -> CommandResult + Send + Sync>;

/// An invocable command
pub trait BotCommand: Send + Sync {
    /// Static metadata: aliases, arguments, description
    fn descriptor(&self) -> &CommandDescriptor;

    /// Run the command. The message carries chat, sender, id, reply target and timestamp.
    fn execute(&self, message: &IncomingMessage, ctx: &CommandContext) -> CommandResult;

    /// Callback handlers this command also answers to
    ///
    /// Commands that implement [`CallbackListener`](super::callback::CallbackListener)
    /// return `callback::bind(self)` here.
    fn callback_bindings(self: Arc<Self>) -> Vec<CallbackBinding> {
        Vec::new()
    }
}

/// Command built from a descriptor and a closure
pub struct FnCommand {
    descriptor: CommandDescriptor,
    handler: CommandHandler,
}

impl FnCommand {
    pub fn new<F>(descriptor: CommandDescriptor, handler: F) -> Self
    where
        F: Fn(&IncomingMessage, &CommandContext) -> CommandResult + Send + Sync + 'static,
    {
        Self {
            descriptor,
            handler: Box::new(handler),
        }
    }
}

impl BotCommand for FnCommand {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn execute(&self, message: &IncomingMessage, ctx: &CommandContext) -> CommandResult {
        (self.handler)(message, ctx)
    }
}
