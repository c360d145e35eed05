//! Command router - Alias and callback-tag dispatch tables
//!
//! Both tables are written during module loading and only read afterwards;
//! entries are cloned out of the locks before any handler runs.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::application::errors::CommandError;
use crate::domain::entities::{CallbackEvent, CommandDescriptor, IncomingMessage};
use crate::domain::traits::HelpEntry;
use super::args::ArgumentTypes;
use super::callback::{self, CallbackBinding, CallbackListener};
use super::command::{BotCommand, CommandResult, FnCommand};
use super::context::CommandContext;
use super::parser::{CommandLine, MessageParser};

/// Description published for commands whose own text is too short
pub const MISSING_DESCRIPTION: &str = "Command without description";

/// Command registered under one or more aliases
#[derive(Clone)]
pub struct RegisteredCommand {
    pub descriptor: Arc<CommandDescriptor>,
    pub command: Arc<dyn BotCommand>,
}

impl RegisteredCommand {
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Whether both entries point at the same handler instance
    pub fn same_as(&self, other: &RegisteredCommand) -> bool {
        Arc::ptr_eq(&self.descriptor, &other.descriptor)
    }
}

/// Result of a successful dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    /// Canonical name of the executed command
    pub command: String,
    pub reply: Option<String>,
}

/// Result of routing a callback event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// No listener for the event's tag
    NoMatch,
    Handled { reply: Option<String> },
    /// The handler failed; the error has been logged
    Failed,
}

#[derive(Default)]
struct CommandTable {
    by_alias: HashMap<String, RegisteredCommand>,
    // first-registration order of aliases, for listings
    order: Vec<String>,
}

/// Alias to command and tag to callback routing
pub struct CommandRouter {
    commands: RwLock<CommandTable>,
    callbacks: RwLock<HashMap<String, CallbackBinding>>,
    parser: RwLock<MessageParser>,
    types: Arc<ArgumentTypes>,
    prefix: char,
}

impl CommandRouter {
    /// Router with the built-in argument parsers and `/` as command prefix
    pub fn new() -> Self {
        Self::with_types('/', Arc::new(ArgumentTypes::new()))
    }

    pub fn with_types(prefix: char, types: Arc<ArgumentTypes>) -> Self {
        Self {
            commands: RwLock::new(CommandTable::default()),
            callbacks: RwLock::new(HashMap::new()),
            parser: RwLock::new(MessageParser::default()),
            types,
            prefix,
        }
    }

    /// Username stripped from `/command@username` labels
    pub fn set_bot_username(&self, username: impl Into<String>) {
        *self.parser.write().unwrap_or_else(PoisonError::into_inner) = MessageParser::new(Some(username.into()));
    }

    pub fn argument_types(&self) -> &Arc<ArgumentTypes> {
        &self.types
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    /// Register a command under each of its aliases, plus its callback handlers
    ///
    /// A later registration of the same alias replaces the earlier one.
    pub fn register(&self, command: Arc<dyn BotCommand>) -> Result<(), CommandError> {
        let descriptor = command.descriptor();
        descriptor.validate()?;
        for spec in descriptor.arguments() {
            if !self.types.supports(&spec.value_type) {
                tracing::warn!(
                    "Command {} declares argument '{}' of type {} without a registered parser",
                    descriptor.name(),
                    spec.name,
                    spec.value_type.name()
                );
            }
        }

        let entry = RegisteredCommand {
            descriptor: Arc::new(descriptor.clone()),
            command: Arc::clone(&command),
        };

        {
            let mut table = self.commands.write().unwrap_or_else(PoisonError::into_inner);
            for alias in entry.descriptor.aliases() {
                let key = alias.to_lowercase();
                match table.by_alias.insert(key.clone(), entry.clone()) {
                    Some(previous) => tracing::debug!(
                        "Alias '{}' of {} now points to {}",
                        key,
                        previous.name(),
                        entry.name()
                    ),
                    None => table.order.push(key),
                }
            }
        }
        tracing::debug!(command = %entry.name(), aliases = entry.descriptor.aliases().len(), "Command registered");

        for binding in command.callback_bindings() {
            self.insert_callback(binding);
        }
        Ok(())
    }

    /// Register a closure as a command
    pub fn register_fn<F>(&self, descriptor: CommandDescriptor, handler: F) -> Result<(), CommandError>
    where
        F: Fn(&IncomingMessage, &CommandContext) -> CommandResult + Send + Sync + 'static,
    {
        self.register(Arc::new(FnCommand::new(descriptor, handler)))
    }

    /// Register every handler of a standalone callback listener
    pub fn register_callback_listener<L: CallbackListener>(&self, listener: Arc<L>) {
        for binding in callback::bind(listener) {
            self.insert_callback(binding);
        }
    }

    fn insert_callback(&self, binding: CallbackBinding) {
        let tag = binding.tag().to_string();
        let listener = binding.listener();
        let previous = self
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tag.clone(), binding);
        if let Some(previous) = previous {
            tracing::debug!("Callback tag '{}' moved from {} to {}", tag, previous.listener(), listener);
        }
    }

    /// Exact (case-insensitive) alias lookup
    pub fn get_command(&self, alias: &str) -> Option<RegisteredCommand> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_alias
            .get(&alias.to_lowercase())
            .cloned()
    }

    /// Find the command a text addresses: first word, then the whole text
    pub fn resolve(&self, text: &str) -> Option<RegisteredCommand> {
        self.parse(text).and_then(|line| self.resolve_line(&line))
    }

    fn parse(&self, text: &str) -> Option<CommandLine> {
        self.parser.read().unwrap_or_else(PoisonError::into_inner).parse(text)
    }

    fn resolve_line(&self, line: &CommandLine) -> Option<RegisteredCommand> {
        self.get_command(&line.label)
            .or_else(|| self.get_command(&line.phrase))
    }

    /// Route a message to its command and run it
    ///
    /// `Ok(None)` means the text is not a command. Handler errors are returned
    /// as-is; replying to the user is up to the caller.
    pub fn dispatch(&self, message: &IncomingMessage) -> Result<Option<Dispatched>, CommandError> {
        let Some(line) = self.parse(&message.text) else {
            return Ok(None);
        };
        let Some(target) = self.resolve_line(&line) else {
            tracing::debug!("No command for '{}'", line.label);
            return Ok(None);
        };

        tracing::info!("{}#{}: {}", message.from.log_name(), message.chat.id, message.text);

        // tokens after the first word, whichever lookup matched
        let ctx = CommandContext::new(Arc::clone(&target.descriptor), line.args, Arc::clone(&self.types));

        tracing::info!(" # Executing '{}'", target.name());
        let reply = target.command.execute(message, &ctx)?;

        Ok(Some(Dispatched {
            command: target.name().to_string(),
            reply,
        }))
    }

    /// Binding registered for a callback tag
    pub fn resolve_callback(&self, tag: &str) -> Option<CallbackBinding> {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag)
            .cloned()
    }

    /// Route a callback event by its tag. Handler errors are logged, never returned.
    pub fn dispatch_callback(&self, event: &CallbackEvent) -> CallbackOutcome {
        tracing::info!(
            "InlineCallbackQuery: {}#{}: {}",
            event.from.log_name(),
            event.chat_id().unwrap_or_default(),
            event.data
        );

        let Some(binding) = self.resolve_callback(event.tag()) else {
            tracing::debug!("No callback listener for tag '{}'", event.tag());
            return CallbackOutcome::NoMatch;
        };

        tracing::info!(" # Executing callback listener for '{}'", event.data);
        match binding.invoke(event) {
            Ok(reply) => CallbackOutcome::Handled { reply },
            Err(e) => {
                tracing::error!(
                    tag = %binding.tag(),
                    listener = %binding.listener(),
                    "Callback listener failed: {}",
                    e
                );
                CallbackOutcome::Failed
            }
        }
    }

    /// Distinct commands in registration order
    pub fn commands(&self) -> Vec<RegisteredCommand> {
        let table = self.commands.read().unwrap_or_else(PoisonError::into_inner);
        let mut unique: Vec<RegisteredCommand> = Vec::new();
        for entry in table.order.iter().filter_map(|alias| table.by_alias.get(alias)) {
            if !unique.iter().any(|seen| seen.same_as(entry)) {
                unique.push(entry.clone());
            }
        }
        unique
    }

    /// (alias, description) pairs of visible prefixed commands, for client command lists
    pub fn help_entries(&self) -> Vec<HelpEntry> {
        let table = self.commands.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries = Vec::new();

        for alias in &table.order {
            let Some(entry) = table.by_alias.get(alias) else {
                continue;
            };
            let descriptor = &entry.descriptor;
            if descriptor.is_hidden() || !descriptor.name().starts_with(self.prefix) {
                continue;
            }

            let mut description = descriptor.description().to_string();
            if description.chars().count() < 4 {
                tracing::warn!("Command '{}' has no description", alias);
                description = MISSING_DESCRIPTION.to_string();
            }
            entries.push(HelpEntry {
                command: alias.clone(),
                description,
            });
        }
        entries
    }

    /// Number of registered aliases
    pub fn len(&self) -> usize {
        self.commands.read().unwrap_or_else(PoisonError::into_inner).by_alias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CommandRouter {
    fn default() -> Self {
        Self::new()
    }
}
