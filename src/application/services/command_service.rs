use std::sync::{Arc, Weak};

use crate::application::errors::{BotError, CommandError};
use crate::application::messaging::{CommandRouter, FnCommand};
use crate::domain::entities::{ArgumentSpec, CommandDescriptor, IncomingMessage};
use crate::domain::traits::Bot;
use crate::modules::ModuleManager;

/// Reply sent when a command fails for reasons the sender cannot fix
pub const COMMAND_FAILED: &str = "Something went wrong while running that command.";

/// Service for running commands and reporting their failures
pub struct CommandService {
    router: Arc<CommandRouter>,
    modules: Arc<ModuleManager>,
    owner_id: Option<String>,
}

impl CommandService {
    pub fn new(router: Arc<CommandRouter>, modules: Arc<ModuleManager>, owner_id: Option<String>) -> Self {
        Self {
            router,
            modules,
            owner_id,
        }
    }

    pub fn router(&self) -> &Arc<CommandRouter> {
        &self.router
    }

    /// Register the built-in `help` command
    pub fn register_defaults(&self) -> Result<(), CommandError> {
        let prefix = self.router.prefix();
        let router = Arc::downgrade(&self.router);

        let descriptor = CommandDescriptor::new(format!("{}help", prefix))
            .with_description("Show available commands")
            .with_argument(ArgumentSpec::optional::<String>("command", "Command to describe"))
            .with_module("zincite");

        self.router.register(Arc::new(FnCommand::new(descriptor, move |_message, ctx| {
            let topic = ctx.get::<String>("command")?;
            Ok(Some(render_help(&router, prefix, topic.as_deref())))
        })))
    }

    /// Dispatch a message; returns whether it was a command
    ///
    /// Handler failures are reported to the sender (and the owner, when configured)
    /// and do not surface as errors. Only transport failures do.
    pub async fn handle(&self, bot: &dyn Bot, message: &IncomingMessage) -> Result<bool, BotError> {
        match self.router.dispatch(message) {
            Ok(None) => Ok(false),
            Ok(Some(dispatched)) => {
                if let Some(reply) = dispatched.reply {
                    bot.send_message(&message.chat.id, &reply).await?;
                }
                self.modules.notify_post_command(message, true);
                Ok(true)
            }
            Err(e) => {
                tracing::error!(chat = %message.chat.id, "Command '{}' failed: {}", message.text, e);
                self.report_failure(bot, message, &e).await?;
                self.modules.notify_post_command(message, false);
                Ok(true)
            }
        }
    }

    async fn report_failure(&self, bot: &dyn Bot, message: &IncomingMessage, error: &CommandError) -> Result<(), BotError> {
        let reply = match error {
            CommandError::Parse { .. } | CommandError::InvalidArgs(_) | CommandError::PermissionDenied => {
                error.to_string()
            }
            _ => COMMAND_FAILED.to_string(),
        };
        bot.send_message(&message.chat.id, &reply).await?;

        if let Some(owner) = &self.owner_id {
            let detail = format!(
                "Command failed\nFrom: {}\nChat: {}\nText: {}\nError: {}",
                message.from.log_name(),
                message.chat.id,
                message.text,
                error
            );
            if let Err(e) = bot.send_message(owner, &detail).await {
                tracing::warn!("Failed to notify owner: {}", e);
            }
        }
        Ok(())
    }
}

fn render_help(router: &Weak<CommandRouter>, prefix: char, topic: Option<&str>) -> String {
    let Some(router) = router.upgrade() else {
        return COMMAND_FAILED.to_string();
    };

    if let Some(topic) = topic {
        let alias = if topic.starts_with(prefix) {
            topic.to_string()
        } else {
            format!("{}{}", prefix, topic)
        };
        return match router.get_command(&alias) {
            Some(entry) if !entry.descriptor.is_hidden() => entry.descriptor.usage(),
            _ => format!("Command {} not found", alias),
        };
    }

    let mut help = "Available commands:".to_string();
    for entry in router.commands() {
        let descriptor = &entry.descriptor;
        if descriptor.is_hidden() || !descriptor.name().starts_with(prefix) {
            continue;
        }
        help.push('\n');
        help.push_str(&descriptor.usage());
    }
    help
}
