use std::sync::Arc;

use crate::application::errors::BotError;
use crate::application::messaging::CallbackOutcome;
use crate::domain::entities::{CallbackEvent, IncomingMessage, Update};
use crate::domain::traits::Bot;
use crate::modules::ModuleManager;
use super::command_service::CommandService;

/// Service for routing updates to commands, callback listeners and module hooks
pub struct MessageService {
    commands: CommandService,
    modules: Arc<ModuleManager>,
}

impl MessageService {
    pub fn new(commands: CommandService, modules: Arc<ModuleManager>) -> Self {
        Self { commands, modules }
    }

    pub fn commands(&self) -> &CommandService {
        &self.commands
    }

    /// Process one update to completion
    pub async fn process(&self, bot: &dyn Bot, update: Update) -> Result<(), BotError> {
        match update {
            Update::Message(message) => self.process_message(bot, &message).await,
            Update::Callback(event) => self.process_callback(bot, &event).await,
        }
    }

    async fn process_message(&self, bot: &dyn Bot, message: &IncomingMessage) -> Result<(), BotError> {
        if !message.new_chat_members.is_empty() {
            tracing::info!(chat = %message.chat.id, count = message.new_chat_members.len(), "New chat members");
            self.modules.notify_new_chat_members(&message.chat, &message.new_chat_members);
        }
        if let Some(member) = &message.left_chat_member {
            tracing::info!(chat = %message.chat.id, "{} left the chat", member.log_name());
            self.modules.notify_left_chat_member(&message.chat, member);
        }

        if message.text.trim().is_empty() {
            return Ok(());
        }
        if !self.commands.handle(bot, message).await? {
            tracing::debug!("Ignoring non-command message {}", message.id);
        }
        Ok(())
    }

    async fn process_callback(&self, bot: &dyn Bot, event: &CallbackEvent) -> Result<(), BotError> {
        let reply = match self.commands.router().dispatch_callback(event) {
            CallbackOutcome::Handled { reply } => reply,
            CallbackOutcome::NoMatch | CallbackOutcome::Failed => None,
        };
        // every callback query is answered, matched or not
        bot.answer_callback(&event.id, reply.as_deref()).await
    }
}
