//! Zincite host - wires transport, router and modules into the update loop

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::application::errors::BotError;
use crate::application::messaging::{ArgumentTypes, CommandRouter};
use crate::application::services::{CommandService, MessageService};
use crate::domain::entities::Update;
use crate::domain::traits::Bot;
use crate::infrastructure::adapters::ControlSignal;
use crate::infrastructure::config::ZinciteConfig;
use crate::modules::{Module, ModuleContext, ModuleManager};

const FETCH_RETRY_DELAY: Duration = Duration::from_secs(3);

/// The bot runtime
pub struct Zincite {
    // the router holds module code; it must go before the manager unmaps it
    router: Arc<CommandRouter>,
    messages: MessageService,
    modules: Arc<ModuleManager>,
    config: Arc<ZinciteConfig>,
    bot: Arc<dyn Bot>,
    control_tx: mpsc::UnboundedSender<ControlSignal>,
    control_rx: Mutex<Option<mpsc::UnboundedReceiver<ControlSignal>>>,
}

impl Zincite {
    /// Host loading bundles from the configured modules path
    pub fn new(config: ZinciteConfig, bot: Arc<dyn Bot>) -> Self {
        let modules = ModuleManager::new(config.modules_path.clone());
        Self::with_modules(config, bot, modules)
    }

    pub fn with_modules(config: ZinciteConfig, bot: Arc<dyn Bot>, modules: ModuleManager) -> Self {
        let types = Arc::new(ArgumentTypes::new().with_date_time());
        let router = Arc::new(CommandRouter::with_types(config.prefix_char(), types));
        let modules = Arc::new(modules);
        let commands = CommandService::new(Arc::clone(&router), Arc::clone(&modules), config.owner_id.clone());
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        Self {
            router,
            messages: MessageService::new(commands, Arc::clone(&modules)),
            modules,
            config: Arc::new(config),
            bot,
            control_tx,
            control_rx: Mutex::new(Some(control_rx)),
        }
    }

    pub fn router(&self) -> &Arc<CommandRouter> {
        &self.router
    }

    pub fn modules(&self) -> &Arc<ModuleManager> {
        &self.modules
    }

    pub fn config(&self) -> &ZinciteConfig {
        &self.config
    }

    pub fn bot(&self) -> &Arc<dyn Bot> {
        &self.bot
    }

    /// Sender for control signals, e.g. from a console reader
    pub fn control(&self) -> mpsc::UnboundedSender<ControlSignal> {
        self.control_tx.clone()
    }

    pub fn stop(&self) {
        if self.control_tx.send(ControlSignal::Stop).is_err() {
            tracing::debug!("Host loop already finished");
        }
    }

    /// Module that registered the command behind `alias`
    pub fn command_module(&self, alias: &str) -> Option<Arc<dyn Module>> {
        let entry = self.router.get_command(alias)?;
        self.modules.get_module(entry.descriptor.module()?)
    }

    /// Start the transport, load modules and run the update loop until stopped
    pub async fn start(&self) -> Result<(), BotError> {
        let mut control = self
            .control_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| BotError::Internal("Host already started".to_string()))?;

        tracing::info!("Starting {} v{}", self.config.name, self.config.version);
        self.bot.start().await?;
        self.router.set_bot_username(self.bot.bot_info().username);

        if let Err(e) = self.messages.commands().register_defaults() {
            tracing::warn!("Failed to register built-in commands: {}", e);
        }
        self.load_modules();
        self.register_help().await;

        tracing::info!("Bot started: @{}", self.bot.bot_info().username);
        loop {
            tokio::select! {
                biased;
                signal = control.recv() => match signal {
                    Some(ControlSignal::Stop) | None => break,
                },
                updates = self.bot.fetch_updates() => match updates {
                    Ok(updates) => {
                        for update in updates {
                            self.handle_update(update).await;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to fetch updates: {}", e);
                        tokio::time::sleep(FETCH_RETRY_DELAY).await;
                    }
                },
            }
        }

        self.shutdown();
        Ok(())
    }

    fn load_modules(&self) {
        let host = ModuleContext::new(Arc::clone(&self.router), Arc::clone(&self.config));
        match self.modules.load(&host) {
            Ok(count) => tracing::info!("{} modules loaded, {} commands registered", count, self.router.len()),
            Err(e) => tracing::error!("Module loading stopped: {}", e),
        }
    }

    async fn register_help(&self) {
        let entries = self.router.help_entries();
        if let Err(e) = self.bot.set_my_commands(&entries).await {
            tracing::warn!("Failed to register the command list: {}", e);
        }
    }

    /// Process one update; failures are logged
    pub async fn handle_update(&self, update: Update) {
        if let Err(e) = self.messages.process(self.bot.as_ref(), update).await {
            tracing::error!("Failed to process update: {}", e);
        }
    }

    /// Close every module; only the first call has an effect
    pub fn shutdown(&self) {
        if self.modules.is_closed() {
            return;
        }
        tracing::info!("Shutting down {}", self.config.name);
        self.modules.close_all();
    }
}
