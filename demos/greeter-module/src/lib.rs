//! Example module bundle: a greeter and a small calendar helper
//!
//! Build with `cargo build --release` and copy the resulting shared library
//! into the host's modules directory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use zincite::application::errors::{BoxError, CommandError};
use zincite::application::messaging::{CallbackListener, CallbackResult, CallbackTable, FnCommand};
use zincite::domain::entities::{ArgumentSpec, CallbackEvent, Chat, CommandDescriptor, User};
use zincite::modules::{Module, ModuleContext};

#[derive(Default)]
pub struct GreeterModule {
    greeted: Arc<AtomicUsize>,
}

impl Module for GreeterModule {
    fn name(&self) -> &str {
        "Greeter"
    }

    fn description(&self) -> &str {
        "Says hello"
    }

    fn on_load(&self, host: &ModuleContext) -> Result<(), BoxError> {
        let greeted = Arc::clone(&self.greeted);
        let hello = CommandDescriptor::new("/hello")
            .with_alias("/hi")
            .with_description("Greet someone")
            .with_argument(ArgumentSpec::required::<String>("name", "Who to greet"))
            .with_argument(ArgumentSpec::optional::<i32>("times", "How many times"))
            .with_module(self.name());
        host.register_command(Arc::new(FnCommand::new(hello, move |_, ctx| {
            let name = ctx.require::<String>("name")?;
            let times = ctx.get::<i32>("times")?.unwrap_or(1).clamp(1, 5);
            greeted.fetch_add(1, Ordering::Relaxed);
            let greeting = vec![format!("Hello, {}!", name); times as usize];
            Ok(Some(greeting.join("\n")))
        })))?;

        let morning = CommandDescriptor::new("good morning")
            .with_description("Morning greeting")
            .with_module(self.name());
        host.register_command(Arc::new(FnCommand::new(morning, |message, _| {
            Ok(Some(format!("Good morning, {}!", message.from.display_name())))
        })))?;

        host.register_callback_listener(Arc::new(WaveListener));
        Ok(())
    }

    fn on_new_chat_members(&self, chat: &Chat, members: &[User]) {
        for member in members {
            tracing::info!("{} joined {}", member.display_name(), chat.id);
        }
    }

    fn on_close(&self) {
        tracing::info!("Greeter said hello {} times", self.greeted.load(Ordering::Relaxed));
    }
}

struct WaveListener;

impl WaveListener {
    fn wave(&self, event: &CallbackEvent) -> CallbackResult {
        Ok(Some(format!("{} waves back", event.from.display_name())))
    }
}

impl CallbackListener for WaveListener {
    fn callback_table(&self) -> CallbackTable<Self> {
        CallbackTable::new().on("wave", WaveListener::wave)
    }
}

#[derive(Default)]
pub struct CalendarModule;

impl Module for CalendarModule {
    fn name(&self) -> &str {
        "Calendar"
    }

    fn on_load(&self, host: &ModuleContext) -> Result<(), BoxError> {
        host.argument_types().register_date_time();

        let until = CommandDescriptor::new("/daysuntil")
            .with_description("Days left until a date")
            .with_argument(ArgumentSpec::required::<NaiveDate>("date", "Target date"))
            .with_module(self.name());
        host.register_command(Arc::new(FnCommand::new(until, |_, ctx| {
            let date = ctx.require::<NaiveDate>("date")?;
            let today = Utc::now().date_naive();
            let days = (date - today).num_days();
            if days < 0 {
                return Err(CommandError::InvalidArgs(format!("{} is in the past", date)));
            }
            Ok(Some(format!("{} days until {}", days, date)))
        })))?;
        Ok(())
    }
}

zincite::export_modules!(GreeterModule::default(), CalendarModule);
