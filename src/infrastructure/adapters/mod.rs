//! Platform adapters

pub mod console;
pub mod telegram;

pub use console::{ConsoleAdapter, ConsoleCommand, ConsoleManager, ControlSignal};
pub use telegram::TelegramAdapter;
