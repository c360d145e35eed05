//! Domain entities - Core business objects

pub mod user;
pub mod message;
pub mod command;

pub use user::{Chat, User};
pub use message::{CallbackEvent, IncomingMessage, Update, CALLBACK_TAG_SEPARATOR};
pub use command::{ArgumentSpec, CommandDescriptor, ValueType};
