//! Application services - Business logic orchestration

pub mod command_service;
pub mod message_service;

pub use command_service::{CommandService, COMMAND_FAILED};
pub use message_service::MessageService;
