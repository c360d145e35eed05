//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Plugins: Bundle loading
//! - Adapters: Platform integrations (Telegram, console)

pub mod config;
pub mod plugins;
pub mod adapters;
