//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Update routing and command execution
//! - Errors: Domain-specific errors
//! - Messaging: Message parsing, typed arguments, dispatching

pub mod errors;
pub mod services;
pub mod messaging;
