//! Domain layer - Core business objects
//! 
//! This layer contains:
//! - Entities: Users, chats, incoming updates and command descriptors
//! - Traits: Abstractions for infrastructure (Bot)

pub mod entities;
pub mod traits;
