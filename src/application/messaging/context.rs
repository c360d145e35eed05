//! Command context - Typed access to the arguments of one invocation

use std::sync::Arc;

use crate::application::errors::CommandError;
use crate::domain::entities::{ArgumentSpec, CommandDescriptor};
use super::args::ArgumentTypes;

/// Arguments of one command invocation.
///
/// Token `i` belongs to argument spec `i`. Values are parsed on every `get`,
/// and missing tokens come back as `None` whether or not the argument is
/// required: handlers check presence themselves.
pub struct CommandContext {
    descriptor: Arc<CommandDescriptor>,
    tokens: Vec<String>,
    types: Arc<ArgumentTypes>,
}

impl CommandContext {
    pub fn new(descriptor: Arc<CommandDescriptor>, tokens: Vec<String>, types: Arc<ArgumentTypes>) -> Self {
        Self {
            descriptor,
            tokens,
            types,
        }
    }

    /// Typed value of argument `name`
    ///
    /// * `Err(ArgumentNotDeclared)` - the descriptor has no such argument
    /// * `Ok(None)` - no token at the argument's position
    /// * `Err(Parse)` - the token could not be converted
    pub fn get<T: 'static>(&self, name: &str) -> Result<Option<T>, CommandError> {
        let (index, spec) = self.spec(name)?;

        if !spec.value_type.is::<T>() {
            return Err(CommandError::TypeMismatch {
                argument: spec.name.clone(),
                declared: spec.value_type.name(),
                requested: std::any::type_name::<T>(),
            });
        }

        let Some(token) = self.tokens.get(index) else {
            return Ok(None);
        };

        let value = self.types.parse(spec, token)?;
        value
            .downcast::<T>()
            .map(|value| Some(*value))
            .map_err(|_| CommandError::TypeMismatch {
                argument: spec.name.clone(),
                declared: spec.value_type.name(),
                requested: std::any::type_name::<T>(),
            })
    }

    /// Like `get`, but a missing token is an `InvalidArgs` error naming the usage
    pub fn require<T: 'static>(&self, name: &str) -> Result<T, CommandError> {
        self.get(name)?.ok_or_else(|| {
            CommandError::InvalidArgs(format!("missing <{}>, usage: {}", name, self.descriptor.signature()))
        })
    }

    /// Raw token at the position of argument `name`
    pub fn raw(&self, name: &str) -> Result<Option<&str>, CommandError> {
        let (index, _) = self.spec(name)?;
        Ok(self.tokens.get(index).map(String::as_str))
    }

    /// All tokens after the command label, including ones beyond the declared arguments
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Tokens from the position of `name` to the end, joined by single spaces
    pub fn rest(&self, name: &str) -> Result<Option<String>, CommandError> {
        let (index, _) = self.spec(name)?;
        if index >= self.tokens.len() {
            return Ok(None);
        }
        Ok(Some(self.tokens[index..].join(" ")))
    }

    pub fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn spec(&self, name: &str) -> Result<(usize, &ArgumentSpec), CommandError> {
        self.descriptor.argument(name).ok_or_else(|| {
            tracing::error!(
                command = %self.descriptor.name(),
                argument = %name,
                "Handler requested an undeclared argument"
            );
            CommandError::ArgumentNotDeclared {
                argument: name.to_string(),
                command: self.descriptor.name().to_string(),
            }
        })
    }
}
