//! Application layer errors

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error used at plugin and parser boundaries
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Module error: {0}")]
    Module(#[from] ModuleError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Command resolution, argument and execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    /// A token was supplied but could not be converted to the declared type
    #[error("Invalid value '{token}' for argument '{argument}': {source}")]
    Parse {
        argument: String,
        token: String,
        #[source]
        source: BoxError,
    },

    /// The handler asked for an argument its descriptor never declared
    #[error("Argument '{argument}' is not declared by command {command}")]
    ArgumentNotDeclared { argument: String, command: String },

    #[error("Argument '{argument}' is declared as {declared}, requested as {requested}")]
    TypeMismatch {
        argument: String,
        declared: &'static str,
        requested: &'static str,
    },

    #[error("No parser registered for type {0}")]
    UnknownType(&'static str),

    #[error("Command {command} declares argument '{argument}' twice")]
    DuplicateArgument { command: String, argument: String },

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Permission denied")]
    PermissionDenied,
}

impl CommandError {
    /// Whether the error comes from a malformed user-supplied token
    pub fn is_parse_error(&self) -> bool {
        matches!(self, CommandError::Parse { .. })
    }
}

/// Module discovery and lifecycle errors
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Failed to load module bundle {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("Module bundle {} targets API v{found}, host expects v{expected}", path.display())]
    AbiMismatch {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    #[error("Module entry point of {} failed: {source}", path.display())]
    Entry {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_mentions_token() {
        let source: BoxError = "invalid digit found in string".into();
        let err = CommandError::Parse {
            argument: "cantidad".to_string(),
            token: "abc".to_string(),
            source,
        };

        assert!(err.is_parse_error());
        assert!(err.to_string().contains("'abc'"));
        assert!(err.to_string().contains("cantidad"));
    }

    #[test]
    fn test_module_error_converts_into_bot_error() {
        let err: BotError = ModuleError::Load {
            path: PathBuf::from("modules/broken.so"),
            reason: "bad ELF header".to_string(),
        }
        .into();

        assert!(matches!(err, BotError::Module(_)));
        assert!(err.to_string().contains("broken.so"));
    }
}
