//! Argument type registry - Parsers from raw tokens to typed values
//!
//! Parsers are keyed by the declared value type of an argument, so every
//! argument declared as `i32` shares the same parser.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{NaiveDate, NaiveDateTime};

use crate::application::errors::{BoxError, CommandError};
use crate::domain::entities::{ArgumentSpec, ValueType};

type ParseFn = dyn Fn(&str) -> Result<Box<dyn Any + Send>, BoxError> + Send + Sync;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];
const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Registry of argument parsers
pub struct ArgumentTypes {
    parsers: RwLock<HashMap<TypeId, Arc<ParseFn>>>,
}

impl ArgumentTypes {
    /// Registry with the built-in parsers: `i32`, `i64`, `f64` and `String`
    pub fn new() -> Self {
        let types = Self::empty();
        types.register(|s: &str| s.parse::<i32>());
        types.register(|s: &str| s.parse::<i64>());
        types.register(|s: &str| s.parse::<f64>());
        types.register(|s: &str| Ok::<_, std::convert::Infallible>(s.to_string()));
        types
    }

    /// Registry without any parser
    pub fn empty() -> Self {
        Self {
            parsers: RwLock::new(HashMap::new()),
        }
    }

    /// Adds `NaiveDate` and `NaiveDateTime` parsers
    pub fn with_date_time(self) -> Self {
        self.register_date_time();
        self
    }

    pub fn register_date_time(&self) {
        self.register(|s: &str| parse_with_formats(s, &DATE_FORMATS, NaiveDate::parse_from_str));
        self.register(|s: &str| parse_with_formats(s, &DATE_TIME_FORMATS, NaiveDateTime::parse_from_str));
    }

    /// Register (or replace) the parser for `T`. Returns true when a parser was replaced.
    ///
    /// Replacement only affects parses made afterwards.
    pub fn register<T, E, F>(&self, parser: F) -> bool
    where
        T: Any + Send,
        E: Into<BoxError>,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        let erased: Arc<ParseFn> = Arc::new(move |token: &str| {
            parser(token)
                .map(|value| Box::new(value) as Box<dyn Any + Send>)
                .map_err(Into::into)
        });

        let replaced = self
            .parsers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), erased)
            .is_some();

        if replaced {
            tracing::debug!("Replaced argument parser for {}", std::any::type_name::<T>());
        }
        replaced
    }

    pub fn supports(&self, value_type: &ValueType) -> bool {
        self.parsers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&value_type.id())
    }

    /// Parse `token` as the declared type of `spec`
    pub fn parse(&self, spec: &ArgumentSpec, token: &str) -> Result<Box<dyn Any + Send>, CommandError> {
        // Clone the parser out so user code never runs under the lock
        let parser = self
            .parsers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&spec.value_type.id())
            .cloned()
            .ok_or(CommandError::UnknownType(spec.value_type.name()))?;

        parser(token).map_err(|source| CommandError::Parse {
            argument: spec.name.clone(),
            token: token.to_string(),
            source,
        })
    }
}

impl Default for ArgumentTypes {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_with_formats<T>(
    token: &str,
    formats: &[&str],
    parse: fn(&str, &str) -> chrono::ParseResult<T>,
) -> Result<T, BoxError> {
    let mut last_error = None;
    for format in formats {
        match parse(token, format) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }
    Err(match last_error {
        Some(e) => format!("expected one of {}: {}", formats.join(", "), e).into(),
        None => "no date format configured".into(),
    })
}
