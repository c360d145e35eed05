use std::any::TypeId;
use std::collections::HashSet;

use crate::application::errors::CommandError;

/// Declared value type of an argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
}

impl ValueType {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Human label shown in usage strings
    pub fn label(&self) -> String {
        if self.is::<String>() {
            "Text".to_string()
        } else if self.is::<i32>() || self.is::<i64>() {
            "Number".to_string()
        } else if self.is::<f64>() {
            "Decimal number".to_string()
        } else if self.is::<chrono::NaiveDate>() {
            "Date".to_string()
        } else if self.is::<chrono::NaiveDateTime>() {
            "Date and time".to_string()
        } else {
            self.name.rsplit("::").next().unwrap_or(self.name).to_string()
        }
    }
}

/// One positional argument of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    pub name: String,
    pub value_type: ValueType,
    pub required: bool,
    pub description: String,
}

impl ArgumentSpec {
    pub fn required<T: 'static>(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: ValueType::of::<T>(),
            required: true,
            description: description.into(),
        }
    }

    pub fn optional<T: 'static>(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required::<T>(name, description)
        }
    }

    fn brackets(&self, escape: bool) -> (&'static str, &'static str) {
        match (self.required, escape) {
            (true, true) => ("&lt;", "&gt;"),
            (true, false) => ("<", ">"),
            (false, _) => ("[", "]"),
        }
    }
}

/// Static metadata for one invocable command. The first alias is the canonical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    aliases: Vec<String>,
    arguments: Vec<ArgumentSpec>,
    description: String,
    hidden: bool,
    module: Option<String>,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            aliases: vec![name.into()],
            arguments: Vec::new(),
            description: String::new(),
            hidden: false,
            module: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Keep the command out of the published help list
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.aliases[0]
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    /// Position and spec of a declared argument
    pub fn argument(&self, name: &str) -> Option<(usize, &ArgumentSpec)> {
        self.arguments
            .iter()
            .enumerate()
            .find(|(_, spec)| spec.name == name)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn matches(&self, input: &str) -> bool {
        let input_lower = input.to_lowercase();
        self.aliases.iter().any(|a| a.to_lowercase() == input_lower)
    }

    /// Rejects argument lists that reuse a name
    pub fn validate(&self) -> Result<(), CommandError> {
        let mut seen = HashSet::new();
        for spec in &self.arguments {
            if !seen.insert(spec.name.as_str()) {
                return Err(CommandError::DuplicateArgument {
                    command: self.name().to_string(),
                    argument: spec.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// HTML usage text: a signature line, then one line per argument
    pub fn usage(&self) -> String {
        let mut usage = format!("<code>{}", self.name());
        for spec in &self.arguments {
            let (open, close) = spec.brackets(true);
            usage.push_str(&format!(" {}{}{}", open, spec.name, close));
        }
        usage.push_str(&format!("</code>: {}", self.description));

        for spec in &self.arguments {
            let (open, close) = spec.brackets(true);
            let optional = if spec.required { "" } else { ", optional" };
            usage.push_str(&format!(
                "\n <b>·</b> {}{}{} (<i>{}</i>{}): {}",
                open,
                spec.name,
                close,
                spec.value_type.label(),
                optional,
                spec.description
            ));
        }
        usage
    }

    /// Plain signature without markup, e.g. `/give <nombre> [cantidad]`
    pub fn signature(&self) -> String {
        let mut signature = self.name().to_string();
        for spec in &self.arguments {
            let (open, close) = spec.brackets(false);
            signature.push_str(&format!(" {}{}{}", open, spec.name, close));
        }
        signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_arguments() -> CommandDescriptor {
        CommandDescriptor::new("/commandWithArgs")
            .with_description("summary of the command with arguments")
            .with_argument(ArgumentSpec::required::<String>("nombre", "User name"))
            .with_argument(ArgumentSpec::optional::<i32>("cantidad", "Amount to assign"))
    }

    #[test]
    fn test_name_is_first_alias() {
        let cmd = CommandDescriptor::new("/comando")
            .with_aliases(["/alias", "/alternativa"])
            .with_description("test description");

        assert_eq!(cmd.name(), "/comando");
        assert_eq!(cmd.aliases(), ["/comando", "/alias", "/alternativa"]);
        assert_eq!(cmd.aliases()[0], cmd.name());
        assert_eq!(cmd.description(), "test description");
        assert!(!cmd.is_hidden());
        assert!(cmd.module().is_none());
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let cmd = CommandDescriptor::new("/Foo").with_alias("/bar");
        assert!(cmd.matches("/foo"));
        assert!(cmd.matches("/FOO"));
        assert!(cmd.matches("/BAR"));
        assert!(!cmd.matches("/baz"));
    }

    #[test]
    fn test_usage_rendering() {
        let expected = "<code>/commandWithArgs &lt;nombre&gt; [cantidad]</code>: summary of the command with arguments\n \
                        <b>·</b> &lt;nombre&gt; (<i>Text</i>): User name\n \
                        <b>·</b> [cantidad] (<i>Number</i>, optional): Amount to assign";
        assert_eq!(with_arguments().usage(), expected);
    }

    #[test]
    fn test_signature() {
        assert_eq!(with_arguments().signature(), "/commandWithArgs <nombre> [cantidad]");
    }

    #[test]
    fn test_argument_lookup_reports_position() {
        let cmd = with_arguments();
        let (index, spec) = cmd.argument("cantidad").expect("declared");
        assert_eq!(index, 1);
        assert!(!spec.required);
        assert!(spec.value_type.is::<i32>());
        assert!(cmd.argument("missing").is_none());
    }

    #[test]
    fn test_duplicate_argument_names_rejected() {
        let cmd = CommandDescriptor::new("/dup")
            .with_argument(ArgumentSpec::required::<String>("x", ""))
            .with_argument(ArgumentSpec::optional::<i64>("x", ""));

        match cmd.validate() {
            Err(CommandError::DuplicateArgument { argument, .. }) => assert_eq!(argument, "x"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(with_arguments().validate().is_ok());
    }

    #[test]
    fn test_value_type_labels() {
        assert_eq!(ValueType::of::<f64>().label(), "Decimal number");
        assert_eq!(ValueType::of::<i64>().label(), "Number");
        assert_eq!(ValueType::of::<chrono::NaiveDate>().label(), "Date");
        assert_eq!(ValueType::of::<std::net::IpAddr>().label(), "IpAddr");
    }
}
