//! Message parser - Splits message text into a command label and argument tokens

/// Routing view of a message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// First word, lower-cased, without a trailing `@botname`
    pub label: String,
    /// Whole trimmed text, lower-cased, for multi-word triggers
    pub phrase: String,
    /// Remaining whitespace-separated tokens
    pub args: Vec<String>,
}

/// Parses incoming texts into command lines
#[derive(Debug, Clone, Default)]
pub struct MessageParser {
    bot_username: Option<String>,
}

impl MessageParser {
    pub fn new(bot_username: Option<String>) -> Self {
        Self {
            bot_username: bot_username.map(|u| u.trim_start_matches('@').to_lowercase()),
        }
    }

    /// Returns `None` for texts without any word
    pub fn parse(&self, text: &str) -> Option<CommandLine> {
        let trimmed = text.trim();
        let mut parts = trimmed.split_whitespace();
        let first = parts.next()?;

        Some(CommandLine {
            label: self.strip_mention(&first.to_lowercase()).to_string(),
            phrase: trimmed.to_lowercase(),
            args: parts.map(|s| s.to_string()).collect(),
        })
    }

    fn strip_mention<'a>(&self, label: &'a str) -> &'a str {
        let Some(username) = &self.bot_username else {
            return label;
        };
        label
            .strip_suffix(username.as_str())
            .and_then(|rest| rest.strip_suffix('@'))
            .unwrap_or(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_label_and_args() {
        let parser = MessageParser::default();
        let line = parser.parse("  /Give   John 3 ").unwrap();
        assert_eq!(line.label, "/give");
        assert_eq!(line.args, vec!["John", "3"]);
        assert_eq!(line.phrase, "/give   john 3");
    }

    #[test]
    fn test_strips_own_mention_only() {
        let parser = MessageParser::new(Some("@Zincite_Bot".to_string()));
        assert_eq!(parser.parse("/help@ZINCITE_bot").unwrap().label, "/help");
        assert_eq!(parser.parse("/help@other_bot").unwrap().label, "/help@other_bot");
        assert_eq!(parser.parse("/help").unwrap().label, "/help");
    }

    #[test]
    fn test_empty_text() {
        assert!(MessageParser::default().parse("   ").is_none());
        assert!(MessageParser::default().parse("").is_none());
    }
}
