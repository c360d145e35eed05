//! Console adapter for development/testing, and the host control reader

use async_trait::async_trait;
use std::io::{BufRead, Write};
use tokio::sync::{mpsc, Mutex};
use crate::domain::entities::{Chat, IncomingMessage, Update, User};
use crate::domain::traits::{Bot, BotInfo, HelpEntry, KeyboardButton};
use crate::application::errors::BotError;

pub const INVALID_OPTION: &str = "Invalid option.";

/// Signals sent from the console reader to the host loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Stop,
}

/// A console line, matched exactly and case-sensitively
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Stop,
    Ping,
    Unknown(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim_end_matches(&['\r', '\n'][..]) {
            "stop" => Self::Stop,
            "ping" => Self::Ping,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Executes host control commands read from the console
pub struct ConsoleManager {
    control: mpsc::UnboundedSender<ControlSignal>,
    // console transport input; unknown lines go here instead of being rejected
    forward: Option<mpsc::UnboundedSender<String>>,
}

impl ConsoleManager {
    pub fn new(control: mpsc::UnboundedSender<ControlSignal>) -> Self {
        Self { control, forward: None }
    }

    /// Forward non-control lines to a [`ConsoleAdapter`]
    pub fn with_forward(mut self, forward: mpsc::UnboundedSender<String>) -> Self {
        self.forward = Some(forward);
        self
    }

    /// Run one console line, writing any response to `out`
    pub fn execute<W: Write>(&self, line: &str, out: &mut W) -> std::io::Result<ConsoleCommand> {
        let command = ConsoleCommand::parse(line);
        // blank lines are skipped silently
        if line.trim().is_empty() {
            return Ok(command);
        }
        match &command {
            ConsoleCommand::Stop => {
                tracing::info!("Stop requested from console");
                if self.control.send(ControlSignal::Stop).is_err() {
                    tracing::warn!("Host loop is no longer running");
                }
            }
            ConsoleCommand::Ping => writeln!(out, "pong")?,
            ConsoleCommand::Unknown(text) => match &self.forward {
                Some(forward) => {
                    if forward.send(text.clone()).is_err() {
                        tracing::warn!("Console transport closed, dropping input");
                    }
                }
                None => writeln!(out, "{}", INVALID_OPTION)?,
            },
        }
        out.flush()?;
        Ok(command)
    }

    /// Read lines until `stop` or end of input
    pub fn run<R: BufRead, W: Write>(&self, input: R, out: &mut W) -> std::io::Result<()> {
        for line in input.lines() {
            if self.execute(&line?, out)? == ConsoleCommand::Stop {
                break;
            }
        }
        tracing::debug!("Console reader finished");
        Ok(())
    }

    /// Read stdin on a dedicated thread
    pub fn spawn_stdin(self) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            if let Err(e) = self.run(stdin.lock(), &mut stdout) {
                tracing::error!("Console reader failed: {}", e);
            }
        })
    }
}

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    user: User,
    lines: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl ConsoleAdapter {
    pub fn new(lines: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "zincite".to_string(),
                username: "console".to_string(),
            },
            user: User::new("console").with_username("console"),
            lines: Mutex::new(lines),
        }
    }

    fn to_message(&self, text: String) -> IncomingMessage {
        IncomingMessage::new(Chat::new("console"), self.user.clone(), text)
            .with_id(uuid::Uuid::new_v4().to_string())
            .with_platform("console")
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        Ok(())
    }

    async fn fetch_updates(&self) -> Result<Vec<Update>, BotError> {
        let mut lines = self.lines.lock().await;
        match lines.recv().await {
            Some(text) => Ok(vec![Update::Message(self.to_message(text))]),
            // input is gone; wait for the host to be stopped
            None => std::future::pending().await,
        }
    }

    async fn send_message(&self, _chat_id: &str, text: &str) -> Result<String, BotError> {
        println!("[BOT] {}", text);
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn send_with_keyboard(&self, _chat_id: &str, text: &str, buttons: Vec<Vec<KeyboardButton>>) -> Result<String, BotError> {
        println!("[BOT] {}", text);
        for row in buttons {
            let row_text: Vec<String> = row.iter().map(|b| b.text.clone()).collect();
            println!("  [Buttons] {}", row_text.join(" | "));
        }
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn answer_callback(&self, _callback_id: &str, _text: Option<&str>) -> Result<(), BotError> {
        Ok(())
    }

    async fn set_my_commands(&self, commands: &[HelpEntry]) -> Result<(), BotError> {
        tracing::debug!("Console bot has {} commands", commands.len());
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
