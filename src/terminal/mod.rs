//! Admin terminal: a fixed registry of named commands.

pub mod commands;

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::CommandError;

/// Paths the commands are allowed to look at
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub plans_dir: PathBuf,
    pub log_file: PathBuf,
}

pub trait TerminalCommand: Send + Sync {
    fn name(&self) -> &'static str;
    fn summary(&self) -> &'static str;
    fn run(&self, args: &[&str], ctx: &CommandContext) -> Result<Vec<String>, CommandError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Info,
    Error,
}

/// Response body of `/api/terminal`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub success: bool,
    pub output: Vec<String>,
    #[serde(rename = "type")]
    pub kind: OutputKind,
}

impl CommandOutput {
    pub fn info(output: Vec<String>) -> Self {
        CommandOutput { success: true, output, kind: OutputKind::Info }
    }

    pub fn error(message: impl Into<String>) -> Self {
        CommandOutput {
            success: false,
            output: vec![message.into()],
            kind: OutputKind::Error,
        }
    }
}

pub struct CommandRegistry {
    commands: IndexMap<&'static str, Box<dyn TerminalCommand>>,
    context: CommandContext,
}

impl CommandRegistry {
    pub fn new(context: CommandContext) -> Self {
        CommandRegistry {
            commands: IndexMap::new(),
            context,
        }
    }

    /// Registry with every built-in command
    pub fn with_defaults(context: CommandContext) -> Self {
        let mut registry = Self::new(context);
        registry.register(Box::new(commands::Info));
        registry.register(Box::new(commands::ShowLogs));
        registry.register(Box::new(commands::ReloadPlans));
        registry
    }

    pub fn register(&mut self, command: Box<dyn TerminalCommand>) {
        self.commands.insert(command.name(), command);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.commands.keys().copied().collect()
    }

    /// Runs one line of terminal input. The first word (case-insensitive)
    /// picks the command, the rest are its arguments.
    pub fn run(&self, input: &str) -> CommandOutput {
        let mut words = input.split_whitespace();
        let Some(first) = words.next() else {
            return CommandOutput::error("Brak polecenia.");
        };
        let name = first.to_lowercase();
        let args: Vec<&str> = words.collect();

        if name == "help" {
            return CommandOutput::info(self.help());
        }

        let Some(command) = self.commands.get(name.as_str()) else {
            warn!(command = %name, "unknown terminal command");
            return CommandOutput::error(format!("❌ Nieznane polecenie: {}", name));
        };

        info!(command = %name, ?args, "running terminal command");
        match command.run(&args, &self.context) {
            Ok(output) => CommandOutput::info(output),
            Err(e) => CommandOutput::error(e.to_string()),
        }
    }

    fn help(&self) -> Vec<String> {
        let mut lines = vec!["Dostępne polecenia:".to_string()];
        for command in self.commands.values() {
            lines.push(format!("  {:<14} {}", command.name(), command.summary()));
        }
        lines
    }
}
