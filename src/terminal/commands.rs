use std::fs;

use chrono::Local;

use super::{CommandContext, TerminalCommand};
use crate::error::CommandError;

/// Lines `show-logs` prints from the end of the log
const LOG_TAIL: usize = 15;

pub struct Info;

impl TerminalCommand for Info {
    fn name(&self) -> &'static str {
        "info"
    }

    fn summary(&self) -> &'static str {
        "informacje o systemie"
    }

    fn run(&self, _args: &[&str], _ctx: &CommandContext) -> Result<Vec<String>, CommandError> {
        let cwd = std::env::current_dir()?;
        Ok(vec![
            "🧠 Terminal Zastępstwa".to_string(),
            format!("💻 System: {} {}", std::env::consts::OS, std::env::consts::ARCH),
            format!("📁 Katalog: {}", cwd.display()),
            format!("📅 Czas: {}", Local::now().format("%d.%m.%Y, %H:%M:%S")),
        ])
    }
}

pub struct ShowLogs;

impl TerminalCommand for ShowLogs {
    fn name(&self) -> &'static str {
        "show-logs"
    }

    fn summary(&self) -> &'static str {
        "ostatnie wpisy dziennika"
    }

    fn run(&self, _args: &[&str], ctx: &CommandContext) -> Result<Vec<String>, CommandError> {
        if !ctx.log_file.exists() {
            return Ok(vec!["⚠️ Brak pliku logów.".to_string()]);
        }

        let contents = fs::read_to_string(&ctx.log_file)?;
        let lines: Vec<&str> = contents.trim().lines().collect();
        let start = lines.len().saturating_sub(LOG_TAIL);
        Ok(lines[start..].iter().map(|line| line.to_string()).collect())
    }
}

pub struct ReloadPlans;

impl TerminalCommand for ReloadPlans {
    fn name(&self) -> &'static str {
        "reload-plans"
    }

    fn summary(&self) -> &'static str {
        "liczba wczytanych planów lekcji"
    }

    fn run(&self, _args: &[&str], ctx: &CommandContext) -> Result<Vec<String>, CommandError> {
        if !ctx.plans_dir.is_dir() {
            return Ok(vec!["⚠️ Katalog 'plany/' nie istnieje.".to_string()]);
        }

        let count = fs::read_dir(&ctx.plans_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
            .count();
        Ok(vec![format!("🔄 Załadowano ponownie {} planów lekcji.", count)])
    }
}
