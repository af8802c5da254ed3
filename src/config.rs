use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "school-panel",
    version,
    about = "Panel szkolny: zastępstwa, plany lekcji, nauczyciele",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Server options used when no subcommand is given
    #[command(flatten)]
    pub serve: ServeArgs,
}

impl Cli {
    /// The chosen subcommand; `serve` when none was given
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server (default)
    Serve(ServeArgs),
    /// Generate zastepstwa.json from absent teachers and class timetables
    Generate(GenerateArgs),
    /// Generate random class timetables into plany/
    GeneratePlans(GeneratePlansArgs),
    /// Write one day's substitutions as CSV
    Export(ExportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct DataArgs {
    /// Directory with the school's JSON files
    #[arg(long, env = "SCHOOL_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Directory holding settings.json
    #[arg(long, env = "SCHOOL_CONFIG_DIR", default_value = "config")]
    pub config_dir: PathBuf,

    /// Served under /static
    #[arg(long, default_value = "public")]
    pub static_dir: PathBuf,

    /// Plain-text log read back by the `show-logs` terminal command
    #[arg(long, default_value = "logs/system.log")]
    pub log_file: PathBuf,

    /// Password unlocking the admin terminal; the terminal is disabled without it
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Discord webhook receiving HTTP 500 reports
    #[arg(long, env = "DISCORD_WEBHOOK", hide_env_values = true)]
    pub discord_webhook: Option<String>,

    /// Secret for signing session cookies; random per start when unset
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,
}

impl Default for ServeArgs {
    fn default() -> Self {
        ServeArgs {
            data: DataArgs {
                data_dir: PathBuf::from("data"),
            },
            host: "0.0.0.0".to_string(),
            port: 3001,
            config_dir: PathBuf::from("config"),
            static_dir: PathBuf::from("public"),
            log_file: PathBuf::from("logs/system.log"),
            admin_password: None,
            discord_webhook: None,
            session_secret: None,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Only print the result
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct GeneratePlansArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Seed for a reproducible draw
    #[arg(long)]
    pub seed: Option<u64>,

    /// Only print the result
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Day file name (e.g. 2025-11-12) or weekday key of zastepstwa.json
    pub day: String,

    /// Output CSV path
    #[arg(short, long, default_value = "zastepstwa.csv")]
    pub output: PathBuf,
}
