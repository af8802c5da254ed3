use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use school_panel::config::{Cli, Command, ExportArgs, GenerateArgs, GeneratePlansArgs};
use school_panel::display::{print_plans, print_substitutions};
use school_panel::export::export_substitutions_to_csv;
use school_panel::schedule::{generate_all_plans, generate_substitutions, ClassName};
use school_panel::store::{JsonStore, SUBSTITUTIONS_FILE};
use school_panel::web;

const DEFAULT_FILTER: &str = "school_panel=info,actix_web=info";

/// Stdout logging, plus a plain-text copy in `log_file` when given
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}

fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let store = JsonStore::new(&args.data.data_dir);
    let teachers = store.teachers();
    let plans = store.load_all_timetables();
    info!(teachers = teachers.len(), classes = plans.len(), "generating substitutions");

    let by_day = generate_substitutions(&teachers, &plans);
    print_substitutions(&by_day);

    if args.dry_run {
        return Ok(());
    }
    let path = store.write_json(SUBSTITUTIONS_FILE, &by_day)?;
    println!("\nZapisano: {}", path.display());
    Ok(())
}

fn generate_plans(args: GeneratePlansArgs) -> anyhow::Result<()> {
    let store = JsonStore::new(&args.data.data_dir);
    let inputs = store.plan_inputs();
    info!(
        classes = inputs.classes.len(),
        subjects = inputs.subjects.len(),
        seed = ?args.seed,
        "generating timetables"
    );

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let plans = generate_all_plans(&inputs, &mut rng);
    print_plans(&plans);

    if args.dry_run {
        return Ok(());
    }
    for (class, plan) in &plans {
        match store.write_timetable(&ClassName::new(class), plan) {
            Ok(path) => println!("Zapisano: {}", path.display()),
            Err(e) => warn!(%class, error = %e, "timetable not written"),
        }
    }
    Ok(())
}

fn export(args: ExportArgs) -> anyhow::Result<()> {
    let store = JsonStore::new(&args.data.data_dir);
    let records = store.substitutions_for_day(&args.day)?;
    let written = export_substitutions_to_csv(&records, &args.output)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    println!("Zapisano {} zastępstw do {}", written, args.output.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(args) => {
            init_tracing(Some(args.log_file.as_path()))?;
            println!("Panel available at http://localhost:{}", args.port);
            web::start_server(args).await?;
        }
        Command::Generate(args) => {
            init_tracing(None)?;
            generate(args)?;
        }
        Command::GeneratePlans(args) => {
            init_tracing(None)?;
            generate_plans(args)?;
        }
        Command::Export(args) => {
            init_tracing(None)?;
            export(args)?;
        }
    }

    Ok(())
}
