mod analyzer;
mod api;
mod cli;
mod config;
mod db;
mod record;
mod registry;
mod store;
mod tracker;
mod transfer;

use crate::analyzer::DerivedViews;
use crate::analyzer::calendar::{self, MonthGrid};
use crate::analyzer::estimate::preview_one_rm;
use crate::analyzer::progress::ProgressSeries;
use crate::cli::onboard::run_onboarding;
use crate::cli::{Cli, Commands, ConfigCommands, ExerciseCommands};
use crate::config::Config;
use crate::record::{FORM_DATE_FORMAT, LogForm};
use crate::registry::BUILTIN_EXERCISES;
use crate::store::{Session, Store};
use crate::tracker::Tracker;
use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard { anonymous } => {
            let _ = run_onboarding(anonymous)?;
            Ok(())
        }
        Commands::Config { command } => handle_config_command(command),
        Commands::Status => handle_status().await,
        Commands::Log {
            exercise,
            weight,
            reps,
            date,
        } => handle_log(exercise, weight, reps, date).await,
        Commands::Delete { id } => handle_delete(id).await,
        Commands::History { limit } => handle_history(limit).await,
        Commands::Calendar { month } => handle_calendar(month).await,
        Commands::Progress { exercise } => handle_progress(exercise).await,
        Commands::Estimate { weight, reps } => {
            println!("{}", preview_one_rm(&weight, &reps));
            Ok(())
        }
        Commands::Exercise { command } => handle_exercise_command(command).await,
        Commands::Export { out } => handle_export(out).await,
        Commands::Import { file } => handle_import(file).await,
        Commands::Serve => {
            let config = load_config()?;
            run_service(config).await
        }
    }
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_or_default_config()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

async fn handle_status() -> Result<()> {
    let config = load_config()?;
    let tracker = open_tracker(&config).await?;
    let views = tracker.views();

    println!("LiftLog status");
    match tracker.store().session() {
        Some(session) if session.anonymous => {
            println!("- session: {} (anonymous)", session.user_id)
        }
        Some(session) => println!("- session: {}", session.user_id),
        None => println!("- session: none (run `LiftLog onboard`)"),
    }
    println!("- db_path: {}", config.db_path.display());
    println!("- total_sets: {}", views.summary.total_sets);
    println!("- training_days: {}", views.summary.training_days);
    println!(
        "- last_training_day: {}",
        views
            .summary
            .last_training_day
            .map(|day| day.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    println!(
        "- last_written_at: {}",
        tracker
            .store()
            .latest_write_timestamp()
            .await?
            .map(|timestamp| timestamp.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    views
        .summary
        .best_one_rm
        .iter()
        .for_each(|(exercise, one_rm)| println!("- best 1RM {exercise}: {one_rm} kg"));

    tracker.store().close().await;
    Ok(())
}

async fn handle_log(
    exercise: String,
    weight: String,
    reps: String,
    date: Option<String>,
) -> Result<()> {
    let config = load_config()?;
    let tracker = open_tracker(&config).await?;

    let form = LogForm {
        date: date.unwrap_or_else(|| Local::now().date_naive().format(FORM_DATE_FORMAT).to_string()),
        exercise,
        weight,
        reps,
    };

    if !tracker.registry().contains(&form.exercise) {
        warn!(exercise = %form.exercise, "exercise is not registered; add it with `LiftLog exercise add`");
    }

    match tracker.save_log(&form).await {
        Some(id) => println!(
            "Recorded #{id}: {} {} kg x {} (estimated 1RM {} kg)",
            form.exercise,
            form.weight,
            form.reps,
            preview_one_rm(&form.weight, &form.reps)
        ),
        None => println!("Nothing recorded"),
    }

    tracker.store().close().await;
    Ok(())
}

async fn handle_delete(id: i64) -> Result<()> {
    let config = load_config()?;
    let tracker = open_tracker(&config).await?;

    if tracker.delete_log(id).await {
        println!("Deleted #{id}");
    } else {
        println!("Nothing deleted");
    }

    tracker.store().close().await;
    Ok(())
}

async fn handle_history(limit: Option<usize>) -> Result<()> {
    let config = load_config()?;
    let tracker = open_tracker(&config).await?;
    let views = tracker.views();

    if views.history.is_empty() {
        println!("No records yet");
    }

    views
        .history
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .for_each(|group| {
            println!("{}", group.label);
            group.records.iter().for_each(|record| {
                println!(
                    "  #{:<5} {} {} kg x {} (1RM {} kg)",
                    record.id, record.exercise, record.weight, record.reps, record.one_rm
                );
            });
        });

    tracker.store().close().await;
    Ok(())
}

async fn handle_calendar(month: Option<String>) -> Result<()> {
    let config = load_config()?;
    let (year, month) = match month {
        Some(raw) => calendar::parse_month(&raw)?,
        None => {
            let today = Local::now().date_naive();
            (today.year(), today.month())
        }
    };

    let tracker = open_tracker(&config).await?;
    let views = tracker.views();
    let grid = calendar::month_grid(year, month, &views.training_days)?;

    print!("{}", render_month(&grid));
    if views.training_days.is_empty() {
        println!("No training days recorded yet");
    }
    tracker.store().close().await;
    Ok(())
}

async fn handle_progress(exercise: Option<String>) -> Result<()> {
    let config = load_config()?;
    let exercise = exercise
        .or_else(|| config.default_exercise.clone())
        .unwrap_or_else(|| BUILTIN_EXERCISES[0].to_string());

    let tracker = open_tracker(&config).await?;
    let views: DerivedViews = tracker.views();

    match views.progress_for(&exercise) {
        ProgressSeries::InsufficientData { exercise, points } => {
            println!("{exercise}: not enough data for a trend ({points} training day(s), need 2)");
        }
        ProgressSeries::Trend {
            exercise,
            points,
            best,
            gain,
        } => {
            println!("{exercise}: best {best} kg, {gain:+} kg since first session");
            let scale = best.max(1.0);
            points.iter().for_each(|point| {
                let width = ((point.one_rm / scale) * 40.0).round() as usize;
                println!("  {} {:>6} {}", point.label, point.one_rm, "█".repeat(width));
            });
        }
    }

    tracker.store().close().await;
    Ok(())
}

async fn handle_exercise_command(command: ExerciseCommands) -> Result<()> {
    let config = load_config()?;
    let tracker = open_tracker(&config).await?;

    match command {
        ExerciseCommands::Add { name } => {
            if tracker.add_exercise(&name).await {
                println!("Added exercise: {name}");
            } else {
                println!("Exercise not added (empty or already registered): {name}");
            }
        }
        ExerciseCommands::List => {
            let registry = tracker.registry();
            registry.names().iter().for_each(|name| {
                let marker = if registry.custom().contains(name) {
                    " (custom)"
                } else {
                    ""
                };
                println!("{name}{marker}");
            });
        }
    }

    tracker.store().close().await;
    Ok(())
}

async fn handle_export(out: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let tracker = open_tracker(&config).await?;

    let content = tracker.export_csv()?;
    let path = out.unwrap_or_else(|| {
        config
            .export_dir
            .join(transfer::export_file_name(Local::now().date_naive()))
    });
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create export directory: {}", parent.display()))?;
    }
    fs::write(&path, content)
        .with_context(|| format!("Failed to write CSV export: {}", path.display()))?;

    println!("Exported: {}", path.display());
    tracker.store().close().await;
    Ok(())
}

async fn handle_import(file: PathBuf) -> Result<()> {
    let config = load_config()?;
    let text = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read CSV file: {}", file.display()))?;

    let tracker = open_tracker(&config).await?;
    let summary = tracker.import_csv(&text).await?;

    println!(
        "Import finished: {} succeeded, {} failed",
        summary.success, summary.error
    );
    tracker.store().close().await;
    Ok(())
}

async fn run_service(config: Config) -> Result<()> {
    config.ensure_bootstrap_files()?;

    let shared_config = Arc::new(config);
    let tracker = open_tracker(&shared_config).await?;
    let api_tracker = tracker.clone();
    let api_config = Arc::clone(&shared_config);

    info!("LiftLog service started");

    tokio::select! {
        api_result = api::run_server(api_config, api_tracker) => {
            api_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    tracker.store().close().await;
    Ok(())
}

async fn open_tracker(config: &Config) -> Result<Tracker> {
    let store = Store::connect(&config.db_path, Session::from_config(config)).await?;
    Ok(Tracker::new(Arc::new(store)))
}

fn render_month(grid: &MonthGrid) -> String {
    let header = format!(
        "{} ({} training day(s))\n Su Mo Tu We Th Fr Sa\n",
        grid.label, grid.trained_days
    );

    let rows = grid
        .weeks
        .iter()
        .map(|week| {
            week.iter()
                .map(|cell| match cell {
                    Some(cell) if cell.trained => format!("{:>2}*", cell.day.day()),
                    Some(cell) => format!("{:>2} ", cell.day.day()),
                    None => "   ".to_string(),
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{header}{rows}\n")
}

fn load_or_default_config() -> Result<Config> {
    Config::load().or_else(|_| {
        let config = Config::default();
        config.ensure_bootstrap_files()?;
        config.save()?;
        Ok(config)
    })
}

fn load_config() -> Result<Config> {
    Config::load()
        .with_context(|| "Config file not found. Run `LiftLog onboard` first.".to_string())
}
