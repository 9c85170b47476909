//! timecard library root.
//! Time-tracking, activity-audit and payment core for a task-management
//! workspace: timer state machine, timesheet reconciler, append-only audit
//! trail, activity feed rendering and payment aggregation over SQLite.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod export;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher.
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => commands::handle_init(cli),
        Commands::Seed => commands::handle_seed(cli, cfg),
        Commands::Timer {
            task_id,
            user_id,
            billable,
            rate,
            system_stop,
        } => commands::handle_timer(cli, cfg, *task_id, *user_id, *billable, *rate, *system_stop),
        Commands::Timers { task_id, file, json } => {
            commands::handle_timers(cli, cfg, *task_id, file, json)
        }
        Commands::Members { task_id, remove, set } => {
            commands::handle_members(cli, cfg, *task_id, remove, set)
        }
        Commands::Activities { container_id, page } => {
            commands::handle_activities(cli, cfg, *container_id, *page)
        }
        Commands::Payments {
            container_id,
            user_id,
            range,
            status,
        } => commands::handle_payments(cli, cfg, *container_id, *user_id, range, status),
        Commands::Pay {
            container_id,
            user_id,
            range,
        } => commands::handle_pay(cli, cfg, *container_id, *user_id, range),
        Commands::Log { task } => commands::handle_log(cli, cfg, task),
        Commands::Export {
            container_id,
            user_id,
            format,
            file,
            range,
            status,
            force,
        } => commands::handle_export(
            cli,
            cfg,
            *container_id,
            *user_id,
            format,
            file,
            range,
            status,
            *force,
        ),
    }
}

/// Entry point used by main.rs.
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load();
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    dispatch(&cli, &cfg)
}
