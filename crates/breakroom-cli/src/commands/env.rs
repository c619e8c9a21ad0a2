//! Observed-system-state feed.
//!
//! The core has no platform probes of its own; whatever watches the
//! desktop (a shell script on a D-Bus signal, a tray frontend, a cron
//! sampling xprintidle) reports changes through these commands.

use clap::Subcommand;

use breakroom_core::storage::Database;
use breakroom_core::{parse_duration_ms, Status};
use chrono::Utc;

use super::{load_planner, publish_events, save_planner};

#[derive(Subcommand)]
pub enum EnvAction {
    /// Report the system Do-Not-Disturb state
    Dnd {
        #[arg(value_parser = clap::builder::BoolishValueParser::new())]
        active: bool,
    },
    /// Report the foreground application id
    App { app_id: String },
    /// Report the current system idle time (e.g. "45s", "3m")
    Idle { idle: String },
    /// Report that the system is about to suspend (or the screen locked)
    Suspend,
    /// Report that the system resumed (or the screen unlocked)
    Resume,
}

pub fn run(action: EnvAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();
    let mut planner = load_planner(&db, now);

    match action {
        EnvAction::Dnd { active } => planner.observe_dnd(active, now),
        EnvAction::App { app_id } => planner.observe_foreground_app(&app_id, now),
        EnvAction::Idle { idle } => {
            let idle_ms = parse_duration_ms(&idle)?;
            planner.observe_idle(idle_ms, now);
        }
        EnvAction::Suspend => planner.on_suspend(now),
        EnvAction::Resume => planner.on_resume_from_suspend(now),
    }

    publish_events(&db, &mut planner)?;
    println!("{}", Status::capture(&planner, now).message);
    save_planner(&db, &planner)?;
    Ok(())
}
