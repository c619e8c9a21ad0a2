use clap::Subcommand;
use tokio::time::MissedTickBehavior;

use breakroom_core::storage::Database;
use breakroom_core::{parse_duration_ms, parse_pause_ms, EventKind, Status};
use chrono::Utc;

use super::{load_planner, publish_events, save_planner};

#[derive(Subcommand)]
pub enum BreaksAction {
    /// Print the current schedule status
    Status {
        /// Print the full snapshot as JSON instead of one line
        #[arg(long)]
        json: bool,
    },
    /// Skip to a microbreak
    Mini {
        /// Delay before the break opens (e.g. "30s", "5m"; bare = minutes)
        #[arg(long)]
        wait: Option<String>,
        /// Do not reschedule; only useful together with --wait
        #[arg(long)]
        noskip: bool,
        /// Text to show on the break surface instead of the usual idea
        #[arg(long)]
        title: Option<String>,
    },
    /// Skip to a long break
    Long {
        #[arg(long)]
        wait: Option<String>,
        #[arg(long)]
        noskip: bool,
        #[arg(long)]
        title: Option<String>,
        /// Smaller line under the title
        #[arg(long)]
        text: Option<String>,
    },
    /// Pause the schedule ("indefinitely" or a duration like "30m")
    Pause {
        #[arg(default_value = "indefinitely")]
        duration: String,
    },
    /// Resume a paused schedule
    Resume,
    /// Pause if running, resume if paused
    Toggle,
    /// Postpone the break currently in progress
    Postpone,
    /// Finish the break currently in progress
    Finish,
    /// Drop the current plan and reschedule from scratch
    Reset,
    /// Re-apply the configuration to the planner
    Reload,
    /// Run in the foreground, ticking the schedule and printing events
    Watch {
        /// Tick interval in seconds
        #[arg(long, default_value = "1")]
        interval: u64,
    },
}

pub fn run(action: BreaksAction) -> Result<(), Box<dyn std::error::Error>> {
    if let BreaksAction::Watch { interval } = action {
        return tokio::runtime::Runtime::new()?.block_on(watch(interval.max(1)));
    }

    let db = Database::open()?;
    let now = Utc::now();
    let mut planner = load_planner(&db, now);

    match action {
        BreaksAction::Status { json } => {
            planner.tick(now);
            publish_events(&db, &mut planner)?;
            let status = Status::capture(&planner, now);
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("{}", status.message);
            }
        }
        BreaksAction::Mini { wait, noskip, title } => {
            let delay = wait.as_deref().map(parse_duration_ms).transpose()?;
            store_pending_content(&db, title, None)?;
            if !noskip || delay.is_some() {
                planner.skip_to_microbreak(delay, now);
            }
            publish_events(&db, &mut planner)?;
            println!("{}", Status::capture(&planner, now).message);
        }
        BreaksAction::Long { wait, noskip, title, text } => {
            let delay = wait.as_deref().map(parse_duration_ms).transpose()?;
            store_pending_content(&db, title, text)?;
            if !noskip || delay.is_some() {
                planner.skip_to_break(delay, now);
            }
            publish_events(&db, &mut planner)?;
            println!("{}", Status::capture(&planner, now).message);
        }
        BreaksAction::Pause { duration } => {
            let pause_ms = parse_pause_ms(&duration)?;
            planner.pause(pause_ms, now);
            publish_events(&db, &mut planner)?;
            println!("{}", Status::capture(&planner, now).message);
        }
        BreaksAction::Resume => {
            planner.resume(true, now);
            publish_events(&db, &mut planner)?;
            println!("{}", Status::capture(&planner, now).message);
        }
        BreaksAction::Toggle => {
            if planner.is_paused() {
                planner.resume(true, now);
            } else {
                planner.pause(1, now);
            }
            publish_events(&db, &mut planner)?;
            println!("{}", Status::capture(&planner, now).message);
        }
        BreaksAction::Postpone => {
            if planner.postpone_current_break(now) {
                println!("{}", Status::capture(&planner, now).message);
            } else {
                eprintln!("cannot postpone: no break running or policy forbids it");
                std::process::exit(1);
            }
        }
        BreaksAction::Finish => {
            match planner.scheduler().reference() {
                Some(EventKind::FinishMicrobreak) => planner.finish_microbreak(false, true, now),
                Some(EventKind::FinishBreak) => planner.finish_break(false, true, now),
                _ => {
                    eprintln!("no break in progress");
                    std::process::exit(1);
                }
            }
            publish_events(&db, &mut planner)?;
            println!("{}", Status::capture(&planner, now).message);
        }
        BreaksAction::Reset => {
            planner.reset(now);
            publish_events(&db, &mut planner)?;
            println!("{}", Status::capture(&planner, now).message);
        }
        BreaksAction::Reload => {
            let config = breakroom_core::Config::load_or_default();
            planner.reinitialize(config.break_settings(), now);
            publish_events(&db, &mut planner)?;
            println!("{}", Status::capture(&planner, now).message);
        }
        BreaksAction::Watch { .. } => unreachable!(),
    }

    save_planner(&db, &planner)?;
    Ok(())
}

/// Stash custom break content for the presentation layer to pick up
/// when the break surface opens.
fn store_pending_content(
    db: &Database,
    title: Option<String>,
    text: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if title.is_none() && text.is_none() {
        return Ok(());
    }
    let content = serde_json::json!({ "title": title, "text": text });
    db.kv_set("pending_break_content", &content.to_string())?;
    Ok(())
}

/// Foreground tick loop. Prints lifecycle events as JSON lines and
/// persists the planner after every change, so other invocations (and
/// a restart) see the current plan.
async fn watch(interval_secs: u64) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut planner = load_planner(&db, Utc::now());
    save_planner(&db, &planner)?;

    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Utc::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                let gap_ms = (now - last_tick).num_milliseconds().max(0) as u64;
                if gap_ms > interval_secs * 3_000 {
                    // The loop stalled (suspend, heavy swap); trust the
                    // wall clock, not the tick count.
                    tracing::info!(gap_ms, "tick gap detected");
                    planner.correct_scheduler(now);
                }
                last_tick = now;
                planner.tick(now);
                let events = planner.drain_events();
                if !events.is_empty() {
                    for event in &events {
                        db.record_break_event(event)?;
                        println!("{}", serde_json::to_string(event)?);
                    }
                    save_planner(&db, &planner)?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                save_planner(&db, &planner)?;
                return Ok(());
            }
        }
    }
}
