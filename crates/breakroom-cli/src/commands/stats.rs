use clap::Subcommand;

use breakroom_core::storage::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Show break totals
    Show,
    /// List the most recent breaks
    Recent {
        #[arg(long, default_value = "10")]
        limit: u32,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        StatsAction::Show => {
            let stats = db.stats_all()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Recent { limit } => {
            let records = db.recent_breaks(limit)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}
