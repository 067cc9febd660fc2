use clap::Subcommand;
use focusroom_core::stats::recent;
use focusroom_core::HistorySummary;

use crate::host::Host;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals and averages over the whole history
    Summary {
        /// Number of most recent sessions to include
        #[arg(long, default_value = "6")]
        recent: usize,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let host = Host::open()?;

    match action {
        StatsAction::Summary { recent: count } => {
            let sessions = host.store.load_history()?;
            let summary = HistorySummary::from_sessions(&sessions);
            let output = serde_json::json!({
                "summary": summary,
                "total_focus_hours": summary.as_ref().map(HistorySummary::total_focus_hours),
                "recent": recent(&sessions, count),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
