use clap::Subcommand;
use focusroom_core::stats::sorted_by_date;
use focusroom_core::SortOrder;

use crate::host::Host;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recorded sessions as JSON
    List {
        /// Sort by date: asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,
        /// Show at most this many sessions
        #[arg(long)]
        limit: Option<usize>,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let host = Host::open()?;

    match action {
        HistoryAction::List { order, limit } => {
            let sessions = host.store.load_history()?;
            let mut sorted = sorted_by_date(&sessions, order);
            if let Some(limit) = limit {
                sorted.truncate(limit);
            }
            println!("{}", serde_json::to_string_pretty(&sorted)?);
        }
    }
    Ok(())
}
