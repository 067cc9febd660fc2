use clap::Subcommand;
use focusroom_core::TimerSettings;

use crate::host::Host;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the stored settings, writing defaults on first use
    Show,
    /// Set focus and break lengths in minutes
    Set {
        /// Focus length in minutes
        #[arg(long)]
        focus: u64,
        /// Break length in minutes
        #[arg(long = "break")]
        break_min: u64,
    },
    /// Restore the default 25/5 minutes
    Reset,
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let host = Host::open()?;

    let settings = match action {
        SettingsAction::Show => host.store.initialize_settings()?,
        SettingsAction::Set { focus, break_min } => {
            let settings = TimerSettings::from_minutes(focus, break_min)?;
            host.store.save_settings(&settings)?;
            settings
        }
        SettingsAction::Reset => {
            let settings = TimerSettings::default();
            host.store.save_settings(&settings)?;
            settings
        }
    };

    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
