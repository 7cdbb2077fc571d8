//! Console command definitions.

use crate::outcome::{Action, Plan};
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch the loader script for your key
    Script,

    /// Reset the hardware id bound to your key
    ResetHwid,

    /// Show details of your key
    Stats,

    /// Issue a key to a user (owner only)
    Whitelist {
        /// User id to whitelist
        user: String,

        /// Fixed plan duration
        #[arg(short, long, value_enum)]
        plan: Option<Plan>,

        /// Custom duration in days, used when no plan is given
        #[arg(short, long)]
        duration: Option<i64>,
    },

    /// Extend a user's license (owner only)
    Extend {
        /// User id whose license to extend
        user: String,

        /// Days to add
        days: i64,
    },

    /// Send the customer panel to a channel (owner only)
    Panel {
        /// Target channel id
        channel: String,
    },

    /// Show payment instructions
    Payment,

    /// Show the total script execution count
    Executions,

    /// Print rotating presence statuses
    Presence {
        /// Number of statuses to print
        #[arg(short, long, default_value_t = 4)]
        ticks: usize,
    },
}

impl Commands {
    /// Dispatcher action for this command, if it is one.
    pub fn action(&self) -> Option<Action> {
        let action = match self {
            Commands::Script => Action::GetScript,
            Commands::ResetHwid => Action::ResetHwid,
            Commands::Stats => Action::GetStats,
            Commands::Whitelist {
                user,
                plan,
                duration,
            } => Action::Whitelist {
                target: user.clone(),
                plan: *plan,
                duration_days: *duration,
            },
            Commands::Extend { user, days } => Action::Extend {
                target: user.clone(),
                days: *days,
            },
            Commands::Panel { channel } => Action::SendPanel {
                channel_id: Some(channel.clone()),
            },
            Commands::Payment => Action::Payment,
            Commands::Executions | Commands::Presence { .. } => return None,
        };
        Some(action)
    }
}
