//! Countdown Commands

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use countdown_common::{IdentityContext, NewCountdown, RemindAt, Repeat};

use crate::client::{ApiClient, CountdownInfo};
use crate::output::{print_info, print_item, print_list, print_success, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum CountdownCommands {
    /// Create a countdown in the held wallet
    Create(CreateArgs),

    /// Get a countdown by its sharing token
    Get {
        /// Sharing token (e.g. glacier-owl-echo)
        token: String,
    },

    /// List countdowns in a wallet (defaults to the held wallet)
    List {
        wallet_id: Option<String>,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    /// Title
    #[arg(short, long)]
    pub title: String,

    /// Date, YYYY-MM-DD
    #[arg(short, long)]
    pub date: String,

    /// Time, HH:MM (UTC). Omit for an all-day countdown
    #[arg(long)]
    pub time: Option<String>,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Color, #rrggbb
    #[arg(long)]
    pub color: Option<String>,

    /// none, daily, weekly, monthly, yearly
    #[arg(long, default_value = "none")]
    pub repeat: Repeat,

    /// none, at_time, 1_hour_before, 1_day_before, 1_week_before
    #[arg(long, default_value = "none")]
    pub remind_at: RemindAt,

    /// Create a stand-alone countdown outside any wallet
    #[arg(long)]
    pub standalone: bool,
}

impl CreateArgs {
    pub fn to_input(&self) -> NewCountdown {
        NewCountdown {
            title: self.title.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
            date: self.date.clone(),
            time: self.time.clone(),
            all_day: self.time.is_none(),
            repeat: self.repeat,
            remind_at: self.remind_at,
        }
    }
}

impl TableDisplay for CountdownInfo {
    fn headers() -> Vec<&'static str> {
        vec!["Token", "Title", "Next", "Time Left", "Repeat", "Link"]
    }

    fn row(&self) -> Vec<String> {
        let next = if self.all_day {
            self.next_occurrence.format("%Y-%m-%d").to_string()
        } else {
            self.next_occurrence.format("%Y-%m-%d %H:%M UTC").to_string()
        };
        vec![
            self.token.clone(),
            self.title.clone(),
            next,
            self.time_left_display.clone(),
            self.repeat.to_string(),
            self.share_url.clone(),
        ]
    }
}

pub async fn execute(
    cmd: CountdownCommands,
    client: &ApiClient,
    ctx: &IdentityContext,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        CountdownCommands::Create(args) => {
            let identity = if args.standalone {
                None
            } else {
                match ctx.identity() {
                    Some(identity) => Some(identity),
                    None => bail!(
                        "No wallet held; run `countdown wallet create` or pass --standalone"
                    ),
                }
            };
            let countdown = client.create_countdown(identity, &args.to_input()).await?;
            print_success(&format!("Countdown '{}' created", countdown.title));
            print_item(&countdown, format);
        }

        CountdownCommands::Get { token } => {
            let countdown = client.get_countdown(&token).await?;
            print_item(&countdown, format);
        }

        CountdownCommands::List { wallet_id } => {
            let wallet_id = match (wallet_id, ctx.identity()) {
                (Some(id), _) => id,
                (None, Some(identity)) => identity.wallet_id.clone(),
                (None, None) => bail!("No wallet held; pass a wallet ID"),
            };
            show_wallet(client, &wallet_id, format).await?;
        }
    }

    Ok(())
}

/// Print a wallet's countdowns, newest first
pub async fn show_wallet(client: &ApiClient, wallet_id: &str, format: OutputFormat) -> Result<()> {
    let wallet = client.get_wallet(wallet_id).await?;
    if !matches!(format, OutputFormat::Json) {
        print_info(&format!(
            "Wallet {} ({} countdowns)",
            wallet.wallet_id,
            wallet.countdowns.len()
        ));
    }
    print_list(&wallet.countdowns, format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: CreateArgs,
    }

    #[test]
    fn test_all_day_without_time() {
        let cli = TestCli::parse_from(["test", "--title", "Trip", "--date", "2099-07-01"]);
        let input = cli.args.to_input();
        assert!(input.all_day);
        assert_eq!(input.repeat, Repeat::None);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_timed_with_schedule() {
        let cli = TestCli::parse_from([
            "test",
            "-t",
            "Standup",
            "-d",
            "2099-07-01",
            "--time",
            "09:15",
            "--repeat",
            "weekly",
            "--remind-at",
            "1_hour_before",
        ]);
        let input = cli.args.to_input();
        assert!(!input.all_day);
        assert_eq!(input.repeat, Repeat::Weekly);
        assert_eq!(input.remind_at, RemindAt::OneHourBefore);
        let valid = input.validate().unwrap();
        assert_eq!(valid.target_time.to_rfc3339(), "2099-07-01T09:15:00+00:00");
    }

    #[test]
    fn test_unknown_repeat_rejected() {
        assert!(TestCli::try_parse_from([
            "test", "-t", "x", "-d", "2099-01-01", "--repeat", "hourly"
        ])
        .is_err());
    }
}
